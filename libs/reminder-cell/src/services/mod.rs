pub mod notifier;
pub mod sweep;
