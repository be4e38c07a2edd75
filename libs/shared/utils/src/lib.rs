pub mod extractor;
pub mod jwt;
pub mod session;
pub mod state;
pub mod test_utils;
