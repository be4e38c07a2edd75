// libs/appointment-cell/src/services/catalog.rs
use std::collections::BTreeMap;

use crate::models::BookingCatalog;

type SpecialtyGroup = (&'static str, Vec<(&'static str, Vec<&'static str>)>);

fn specialty_groups() -> Vec<SpecialtyGroup> {
    vec![
        ("General", vec![
            ("Medicina General", vec!["Dr. Pérez", "Dr. Gómez"]),
            ("Odontología", vec!["Dra. Ramírez"]),
        ]),
        ("Especializada", vec![
            ("Cardiología", vec!["Dr. Corazón"]),
            ("Dermatología", vec!["Dra. Piel"]),
        ]),
    ]
}

const LOCATIONS: &[&str] = &[
    "Consultorio 101",
    "Consultorio 102",
    "Consultorio 201",
    "Consultorio 202",
];

const TIME_SLOTS: &[&str] = &["06:00", "08:00", "10:00", "14:00", "16:00"];

pub fn booking_catalog() -> BookingCatalog {
    let groups: BTreeMap<String, BTreeMap<String, Vec<String>>> = specialty_groups()
        .into_iter()
        .map(|(group, specialties)| {
            let specialties = specialties
                .into_iter()
                .map(|(specialty, providers)| {
                    let providers: Vec<String> = providers.into_iter().map(String::from).collect();
                    (specialty.to_string(), providers)
                })
                .collect::<BTreeMap<String, Vec<String>>>();
            (group.to_string(), specialties)
        })
        .collect();

    BookingCatalog {
        groups,
        locations: LOCATIONS.iter().map(|l| l.to_string()).collect(),
        time_slots: TIME_SLOTS.iter().map(|t| t.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let catalog = booking_catalog();
        assert_eq!(catalog.groups.len(), 2);
        assert_eq!(catalog.groups["Especializada"]["Cardiología"], vec!["Dr. Corazón".to_string()]);
        assert_eq!(catalog.locations.len(), 4);
        assert!(catalog.time_slots.contains(&"10:00".to_string()));
    }
}
