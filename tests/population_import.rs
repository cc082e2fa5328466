//! Tests for population file ingestion.

use std::io::Write;

use naadsm_import::models::InitialState;
use naadsm_import::{ImportOptions, Projection, ScenarioStore, read_population};
use tempfile::NamedTempFile;

fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

fn herd(production_type: &str, status: &str) -> String {
    format!(
        "<herd>\
            <production-type>{production_type}</production-type>\
            <size>25</size>\
            <location><latitude>55.0</latitude><longitude>12.0</longitude></location>\
            <status>{status}</status>\
        </herd>"
    )
}

fn population_xml(herds: &str) -> String {
    format!("<herds>{herds}</herds>")
}

/// Test a plain lat-long population file.
#[test]
fn test_basic_population() {
    let xml = population_xml(&format!(
        "{}{}",
        herd("Cattle", "Susceptible"),
        herd("Swine", "Latent")
    ));
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    read_population(file.path(), &mut store, &ImportOptions::default()).unwrap();

    assert_eq!(store.units.len(), 2);
    assert_eq!(store.production_types.len(), 2);
    assert!(store.population.is_some());
    let states: Vec<InitialState> = store
        .units
        .iter()
        .map(|(_, u)| u.initial_state)
        .collect();
    assert_eq!(states, vec![InitialState::Susceptible, InitialState::Latent]);
}

/// Test that status text is accepted as a code, a full name, or a spaceless
/// full name, and that anything else falls back to susceptible.
#[test]
fn test_status_spellings() {
    let xml = population_xml(&format!(
        "{}{}{}{}",
        herd("Cattle", "B"),
        herd("Cattle", "Infectious Subclinical"),
        herd("Cattle", "VaccineImmune"),
        herd("Cattle", "Unmapped")
    ));
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    read_population(file.path(), &mut store, &ImportOptions::default()).unwrap();

    let states: Vec<InitialState> = store
        .units
        .iter()
        .map(|(_, u)| u.initial_state)
        .collect();
    assert_eq!(
        states,
        vec![
            InitialState::InfectiousSubclinical,
            InitialState::InfectiousSubclinical,
            InitialState::VaccineImmune,
            InitialState::Susceptible,
        ]
    );
}

#[test]
fn test_herd_id_becomes_user_notes() {
    let xml = population_xml(
        "<herd>\
            <id>unit-17</id>\
            <production-type>Cattle</production-type>\
            <size>3</size>\
            <location><latitude>1.0</latitude><longitude>2.0</longitude></location>\
            <status>S</status>\
            <days-in-status>4</days-in-status>\
            <days-left-in-status>2</days-left-in-status>\
        </herd>",
    );
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    read_population(file.path(), &mut store, &ImportOptions::default()).unwrap();

    let (_, unit) = store.units.iter().next().unwrap();
    assert_eq!(unit.user_notes, "id=unit-17");
    assert_eq!(unit.days_in_initial_state, Some(4));
    assert_eq!(unit.days_left_in_initial_state, Some(2));
    assert_eq!(unit.initial_size, 3);
}

#[test]
fn test_missing_size_is_an_error() {
    let xml = population_xml(
        "<herd>\
            <production-type>Cattle</production-type>\
            <location><latitude>1.0</latitude><longitude>2.0</longitude></location>\
            <status>S</status>\
        </herd>",
    );
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    let err = read_population(file.path(), &mut store, &ImportOptions::default()).unwrap_err();
    assert!(err.to_string().contains("size"), "got: {err}");
}

#[test]
fn test_duplicate_production_types_are_merged() {
    let xml = population_xml(&format!(
        "{}{}{}",
        herd("Cattle", "S"),
        herd("Cattle", "S"),
        herd("Swine", "S")
    ));
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    read_population(file.path(), &mut store, &ImportOptions::default()).unwrap();
    assert_eq!(store.production_types.len(), 2);
}

struct OffsetProjection;

impl Projection for OffsetProjection {
    fn to_lat_long(&self, x: f64, y: f64) -> (f64, f64) {
        (y / 1000.0, x / 1000.0)
    }
}

/// Test that a projected file routes coordinates through the supplied
/// projection.
#[test]
fn test_projected_coordinates() {
    let xml = "<herds>\
        <spatial_reference><PROJ4>+proj=utm +zone=32</PROJ4></spatial_reference>\
        <herd>\
            <production-type>Cattle</production-type>\
            <size>10</size>\
            <location><x>12000</x><y>55000</y></location>\
            <status>S</status>\
        </herd>\
    </herds>";
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    let options = ImportOptions {
        projection_factory: Some(Box::new(|_: &str| -> naadsm_import::Result<Box<dyn Projection>> {
            Ok(Box::new(OffsetProjection))
        })),
        ..ImportOptions::default()
    };
    read_population(file.path(), &mut store, &options).unwrap();

    let (_, unit) = store.units.iter().next().unwrap();
    assert_eq!(unit.latitude, 55.0);
    assert_eq!(unit.longitude, 12.0);
}

/// Test that a projected file without a projection factory is rejected.
#[test]
fn test_projected_file_without_factory_is_an_error() {
    let xml = "<herds>\
        <spatial_reference><PROJ4>+proj=utm +zone=32</PROJ4></spatial_reference>\
    </herds>";
    let file = write_temp(xml.as_bytes());
    let mut store = ScenarioStore::new();
    let err =
        read_population(file.path(), &mut store, &ImportOptions::default()).unwrap_err();
    assert!(err.to_string().contains("projection"), "got: {err}");
}

/// Test that a UTF-16 encoded file parses.
#[test]
fn test_utf16_population_file() {
    let xml = population_xml(&herd("Cattle", "S"));
    let mut bytes: Vec<u8> = vec![0xFF, 0xFE];
    for unit in xml.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let file = write_temp(&bytes);
    let mut store = ScenarioStore::new();
    read_population(file.path(), &mut store, &ImportOptions::default()).unwrap();
    assert_eq!(store.units.len(), 1);
}
