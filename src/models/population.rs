//! Population-side entities: production types, the population singleton and
//! its units.

use serde::Serialize;

use crate::store::{Entity, Id};

/// A category of unit sharing disease-progression and control parameters,
/// e.g. "Dairy Cows". Created on first reference from either file; the name
/// is the unique key across both files.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionType {
    pub name: String,
}

impl Entity for ProductionType {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// The population singleton owning every unit of the scenario.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Population {
    pub source_file: String,
}

/// Disease state of a unit at the start of the simulation.
///
/// Legacy files carry either the one-letter code or the full state name
/// (with or without spaces); anything unrecognized falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InitialState {
    #[default]
    Susceptible,
    Latent,
    InfectiousSubclinical,
    InfectiousClinical,
    NaturallyImmune,
    VaccineImmune,
    Destroyed,
}

impl InitialState {
    /// One-letter storage code, matching the legacy scheme.
    pub fn code(self) -> char {
        match self {
            Self::Susceptible => 'S',
            Self::Latent => 'L',
            Self::InfectiousSubclinical => 'B',
            Self::InfectiousClinical => 'C',
            Self::NaturallyImmune => 'N',
            Self::VaccineImmune => 'V',
            Self::Destroyed => 'D',
        }
    }

    /// Parse a status string in any of its legacy spellings.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "S" | "Susceptible" => Some(Self::Susceptible),
            "L" | "Latent" => Some(Self::Latent),
            "B" | "Infectious Subclinical" | "InfectiousSubclinical" => {
                Some(Self::InfectiousSubclinical)
            }
            "C" | "Infectious Clinical" | "InfectiousClinical" => Some(Self::InfectiousClinical),
            "N" | "Naturally Immune" | "NaturallyImmune" => Some(Self::NaturallyImmune),
            "V" | "Vaccine Immune" | "VaccineImmune" => Some(Self::VaccineImmune),
            "D" | "Destroyed" => Some(Self::Destroyed),
            _ => None,
        }
    }
}

/// One herd/unit record from the population file.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub production_type: Id<ProductionType>,
    pub latitude: f64,
    pub longitude: f64,
    pub initial_state: InitialState,
    pub days_in_initial_state: Option<i32>,
    pub days_left_in_initial_state: Option<i32>,
    pub initial_size: u32,
    pub user_notes: String,
}
