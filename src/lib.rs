//! A Rust library for importing legacy NAADSM 3.x scenarios, given as a
//! population XML file and a parameters XML file, into a relational scenario
//! database model.

pub mod error;
pub mod import;
pub mod models;
pub mod store;
pub mod xml;

// Re-export the most common types for easier use
// Core types
pub use error::{ImportError, ParseError, Result};
pub use store::{Entity, Id, ScenarioStore, Table};

// Import entry points
pub use import::population::Projection;
pub use import::{ImportOptions, import_scenario, read_parameters};
pub use import::population::read_population;
