//! Domain models for an imported scenario.
//!
//! These are plain owned structs; cross-references are typed [`Id`] handles
//! into the [`ScenarioStore`] tables, so a reference can only point at an
//! entity created earlier in the same import.
//!
//! [`Id`]: crate::store::Id
//! [`ScenarioStore`]: crate::store::ScenarioStore

pub mod control;
pub mod disease;
pub mod functions;
pub mod population;

pub use control::{
    ControlMasterPlan, ControlProtocol, DiseaseDetection, OutputSettings, ProtocolAssignment,
    Scenario,
};
pub use disease::{
    AirborneSpread, DirectSpread, Disease, DiseaseProgression, DiseaseProgressionAssignment,
    DiseaseSpreadAssignment, IndirectSpread, Zone, ZoneEffect, ZoneEffectAssignment,
};
pub use functions::{PdfShape, Point, ProbabilityFunction, RelationalFunction};
pub use population::{InitialState, Population, ProductionType, Unit};
