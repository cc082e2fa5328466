//! Control-side entities: per-type protocols, the master plan, the
//! vaccination trigger and the scenario/output-settings singletons.

use serde::Serialize;

use crate::store::{Entity, Id};

use super::functions::{ProbabilityFunction, RelationalFunction};
use super::population::ProductionType;

/// The bundle of detection/tracing/destruction/vaccination/testing/cost
/// rules applied to one production type.
///
/// One protocol exists per production type, lazily created on first
/// reference from any control section; each section sets only the fields it
/// owns and never resets the others.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlProtocol {
    pub name: String,

    // Detection
    pub use_detection: bool,
    pub detection_probability_for_observed_time_in_clinical: Option<Id<RelationalFunction>>,
    pub detection_probability_report_vs_first_detection: Option<Id<RelationalFunction>>,

    // Tracing
    pub use_tracing: bool,
    pub trace_direct_forward: bool,
    pub trace_direct_back: bool,
    pub trace_indirect_forward: bool,
    pub trace_indirect_back: bool,
    pub direct_trace_success_rate: Option<f64>,
    pub indirect_trace_success: Option<f64>,
    pub direct_trace_period: Option<i32>,
    pub indirect_trace_period: Option<i32>,
    pub trace_result_delay: Option<Id<ProbabilityFunction>>,

    // Trace exams
    pub use_exams: bool,
    pub examine_direct_forward_traces: bool,
    pub exam_direct_forward_success_multiplier: Option<f64>,
    pub test_direct_forward_traces: bool,
    pub examine_direct_back_traces: bool,
    pub exam_direct_back_success_multiplier: Option<f64>,
    pub test_direct_back_traces: bool,
    pub examine_indirect_forward_traces: bool,
    pub exam_indirect_forward_success_multiplier: Option<f64>,
    pub test_indirect_forward_traces: bool,
    pub examine_indirect_back_traces: bool,
    pub exam_indirect_back_success_multiplier: Option<f64>,
    pub test_indirect_back_traces: bool,

    // Diagnostic testing
    pub use_testing: bool,
    pub test_sensitivity: Option<f64>,
    pub test_specificity: Option<f64>,
    pub test_delay: Option<Id<ProbabilityFunction>>,

    // Zone triggers
    pub detection_is_a_zone_trigger: bool,
    pub direct_trace_is_a_zone_trigger: bool,
    pub indirect_trace_is_a_zone_trigger: bool,

    // Vaccination
    pub use_vaccination: bool,
    pub days_to_immunity: Option<i32>,
    pub vaccine_immune_period: Option<Id<ProbabilityFunction>>,
    pub trigger_vaccination_ring: bool,
    pub vaccination_ring_radius: Option<f64>,
    pub minimum_time_between_vaccinations: Option<i32>,
    pub vaccinate_detected_units: bool,
    pub vaccination_priority: Option<i32>,

    // Destruction
    pub use_destruction: bool,
    pub destruction_is_a_ring_trigger: bool,
    pub destruction_ring_radius: Option<f64>,
    pub destruction_is_a_ring_target: bool,
    pub destroy_direct_forward_traces: bool,
    pub destroy_direct_back_traces: bool,
    pub destroy_indirect_forward_traces: bool,
    pub destroy_indirect_back_traces: bool,
    pub destruction_priority: Option<i32>,

    // Cost accounting
    pub use_cost_accounting: bool,
    pub cost_of_vaccination_setup_per_unit: Option<f64>,
    pub cost_of_vaccination_baseline_per_animal: Option<f64>,
    pub cost_of_vaccination_additional_per_animal: Option<f64>,
    pub vaccination_demand_threshold: Option<i32>,
    pub cost_of_destruction_appraisal_per_unit: Option<f64>,
    pub cost_of_euthanasia_per_animal: Option<f64>,
    pub cost_of_indemnification_per_animal: Option<f64>,
    pub cost_of_carcass_disposal_per_animal: Option<f64>,
    pub cost_of_destruction_cleaning_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolAssignment {
    pub production_type: Id<ProductionType>,
    pub control_protocol: Id<ControlProtocol>,
}

impl Entity for ProtocolAssignment {
    type Key = Id<ProductionType>;

    fn key(&self) -> Self::Key {
        self.production_type
    }
}

/// Scenario-wide control resources: capacity curves and the canonical
/// priority-order strings. Created only when some control measure is in use.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlMasterPlan {
    pub destruction_program_delay: Option<i32>,
    pub destruction_capacity: Option<Id<RelationalFunction>>,
    pub destruction_priority_order: String,
    pub destruction_reason_order: String,
    pub vaccination_capacity: Option<Id<RelationalFunction>>,
    pub vaccination_priority_order: String,
}

/// Detection-count trigger that starts the vaccination program.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseDetection {
    pub number_of_units: i32,
}

/// Scenario description carried over from the parameters file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scenario {
    pub description: String,
}

/// Run-length and output flags recovered from the parameters file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputSettings {
    pub iterations: i32,
    pub days: i32,
    /// Early-exit condition: empty, `first-detection` or `disease-end`.
    pub stop_criteria: String,
    pub save_daily_unit_states: bool,
    pub save_daily_events: bool,
    pub save_daily_exposures: bool,
    pub save_iteration_outputs_for_units: bool,
    pub save_map_output: bool,
    pub cost_track_zone_surveillance: bool,
    pub cost_track_vaccination: bool,
    pub cost_track_destruction: bool,
}
