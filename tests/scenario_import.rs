//! End-to-end tests covering both files of a scenario.

use std::io::Write;

use naadsm_import::{ImportOptions, ScenarioStore, import_scenario, read_parameters};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const POPULATION: &str = "<herds>\
    <herd>\
        <production-type>Cattle</production-type>\
        <size>100</size>\
        <location><latitude>55.0</latitude><longitude>12.0</longitude></location>\
        <status>L</status>\
    </herd>\
    <herd>\
        <production-type>Swine</production-type>\
        <size>500</size>\
        <location><latitude>55.1</latitude><longitude>12.1</longitude></location>\
        <status>S</status>\
    </herd>\
</herds>";

fn chart(name: &str) -> String {
    format!(
        "<relational-function name=\"{name}\">\
            <value><x>0</x><y>1</y></value>\
            <value><x>10</x><y>0</y></value>\
        </relational-function>"
    )
}

fn parameters_xml() -> String {
    format!(
        "<disease-simulation>\
        <description>Test scenario</description>\
        <num-days>100</num-days>\
        <num-runs>5</num-runs>\
        <exit-condition><first-detection/></exit-condition>\
        <models>\
            <disease-model production-type=\"Cattle,Swine\">\
                <latent-period><point>2</point></latent-period>\
                <infectious-subclinical-period><point>1</point></infectious-subclinical-period>\
                <infectious-clinical-period><point>3</point></infectious-clinical-period>\
                <immunity-period><point>30</point></immunity-period>\
            </disease-model>\
            <contact-spread-model from-production-type=\"Cattle\" to-production-type=\"Swine\" contact-type=\"direct\">\
                <movement-rate><value>1.5</value></movement-rate>\
                <distance><point>10</point></distance>\
                <prob-infect>0.4</prob-infect>\
                <latent-units-can-infect>false</latent-units-can-infect>\
                <movement-control>{mc}</movement-control>\
            </contact-spread-model>\
            <airborne-spread-model from-production-type=\"Cattle\" to-production-type=\"Swine\">\
                <max-spread><value>25</value></max-spread>\
                <prob-spread-1km>0.05</prob-spread-1km>\
                <wind-direction-start><value>0</value></wind-direction-start>\
                <wind-direction-end><value>360</value></wind-direction-end>\
            </airborne-spread-model>\
            <zone-model><name>High risk</name><radius><value>3</value></radius></zone-model>\
            <zone-model><name>Background</name><radius><value>0</value></radius></zone-model>\
            <contact-spread-model zone=\"High risk\" from-production-type=\"Cattle\" contact-type=\"direct\">\
                <movement-control>{zc}</movement-control>\
            </contact-spread-model>\
            <detection-model production-type=\"Cattle,Swine\">\
                <prob-report-vs-time-clinical>{obs}</prob-report-vs-time-clinical>\
                <prob-report-vs-time-since-outbreak>{rep}</prob-report-vs-time-since-outbreak>\
            </detection-model>\
            <detection-model production-type=\"Cattle\" zone=\"High risk\">\
                <zone-prob-multiplier>2</zone-prob-multiplier>\
            </detection-model>\
            <vaccine-model production-type=\"Cattle\">\
                <delay><value>7</value></delay>\
                <immunity-period><point>90</point></immunity-period>\
            </vaccine-model>\
            <ring-vaccination-model from-production-type=\"Cattle\" to-production-type=\"Cattle\">\
                <priority>2</priority>\
                <radius><value>5</value></radius>\
                <min-time-between-vaccinations><value>120</value></min-time-between-vaccinations>\
            </ring-vaccination-model>\
            <basic-destruction-model production-type=\"Swine\">\
                <priority>1</priority>\
            </basic-destruction-model>\
            <ring-destruction-model from-production-type=\"Swine\" to-production-type=\"Cattle\">\
                <priority>2</priority>\
                <radius><value>3</value></radius>\
            </ring-destruction-model>\
            <resources-and-implementation-of-controls-model>\
                <destruction-program-delay><value>2</value></destruction-program-delay>\
                <destruction-capacity>{dcap}</destruction-capacity>\
                <destruction-priority-order>reason,time waiting,production type</destruction-priority-order>\
                <vaccination-program-delay>3</vaccination-program-delay>\
                <vaccination-capacity>{vcap}</vaccination-capacity>\
                <vaccination-priority-order>production type,time waiting</vaccination-priority-order>\
            </resources-and-implementation-of-controls-model>\
            <economic-model production-type=\"Cattle\" zone=\"High risk\">\
                <appraisal><value>100</value></appraisal>\
                <surveillance><value>0.5</value></surveillance>\
            </economic-model>\
        </models>\
        <output><state-table-writer/></output>\
    </disease-simulation>",
        mc = chart("Movement control"),
        zc = chart("Zone movement control"),
        obs = chart("Observing"),
        rep = chart("Reporting"),
        dcap = chart("Destruction capacity"),
        vcap = chart("Vaccination capacity"),
    )
}

/// Test a full import of a two-type scenario.
#[test]
fn test_full_scenario_import() {
    let population = write_temp(POPULATION);
    let parameters = write_temp(&parameters_xml());
    let mut store = ScenarioStore::new();
    import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap();

    // Scenario and output settings.
    let scenario = store.scenario.as_ref().unwrap();
    assert_eq!(scenario.description, "Test scenario");
    let output = store.output_settings.as_ref().unwrap();
    assert_eq!(output.iterations, 5);
    assert_eq!(output.days, 100);
    assert_eq!(output.stop_criteria, "first-detection");
    assert!(output.save_daily_unit_states);
    assert!(!output.save_daily_events);
    assert!(output.cost_track_zone_surveillance);
    assert!(!output.cost_track_vaccination);

    // Disease flags.
    let disease = store.disease.as_ref().unwrap();
    assert!(disease.include_direct_contact_spread);
    assert!(!disease.include_indirect_contact_spread);
    assert!(disease.include_airborne_spread);
    assert!(!disease.use_airborne_exponential_decay);

    // Both types share one progression; the merged name lists both.
    assert_eq!(store.progressions.len(), 1);
    assert_eq!(store.progression_assignments.len(), 2);
    let (_, progression) = store.progressions.iter().next().unwrap();
    assert_eq!(progression.name, "Cattle Progression, Swine Progression");

    // Spread records and the pairing.
    assert_eq!(store.direct_spreads.len(), 1);
    let (_, direct) = store.direct_spreads.iter().next().unwrap();
    assert_eq!(direct.name, "Direct Cattle -> Swine");
    assert!(!direct.use_fixed_contact_rate);
    assert_eq!(direct.contact_rate, 1.5);
    assert_eq!(direct.infection_probability, 0.4);
    assert!(!direct.latent_animals_can_infect_others);
    assert!(direct.subclinical_animals_can_infect_others);

    assert_eq!(store.airborne_spreads.len(), 1);
    let (_, airborne) = store.airborne_spreads.iter().next().unwrap();
    assert_eq!(airborne.max_distance, 25.0);
    assert_eq!(airborne.spread_1km_probability, 0.05);

    assert_eq!(store.spread_assignments.len(), 1);
    let (_, pairing) = store.spread_assignments.iter().next().unwrap();
    assert!(pairing.direct_contact_spread.is_some());
    assert!(pairing.indirect_contact_spread.is_none());
    assert!(pairing.airborne_spread.is_some());

    // The zero-radius zone is dropped.
    assert_eq!(store.zones.len(), 1);
    let zone_id = store.zones.iter().next().unwrap().0;
    assert_eq!(store.zones.get(zone_id).name, "High risk");

    // Zone effect on Cattle: movement control, detection multiplier and
    // surveillance cost all land on the same effect.
    assert_eq!(store.zone_effects.len(), 1);
    let (_, effect) = store.zone_effects.iter().next().unwrap();
    assert_eq!(effect.name, "High risk effect on Cattle");
    assert!(effect.zone_direct_movement.is_some());
    assert!(effect.zone_indirect_movement.is_none());
    assert_eq!(effect.zone_detection_multiplier, Some(2.0));
    assert_eq!(effect.cost_of_surveillance_per_animal_day, Some(0.5));

    // One protocol per production type.
    assert_eq!(store.protocols.len(), 2);
    assert_eq!(store.protocol_assignments.len(), 2);
    let protocol_named = |name: &str| {
        store
            .protocols
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(_, p)| p)
            .unwrap()
    };
    let cattle = protocol_named("Cattle Protocol");
    assert!(cattle.use_detection);
    assert!(cattle.detection_probability_for_observed_time_in_clinical.is_some());
    assert_eq!(cattle.days_to_immunity, Some(7));
    assert!(cattle.trigger_vaccination_ring);
    assert_eq!(cattle.vaccination_ring_radius, Some(5.0));
    assert!(cattle.use_vaccination);
    assert_eq!(cattle.minimum_time_between_vaccinations, Some(120));
    assert!(cattle.vaccinate_detected_units);
    assert!(cattle.destruction_is_a_ring_target);
    assert_eq!(cattle.vaccination_priority, Some(1));
    assert_eq!(cattle.destruction_priority, Some(2));

    let swine = protocol_named("Swine Protocol");
    assert!(swine.use_detection);
    assert!(swine.use_destruction);
    assert!(swine.destruction_is_a_ring_trigger);
    assert_eq!(swine.destruction_ring_radius, Some(3.0));
    assert_eq!(swine.destruction_priority, Some(1));
    assert_eq!(swine.vaccination_priority, None);

    // Cost accounting only on Cattle.
    assert!(cattle.use_cost_accounting);
    assert_eq!(cattle.cost_of_destruction_appraisal_per_unit, Some(100.0));
    assert!(!swine.use_cost_accounting);

    // Master plan and the vaccination trigger.
    let plan = store.master_plan.as_ref().unwrap();
    assert_eq!(plan.destruction_program_delay, Some(2));
    assert!(plan.destruction_capacity.is_some());
    assert_eq!(
        plan.destruction_priority_order,
        "reason, time waiting, production type"
    );
    assert_eq!(plan.destruction_reason_order, "Basic, Ring");
    assert_eq!(
        plan.vaccination_priority_order,
        "production type, time waiting"
    );
    let trigger = store.vaccination_trigger.as_ref().unwrap();
    assert_eq!(trigger.number_of_units, 3);
}

fn minimal_parameters(models: &str) -> String {
    format!(
        "<disease-simulation>\
            <description>Minimal</description>\
            <num-days>10</num-days>\
            <num-runs>1</num-runs>\
            <models>{models}</models>\
        </disease-simulation>"
    )
}

/// Test that vaccinating a type with no vaccine effects defined is fatal.
#[test]
fn test_vaccination_without_vaccine_effects_is_fatal() {
    let models = "<ring-vaccination-model from-production-type=\"Cattle\" to-production-type=\"Cattle\">\
        <priority>1</priority>\
        <radius><value>5</value></radius>\
        <min-time-between-vaccinations><value>120</value></min-time-between-vaccinations>\
    </ring-vaccination-model>";
    let file = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    let err = read_parameters(file.path(), &mut store, &ImportOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Cattle"), "got: {err}");
}

/// Test that vaccine effects without any vaccination target only warn.
#[test]
fn test_vaccine_effects_without_targets_is_not_fatal() {
    let models = "<vaccine-model production-type=\"Cattle\">\
        <delay><value>7</value></delay>\
        <immunity-period><point>90</point></immunity-period>\
    </vaccine-model>";
    let file = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    read_parameters(file.path(), &mut store, &ImportOptions::default()).unwrap();
}

/// Test that an undeclared xdf prefix is repaired by patching in the
/// namespace declaration.
#[test]
fn test_xdf_prefix_repair() {
    let xml = "<naadsm:disease-simulation xmlns:naadsm=\"http://example.net/naadsm\">\
        <description>With xdf</description>\
        <num-days>10</num-days>\
        <num-runs>1</num-runs>\
        <models>\
            <disease-model production-type=\"Cattle\">\
                <latent-period><point>2</point></latent-period>\
                <infectious-subclinical-period><point>1</point></infectious-subclinical-period>\
                <infectious-clinical-period><point>3</point></infectious-clinical-period>\
                <immunity-period><point>30</point></immunity-period>\
            </disease-model>\
        </models>\
        <output-variable><xdf:units>days</xdf:units></output-variable>\
    </naadsm:disease-simulation>";
    let file = write_temp(xml);
    let mut store = ScenarioStore::new();
    read_parameters(file.path(), &mut store, &ImportOptions::default()).unwrap();
    assert_eq!(store.scenario.as_ref().unwrap().description, "With xdf");
    assert_eq!(store.progressions.len(), 1);
}

/// Test that a bad population file is reported as a population error.
#[test]
fn test_population_error_is_labelled() {
    let population = write_temp("<herds><herd><size>5</size></herd></herds>");
    let parameters = write_temp(&minimal_parameters(""));
    let mut store = ScenarioStore::new();
    let err = import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("population"), "got: {err}");
}

/// Test that the exponential-decay airborne model stores a zero distance
/// cutoff.
#[test]
fn test_exponential_airborne_has_no_distance_cutoff() {
    let population = write_temp(POPULATION);
    let models = "<airborne-spread-exponential-model from-production-type=\"Cattle\" to-production-type=\"Swine\">\
        <prob-spread-1km>0.02</prob-spread-1km>\
        <wind-direction-start><value>10</value></wind-direction-start>\
        <wind-direction-end><value>200</value></wind-direction-end>\
    </airborne-spread-exponential-model>";
    let parameters = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap();

    let disease = store.disease.as_ref().unwrap();
    assert!(disease.include_airborne_spread);
    assert!(disease.use_airborne_exponential_decay);
    let (_, airborne) = store.airborne_spreads.iter().next().unwrap();
    assert_eq!(airborne.max_distance, 0.0);
    assert_eq!(airborne.spread_1km_probability, 0.02);
}

/// Test the older ring-vaccination form: a bare production-type attribute
/// makes every known type a ring trigger and the named types the targets.
#[test]
fn test_ring_vaccination_production_type_form() {
    let population = write_temp(POPULATION);
    let models = "<vaccine-model>\
        <delay><value>5</value></delay>\
        <immunity-period><point>60</point></immunity-period>\
    </vaccine-model>\
    <ring-vaccination-model production-type=\"Swine\">\
        <priority>1</priority>\
        <radius><value>2</value></radius>\
        <min-time-between-vaccinations><value>30</value></min-time-between-vaccinations>\
    </ring-vaccination-model>";
    let parameters = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap();

    for (_, protocol) in store.protocols.iter() {
        assert!(protocol.trigger_vaccination_ring, "{}", protocol.name);
    }
    let swine = store
        .protocols
        .iter()
        .find(|(_, p)| p.name == "Swine Protocol")
        .map(|(_, p)| p)
        .unwrap();
    assert!(swine.use_vaccination);
    let cattle = store
        .protocols
        .iter()
        .find(|(_, p)| p.name == "Cattle Protocol")
        .map(|(_, p)| p)
        .unwrap();
    assert!(!cattle.use_vaccination);
}

/// Test that a quarantine-only trace-back destruction section enables
/// tracing but marks nothing for destruction.
#[test]
fn test_quarantine_only_trace_back_destruction() {
    let population = write_temp(POPULATION);
    let models = "<trace-back-destruction-model contact-type=\"direct\" production-type=\"Cattle\">\
        <priority>1</priority>\
        <trace-period><value>2</value></trace-period>\
        <trace-success>0.8</trace-success>\
        <quarantine-only>true</quarantine-only>\
    </trace-back-destruction-model>";
    let parameters = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap();

    // Tracing is enabled from every known type, destruction from none.
    assert_eq!(store.protocols.len(), 2);
    for (_, protocol) in store.protocols.iter() {
        assert!(protocol.use_tracing, "{}", protocol.name);
        assert!(protocol.trace_direct_forward, "{}", protocol.name);
        assert_eq!(protocol.direct_trace_success_rate, Some(0.8));
        assert_eq!(protocol.direct_trace_period, Some(2));
        assert!(!protocol.destroy_direct_forward_traces, "{}", protocol.name);
        assert!(!protocol.use_destruction, "{}", protocol.name);
    }
}

/// Test that an omitted production-type attribute covers every known type.
#[test]
fn test_omitted_production_type_covers_all() {
    let population = write_temp(POPULATION);
    let models = "<disease-model>\
        <latent-period><point>2</point></latent-period>\
        <infectious-subclinical-period><point>1</point></infectious-subclinical-period>\
        <infectious-clinical-period><point>3</point></infectious-clinical-period>\
        <immunity-period><point>30</point></immunity-period>\
    </disease-model>";
    let parameters = write_temp(&minimal_parameters(models));
    let mut store = ScenarioStore::new();
    import_scenario(
        population.path(),
        parameters.path(),
        &mut store,
        &ImportOptions::default(),
    )
    .unwrap();
    // Cattle and Swine both get an assignment to the shared progression.
    assert_eq!(store.progression_assignments.len(), 2);
}
