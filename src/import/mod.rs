//! Top-level import orchestration over the two legacy files.
//!
//! Data flows one way: raw XML, through normalized intermediate records,
//! into the relational entity graph in the [`ScenarioStore`]. Population
//! ingestion runs first, then parameter ingestion; failures wrap into a
//! file-specific [`ImportError`] and are never retried against the other
//! file.

pub mod control;
pub mod functions;
pub mod population;
pub mod priority;
pub mod spread;

use std::collections::BTreeSet;
use std::path::Path;

use log::info;

use crate::error::{ImportError, ParseError, Result};
use crate::models::{
    ControlMasterPlan, ControlProtocol, Disease, OutputSettings, ProductionType, ProtocolAssignment,
    Scenario, Zone, ZoneEffect, ZoneEffectAssignment,
};
use crate::store::{Id, ScenarioStore};
use crate::xml::{Element, recovery};

use functions::NameSequence;
use population::{Projection, read_population};
use priority::PriorityOrder;

/// Factory turning an embedded PROJ4 string into a projection.
pub type ProjectionFactory = Box<dyn Fn(&str) -> Result<Box<dyn Projection>>>;

/// Caller-supplied knobs for one import run.
pub struct ImportOptions {
    /// Needed only when the population file georeferences units in projected
    /// coordinates.
    pub projection_factory: Option<ProjectionFactory>,
    /// Forwarded into the scenario's output settings.
    pub save_iteration_outputs_for_units: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            projection_factory: None,
            save_iteration_outputs_for_units: true,
        }
    }
}

/// Import a legacy scenario: population file, then parameters file.
///
/// The store is the unit of work; on error it may be partially populated and
/// should be discarded by the caller.
pub fn import_scenario(
    population_path: &Path,
    parameters_path: &Path,
    store: &mut ScenarioStore,
    options: &ImportOptions,
) -> Result<(), ImportError> {
    read_population(population_path, store, options)
        .map_err(|source| ImportError::Population { source })?;
    read_parameters(parameters_path, store, options)
        .map_err(|source| ImportError::Parameters { source })?;
    Ok(())
}

/// Production type names covered by an element's attribute.
///
/// The attribute text is a single name or a comma-separated list; an absent
/// or empty attribute means every known type. Names are not validated here,
/// they may be created just-in-time downstream.
pub fn production_types(element: &Element, attribute: &str, all: &BTreeSet<String>) -> Vec<String> {
    match element.attr(attribute) {
        None | Some("") => all.iter().cloned().collect(),
        Some(text) => text.split(',').map(str::to_string).collect(),
    }
}

/// `contact-type` attribute: absent means both routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContactType {
    Direct,
    Indirect,
    Both,
}

impl ContactType {
    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        match element.attr("contact-type") {
            None => Ok(Self::Both),
            Some("direct") => Ok(Self::Direct),
            Some("indirect") => Ok(Self::Indirect),
            Some(other) => Err(ParseError::InvalidAttribute {
                attribute: "contact-type",
                value: other.to_string(),
                element: element.tag.clone(),
            }),
        }
    }

    /// Variant for sections where `both` is not a legal value.
    pub(crate) fn required(element: &Element) -> Result<Self> {
        match Self::from_element(element)? {
            Self::Both => Err(ParseError::InvalidAttribute {
                attribute: "contact-type",
                value: element.attr("contact-type").unwrap_or("").to_string(),
                element: element.tag.clone(),
            }),
            kind => Ok(kind),
        }
    }

    pub(crate) fn includes_direct(self) -> bool {
        matches!(self, Self::Direct | Self::Both)
    }

    pub(crate) fn includes_indirect(self) -> bool {
        matches!(self, Self::Indirect | Self::Both)
    }
}

/// `direction` attribute: absent means both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        match element.attr("direction") {
            None => Ok(Self::Both),
            Some("in") => Ok(Self::In),
            Some("out") => Ok(Self::Out),
            Some(other) => Err(ParseError::InvalidAttribute {
                attribute: "direction",
                value: other.to_string(),
                element: element.tag.clone(),
            }),
        }
    }

    pub(crate) fn incoming(self) -> bool {
        matches!(self, Self::In | Self::Both)
    }

    pub(crate) fn outgoing(self) -> bool {
        matches!(self, Self::Out | Self::Both)
    }
}

/// Read the parameters file into the store.
pub fn read_parameters(
    path: &Path,
    store: &mut ScenarioStore,
    options: &ImportOptions,
) -> Result<()> {
    info!("Reading parameters file: {}", path.display());
    let root = recovery::load_document(path)?;
    info!("Done reading parameters file, constructing scenario");

    store.scenario = Some(Scenario {
        description: root.required_text("description")?.to_string(),
    });
    store.output_settings = Some(read_output_settings(&root, options)?);

    // Register every production type named anywhere in the parameters file,
    // on top of the ones the population file created.
    let mut type_names: BTreeSet<String> = store
        .production_types
        .iter()
        .map(|(_, pt)| pt.name.clone())
        .collect();
    for el in root.descendants() {
        for attribute in ["production-type", "from-production-type", "to-production-type"] {
            if let Some(text) = el.attr(attribute) {
                type_names.extend(text.split(',').map(str::to_string));
            }
        }
    }
    // An empty production-type attribute anywhere is ignored.
    type_names.remove("");
    for name in &type_names {
        store.production_type_id(name);
    }

    let use_airborne_exponential_decay = root.has_deep("airborne-spread-exponential-model");
    store.disease = Some(Disease {
        name: String::new(),
        include_airborne_spread: root.has_deep("airborne-spread-model")
            || use_airborne_exponential_decay,
        use_airborne_exponential_decay,
        ..Disease::default()
    });

    let mut reader = ParameterReader {
        store: &mut *store,
        type_names,
        pdf_names: NameSequence::new("PDF"),
        rel_names: NameSequence::new("Rel"),
        use_airborne_exponential_decay,
        use_vaccination: root.has_deep("vaccine-model") || root.has_deep("ring-vaccination-model"),
        use_destruction: root.has_deep("basic-destruction-model")
            || root.has_deep("trace-destruction-model")
            || root.has_deep("trace-back-destruction-model")
            || root.has_deep("ring-destruction-model"),
        vaccine_effects_defined: BTreeSet::new(),
        vaccinated: BTreeSet::new(),
        destruction_reason_order: PriorityOrder::default(),
        destruction_type_order: PriorityOrder::default(),
        vaccination_type_order: PriorityOrder::default(),
    };

    reader.read_disease_models(&root)?;
    reader.read_airborne_models(&root)?;
    reader.read_zone_models(&root)?;
    reader.read_contact_models(&root)?;
    reader.read_zone_contact_models(&root)?;

    let use_detection = root.has_deep("detection-model");
    let use_tracing = root.has_deep("trace-model") || root.has_deep("trace-back-destruction-model");
    if use_detection || use_tracing || reader.use_vaccination || reader.use_destruction {
        reader.store.master_plan = Some(ControlMasterPlan::default());
    }

    reader.read_detection_models(&root)?;
    reader.read_contact_recorder_models(&root)?;
    reader.read_trace_models(&root)?;
    reader.read_trace_exam_models(&root)?;
    reader.read_test_models(&root)?;
    reader.read_basic_zone_focus_models(&root)?;
    reader.read_trace_zone_focus_models(&root)?;
    reader.read_vaccine_models(&root)?;
    reader.read_ring_vaccination_models(&root)?;
    reader.check_vaccination_coverage()?;
    reader.read_trace_back_destruction_models(&root)?;
    reader.read_basic_destruction_models(&root)?;
    reader.read_trace_destruction_models(&root)?;
    reader.read_ring_destruction_models(&root)?;
    reader.read_resources_models(&root)?;
    reader.read_economic_models(&root)?;

    info!(
        "Scenario constructed: {} production types, {} spread assignments, {} protocols",
        store.production_types.len(),
        store.spread_assignments.len(),
        store.protocols.len()
    );
    Ok(())
}

fn read_output_settings(root: &Element, options: &ImportOptions) -> Result<OutputSettings> {
    let stop_criteria = if root.find("exit-condition/first-detection").is_some() {
        "first-detection"
    } else if root.find("exit-condition/disease-end").is_some() {
        "disease-end"
    } else {
        ""
    };
    Ok(OutputSettings {
        iterations: root.required_i32("num-runs")?,
        days: root.required_i32("num-days")?,
        stop_criteria: stop_criteria.to_string(),
        save_daily_unit_states: root.has_deep("state-table-writer"),
        save_daily_events: root.has_deep("apparent-events-table-writer"),
        save_daily_exposures: root.has_deep("exposures-table-writer"),
        save_iteration_outputs_for_units: options.save_iteration_outputs_for_units,
        save_map_output: root.has_deep("weekly-gis-writer") || root.has_deep("summary-gis-writer"),
        cost_track_zone_surveillance: root
            .deep_find_all("economic-model")
            .any(|el| el.child("surveillance").is_some()),
        cost_track_vaccination: root
            .deep_find_all("economic-model")
            .any(|el| el.child("vaccination").is_some()),
        cost_track_destruction: root
            .deep_find_all("economic-model")
            .any(|el| el.child("euthanasia").is_some()),
    })
}

/// Shared state for one pass over the parameters document.
pub(crate) struct ParameterReader<'a> {
    pub(crate) store: &'a mut ScenarioStore,
    pub(crate) type_names: BTreeSet<String>,
    pub(crate) pdf_names: NameSequence,
    pub(crate) rel_names: NameSequence,
    pub(crate) use_airborne_exponential_decay: bool,
    pub(crate) use_vaccination: bool,
    pub(crate) use_destruction: bool,
    pub(crate) vaccine_effects_defined: BTreeSet<String>,
    pub(crate) vaccinated: BTreeSet<String>,
    pub(crate) destruction_reason_order: PriorityOrder,
    pub(crate) destruction_type_order: PriorityOrder,
    pub(crate) vaccination_type_order: PriorityOrder,
}

impl ParameterReader<'_> {
    /// Covered production types for an element, defaulting to all known.
    pub(crate) fn covered(&self, element: &Element, attribute: &str) -> Vec<String> {
        production_types(element, attribute, &self.type_names)
    }

    /// The single control protocol for a production type, lazily created on
    /// first reference from any control section.
    pub(crate) fn protocol_for(&mut self, type_name: &str) -> Id<ControlProtocol> {
        let production_type = self.store.production_type_id(type_name);
        if let Some(assignment) = self
            .store
            .protocol_assignments
            .find(|a| a.production_type == production_type)
        {
            return self.store.protocol_assignments.get(assignment).control_protocol;
        }
        let protocol = self.store.protocols.insert(ControlProtocol {
            name: format!("{type_name} Protocol"),
            ..ControlProtocol::default()
        });
        self.store.protocol_assignments.insert(ProtocolAssignment {
            production_type,
            control_protocol: protocol,
        });
        protocol
    }

    /// The zone effect for a (zone, production type) pair, lazily creating
    /// the assignment and effect on first reference.
    pub(crate) fn zone_effect_for(
        &mut self,
        zone: Id<Zone>,
        production_type: Id<ProductionType>,
    ) -> Id<ZoneEffect> {
        let (assignment, _) = self.store.zone_effect_assignments.create_or_get(
            ZoneEffectAssignment {
                zone,
                production_type,
                effect: None,
            },
        );
        if let Some(effect) = self.store.zone_effect_assignments.get(assignment).effect {
            return effect;
        }
        let name = format!(
            "{} effect on {}",
            self.store.zones.get(zone).name,
            self.store.production_types.get(production_type).name
        );
        let effect = self.store.zone_effects.insert(ZoneEffect::named(name));
        self.store.zone_effect_assignments.get_mut(assignment).effect = Some(effect);
        effect
    }

    /// Resolve a zone referenced by name from a section attribute.
    pub(crate) fn zone_named(&self, name: &str) -> Result<Id<Zone>> {
        self.store
            .zone_by_name(name)
            .ok_or_else(|| ParseError::UnknownZone(name.to_string()))
    }
}
