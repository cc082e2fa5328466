//! Disease dynamics: progressions, the three spread-model kinds, their
//! pairwise assignments, and zones with their per-type effects.

use serde::Serialize;

use crate::store::{Entity, Id};

use super::functions::{ProbabilityFunction, RelationalFunction};
use super::population::ProductionType;

/// The scenario's single disease. The capability flags are derived, not
/// declared: each is set true the first time a corresponding XML section is
/// observed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Disease {
    pub name: String,
    pub include_direct_contact_spread: bool,
    pub include_indirect_contact_spread: bool,
    pub include_airborne_spread: bool,
    pub use_airborne_exponential_decay: bool,
    pub use_within_unit_prevalence: bool,
}

/// Disease progression periods for one covered set of production types.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseProgression {
    pub name: String,
    pub disease_latent_period: Id<ProbabilityFunction>,
    pub disease_subclinical_period: Id<ProbabilityFunction>,
    pub disease_clinical_period: Id<ProbabilityFunction>,
    pub disease_immune_period: Id<ProbabilityFunction>,
    pub disease_prevalence: Option<Id<RelationalFunction>>,
}

impl Entity for DiseaseProgression {
    type Key = (
        Id<ProbabilityFunction>,
        Id<ProbabilityFunction>,
        Id<ProbabilityFunction>,
        Id<ProbabilityFunction>,
        Option<Id<RelationalFunction>>,
    );

    fn key(&self) -> Self::Key {
        (
            self.disease_latent_period,
            self.disease_subclinical_period,
            self.disease_clinical_period,
            self.disease_immune_period,
            self.disease_prevalence,
        )
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiseaseProgressionAssignment {
    pub production_type: Id<ProductionType>,
    pub progression: Id<DiseaseProgression>,
}

impl Entity for DiseaseProgressionAssignment {
    type Key = (Id<ProductionType>, Id<DiseaseProgression>);

    fn key(&self) -> Self::Key {
        (self.production_type, self.progression)
    }
}

/// Direct-contact spread between a pair of production types.
#[derive(Debug, Clone, Serialize)]
pub struct DirectSpread {
    pub name: String,
    pub use_fixed_contact_rate: bool,
    pub contact_rate: f64,
    pub movement_control: Id<RelationalFunction>,
    pub distance_distribution: Id<ProbabilityFunction>,
    pub transport_delay: Option<Id<ProbabilityFunction>>,
    pub infection_probability: f64,
    pub latent_animals_can_infect_others: bool,
    pub subclinical_animals_can_infect_others: bool,
}

impl Entity for DirectSpread {
    #[allow(clippy::type_complexity)]
    type Key = (
        bool,
        f64,
        Id<RelationalFunction>,
        Id<ProbabilityFunction>,
        Option<Id<ProbabilityFunction>>,
        f64,
        bool,
        bool,
    );

    fn key(&self) -> Self::Key {
        (
            self.use_fixed_contact_rate,
            self.contact_rate,
            self.movement_control,
            self.distance_distribution,
            self.transport_delay,
            self.infection_probability,
            self.latent_animals_can_infect_others,
            self.subclinical_animals_can_infect_others,
        )
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Indirect-contact spread; latent units never infect on this route, so the
/// latent flag of the direct model has no counterpart here.
#[derive(Debug, Clone, Serialize)]
pub struct IndirectSpread {
    pub name: String,
    pub use_fixed_contact_rate: bool,
    pub contact_rate: f64,
    pub movement_control: Id<RelationalFunction>,
    pub distance_distribution: Id<ProbabilityFunction>,
    pub transport_delay: Option<Id<ProbabilityFunction>>,
    pub infection_probability: f64,
    pub subclinical_animals_can_infect_others: bool,
}

impl Entity for IndirectSpread {
    #[allow(clippy::type_complexity)]
    type Key = (
        bool,
        f64,
        Id<RelationalFunction>,
        Id<ProbabilityFunction>,
        Option<Id<ProbabilityFunction>>,
        f64,
        bool,
    );

    fn key(&self) -> Self::Key {
        (
            self.use_fixed_contact_rate,
            self.contact_rate,
            self.movement_control,
            self.distance_distribution,
            self.transport_delay,
            self.infection_probability,
            self.subclinical_animals_can_infect_others,
        )
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Airborne spread parameters for a pair of production types.
#[derive(Debug, Clone, Serialize)]
pub struct AirborneSpread {
    pub name: String,
    pub max_distance: f64,
    pub spread_1km_probability: f64,
    pub exposure_direction_start: f64,
    pub exposure_direction_end: f64,
    pub transport_delay: Option<Id<ProbabilityFunction>>,
}

impl Entity for AirborneSpread {
    type Key = (f64, f64, f64, f64, Option<Id<ProbabilityFunction>>);

    fn key(&self) -> Self::Key {
        (
            self.max_distance,
            self.spread_1km_probability,
            self.exposure_direction_start,
            self.exposure_direction_end,
            self.transport_delay,
        )
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// The per-pair assignment slot holder. Unique per (source, destination);
/// the three spread slots are filled independently as the three section
/// kinds are visited.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseSpreadAssignment {
    pub source_production_type: Id<ProductionType>,
    pub destination_production_type: Id<ProductionType>,
    pub direct_contact_spread: Option<Id<DirectSpread>>,
    pub indirect_contact_spread: Option<Id<IndirectSpread>>,
    pub airborne_spread: Option<Id<AirborneSpread>>,
}

impl DiseaseSpreadAssignment {
    pub fn new(source: Id<ProductionType>, destination: Id<ProductionType>) -> Self {
        Self {
            source_production_type: source,
            destination_production_type: destination,
            direct_contact_spread: None,
            indirect_contact_spread: None,
            airborne_spread: None,
        }
    }
}

impl Entity for DiseaseSpreadAssignment {
    type Key = (Id<ProductionType>, Id<ProductionType>);

    fn key(&self) -> Self::Key {
        (self.source_production_type, self.destination_production_type)
    }
}

/// A radius-bounded control area. Only created for radii greater than zero.
#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub name: String,
    pub radius: f64,
}

impl Entity for Zone {
    type Key = f64;

    // Keyed on radius alone, as the legacy importer did; two zones sharing a
    // radius merge their names, and a later lookup of either name fails
    // loudly.
    fn key(&self) -> f64 {
        self.radius
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Per-(zone, production type) modifiers, lazily created and progressively
/// filled by independent passes over different XML element types.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneEffect {
    pub name: String,
    pub zone_direct_movement: Option<Id<RelationalFunction>>,
    pub zone_indirect_movement: Option<Id<RelationalFunction>>,
    pub zone_detection_multiplier: Option<f64>,
    pub cost_of_surveillance_per_animal_day: Option<f64>,
}

impl ZoneEffect {
    pub fn named(name: String) -> Self {
        Self {
            name,
            zone_direct_movement: None,
            zone_indirect_movement: None,
            zone_detection_multiplier: None,
            cost_of_surveillance_per_animal_day: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneEffectAssignment {
    pub zone: Id<Zone>,
    pub production_type: Id<ProductionType>,
    pub effect: Option<Id<ZoneEffect>>,
}

impl Entity for ZoneEffectAssignment {
    type Key = (Id<Zone>, Id<ProductionType>);

    fn key(&self) -> Self::Key {
        (self.zone, self.production_type)
    }
}
