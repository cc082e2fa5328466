//! In-memory entity store the importer populates.
//!
//! The store is created by the caller, borrowed mutably for the duration of
//! one import, and handed back as a single unit of work; there is no ambient
//! connection or session state. Each entity kind lives in its own [`Table`],
//! and the get-or-create-with-name-merge primitive every assembler relies on
//! is implemented once, generically, in [`Table::merge_create`].

use std::marker::PhantomData;

use serde::Serialize;

use crate::models::{
    AirborneSpread, ControlMasterPlan, ControlProtocol, DirectSpread, Disease, DiseaseDetection,
    DiseaseProgression, DiseaseProgressionAssignment, DiseaseSpreadAssignment, IndirectSpread,
    OutputSettings, Population, ProbabilityFunction, ProtocolAssignment, RelationalFunction,
    Scenario, Unit, Zone, ZoneEffect, ZoneEffectAssignment,
};

/// Typed handle to a row in a [`Table`]. Handles are only minted by the
/// table that owns the row, so a stored reference cannot dangle.
pub struct Id<E> {
    index: u32,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Id<E> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    /// Position of the row within its table.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would bound on E, which the phantom does not need.
impl<E> Clone for Id<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Id<E> {}

impl<E> PartialEq for Id<E> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<E> Eq for Id<E> {}

impl<E> std::hash::Hash for Id<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<E> std::fmt::Debug for Id<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

impl<E> Serialize for Id<E> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index)
    }
}

/// An entity kind with a natural key: every field except the display name.
/// Entities without a name keep the default no-op name accessors.
pub trait Entity {
    type Key: PartialEq;

    fn key(&self) -> Self::Key;

    fn name(&self) -> Option<&str> {
        None
    }

    fn set_name(&mut self, _name: String) {}
}

/// One entity kind's rows, in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct Table<E> {
    rows: Vec<E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E> Table<E> {
    pub fn insert(&mut self, row: E) -> Id<E> {
        self.rows.push(row);
        Id::new(self.rows.len() - 1)
    }

    pub fn get(&self, id: Id<E>) -> &E {
        &self.rows[id.index()]
    }

    pub fn get_mut(&mut self, id: Id<E>) -> &mut E {
        &mut self.rows[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<E>, &E)> {
        self.rows.iter().enumerate().map(|(i, e)| (Id::new(i), e))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a batch of rows. Batch boundaries have no semantic effect;
    /// callers chunk purely for throughput.
    pub fn bulk_insert(&mut self, rows: impl IntoIterator<Item = E>) {
        self.rows.extend(rows);
    }

    pub fn find(&self, mut predicate: impl FnMut(&E) -> bool) -> Option<Id<E>> {
        self.rows
            .iter()
            .position(|row| predicate(row))
            .map(Id::new)
    }
}

impl<E: Entity> Table<E> {
    /// Get-or-create keyed on the entity's natural key.
    pub fn create_or_get(&mut self, candidate: E) -> (Id<E>, bool) {
        let key = candidate.key();
        match self.find(|row| row.key() == key) {
            Some(id) => (id, false),
            None => (self.insert(candidate), true),
        }
    }

    /// Get-or-create with name merging: a newly created row takes the
    /// suggested name; a pre-existing row with a different name accumulates
    /// it, comma-joined, rather than being overwritten.
    pub fn merge_create(&mut self, suggested_name: Option<&str>, candidate: E) -> (Id<E>, bool) {
        let (id, created) = self.create_or_get(candidate);
        if let Some(suggested) = suggested_name {
            let row = self.get_mut(id);
            if created {
                row.set_name(suggested.to_string());
            } else if let Some(existing) = row.name() {
                if existing != suggested {
                    let merged = format!("{existing}, {suggested}");
                    row.set_name(merged);
                }
            }
        }
        (id, created)
    }
}

/// Every table and singleton of one imported scenario.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioStore {
    pub production_types: Table<crate::models::ProductionType>,
    pub units: Table<Unit>,
    pub pdfs: Table<ProbabilityFunction>,
    pub relational_functions: Table<RelationalFunction>,
    pub progressions: Table<DiseaseProgression>,
    pub progression_assignments: Table<DiseaseProgressionAssignment>,
    pub direct_spreads: Table<DirectSpread>,
    pub indirect_spreads: Table<IndirectSpread>,
    pub airborne_spreads: Table<AirborneSpread>,
    pub spread_assignments: Table<DiseaseSpreadAssignment>,
    pub zones: Table<Zone>,
    pub zone_effects: Table<ZoneEffect>,
    pub zone_effect_assignments: Table<ZoneEffectAssignment>,
    pub protocols: Table<ControlProtocol>,
    pub protocol_assignments: Table<ProtocolAssignment>,
    pub scenario: Option<Scenario>,
    pub output_settings: Option<OutputSettings>,
    pub population: Option<Population>,
    pub disease: Option<Disease>,
    pub master_plan: Option<ControlMasterPlan>,
    pub vaccination_trigger: Option<DiseaseDetection>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a production type name, creating the type on first reference.
    pub fn production_type_id(&mut self, name: &str) -> Id<crate::models::ProductionType> {
        let (id, _) = self
            .production_types
            .create_or_get(crate::models::ProductionType {
                name: name.to_string(),
            });
        id
    }

    /// Look up a zone by its exact name.
    pub fn zone_by_name(&self, name: &str) -> Option<Id<Zone>> {
        self.zones.find(|z| z.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PdfShape, ProbabilityFunction};

    fn gamma(alpha: f64, beta: f64) -> ProbabilityFunction {
        ProbabilityFunction {
            name: String::new(),
            shape: PdfShape::Gamma { alpha, beta },
        }
    }

    #[test]
    fn create_or_get_dedups_on_natural_key() {
        let mut table = Table::default();
        let (a, created_a) = table.create_or_get(gamma(2.0, 3.0));
        let (b, created_b) = table.create_or_get(gamma(2.0, 3.0));
        let (c, created_c) = table.create_or_get(gamma(2.0, 4.0));
        assert!(created_a);
        assert!(!created_b);
        assert!(created_c);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn merge_create_accumulates_names_on_shared_entities() {
        let mut table = Table::default();
        let (id, created) = table.merge_create(Some("Latent period"), gamma(2.0, 3.0));
        assert!(created);
        assert_eq!(table.get(id).name, "Latent period");

        let (same, created) = table.merge_create(Some("Immune period"), gamma(2.0, 3.0));
        assert!(!created);
        assert_eq!(same, id);
        assert_eq!(table.get(id).name, "Latent period, Immune period");

        // Any differing suggestion is appended, even one merged earlier
        let (_, created) = table.merge_create(Some("Latent period"), gamma(2.0, 3.0));
        assert!(!created);
        assert_eq!(table.get(id).name, "Latent period, Immune period, Latent period");
    }

    #[test]
    fn ids_are_scoped_to_their_table() {
        let mut table = Table::default();
        let id = table.insert(gamma(1.0, 1.0));
        assert_eq!(table.get(id).shape, PdfShape::Gamma { alpha: 1.0, beta: 1.0 });
        *table.get_mut(id) = gamma(5.0, 5.0);
        assert_eq!(table.get(id).shape, PdfShape::Gamma { alpha: 5.0, beta: 5.0 });
    }
}
