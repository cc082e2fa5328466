//! Population file ingestion: stream herd records into units.

use std::path::Path;

use log::info;

use crate::error::{ParseError, Result};
use crate::models::{InitialState, Population, Unit};
use crate::store::ScenarioStore;
use crate::xml::recovery;

use super::ImportOptions;

/// Units are appended in fixed-size batches purely for throughput; batch
/// boundaries carry no semantics.
const CREATE_AT_A_TIME: usize = 500;

/// Converts projected coordinates back to geographic ones.
///
/// Population files may georeference units in a projected coordinate system,
/// carried as a PROJ4 string. The importer has no geodesy of its own: callers
/// that need projected files supply a factory through [`ImportOptions`].
pub trait Projection {
    /// Inverse-project `(x, y)` to `(latitude, longitude)`.
    fn to_lat_long(&self, x: f64, y: f64) -> (f64, f64);
}

/// Read the population file and bulk-create its units.
pub fn read_population(
    path: &Path,
    store: &mut ScenarioStore,
    options: &ImportOptions,
) -> Result<()> {
    info!("Reading population file: {}", path.display());
    let root = recovery::load_document(path)?;

    // Locations in projected coordinates need an inverse projection.
    let projection = match root.find("spatial_reference/PROJ4") {
        Some(srs) => match &options.projection_factory {
            Some(factory) => Some(factory(&srs.text)?),
            None => return Err(ParseError::MissingProjection),
        },
        None => None,
    };

    store.population = Some(Population {
        source_file: path.display().to_string(),
    });

    let mut batch: Vec<Unit> = Vec::with_capacity(CREATE_AT_A_TIME);
    for herd in root.deep_find_all("herd") {
        let user_notes = match herd.find("id") {
            Some(id) => format!("id={}", id.text),
            None => String::new(),
        };
        let type_name = herd.required_text("production-type")?.to_string();
        let initial_size = herd.required_i32("size")?;
        if initial_size < 1 {
            return Err(ParseError::InvalidNumber {
                text: initial_size.to_string(),
                element: "size".to_string(),
            });
        }

        let (latitude, longitude) = match &projection {
            None => (
                herd.required_f64("location/latitude")?,
                herd.required_f64("location/longitude")?,
            ),
            Some(projection) => {
                let x = herd.required_f64("location/x")?;
                let y = herd.required_f64("location/y")?;
                projection.to_lat_long(x, y)
            }
        };

        // Unmapped status text falls back to the default state.
        let initial_state = InitialState::parse(herd.required_text("status")?)
            .unwrap_or_default();

        batch.push(Unit {
            production_type: store.production_type_id(&type_name),
            latitude,
            longitude,
            initial_state,
            days_in_initial_state: herd.optional_i32("days-in-status")?,
            days_left_in_initial_state: herd.optional_i32("days-left-in-status")?,
            initial_size: initial_size as u32,
            user_notes,
        });
        if batch.len() >= CREATE_AT_A_TIME {
            store.units.bulk_insert(batch.drain(..));
        }
    }
    if !batch.is_empty() {
        store.units.bulk_insert(batch);
    }

    info!(
        "Loaded {} units across {} production types",
        store.units.len(),
        store.production_types.len()
    );
    Ok(())
}
