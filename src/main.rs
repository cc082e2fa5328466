use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use log::info;
use naadsm_import::{ImportOptions, ScenarioStore, import_scenario};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let population = args.next().map(PathBuf::from);
    let parameters = args.next().map(PathBuf::from);
    let (Some(population), Some(parameters)) = (population, parameters) else {
        anyhow::bail!("usage: naadsm-import <population.xml> <parameters.xml> [--dump-json <out.json>]");
    };
    let mut dump_json = None;
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--dump-json" => {
                dump_json = Some(PathBuf::from(
                    args.next()
                        .context("--dump-json requires an output path")?,
                ));
            }
            other => anyhow::bail!("unrecognized argument: {other}"),
        }
    }

    let start = Instant::now();
    let mut store = ScenarioStore::new();
    import_scenario(
        &population,
        &parameters,
        &mut store,
        &ImportOptions::default(),
    )
    .context("scenario import failed")?;

    info!(
        "Imported {} units, {} production types, {} functions in {:?}",
        store.units.len(),
        store.production_types.len(),
        store.pdfs.len() + store.relational_functions.len(),
        start.elapsed()
    );

    if let Some(path) = dump_json {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &store)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote scenario dump to {}", path.display());
    }

    Ok(())
}
