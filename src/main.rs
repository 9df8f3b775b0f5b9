//! Loads stored compositions into a headless scene and reports what spawned.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tessera::persistence::MapStore;
use tessera::{init_logging, Editor, EditorSettings};

/// Scene composition loader
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Directory of stored compositions, overriding the settings file
    #[arg(long)]
    maps_dir: Option<PathBuf>,

    /// Compositions to load; defaults to the configured autoload list
    #[arg(short, long = "map")]
    maps: Vec<String>,
}

fn read_settings(args: &Args) -> Result<EditorSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            EditorSettings::from_json(&json)
                .with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => EditorSettings::default(),
    };
    if let Some(dir) = &args.maps_dir {
        settings.maps_dir.clone_from(dir);
    }
    Ok(settings)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = read_settings(&args)?;
    let store = MapStore::new(&settings.maps_dir);
    let names = if !args.maps.is_empty() {
        args.maps.clone()
    } else if !settings.autoload.is_empty() {
        settings.autoload.clone()
    } else {
        store.list().context("listing stored compositions")?
    };
    if names.is_empty() {
        warn!("no compositions found in {}", store.dir().display());
    }

    let mut editor = Editor::with_settings(settings.headless_scene(), &settings);
    for name in &names {
        let composition = store
            .load(name)
            .with_context(|| format!("loading composition {name}"))?;
        let report = editor.load(composition);
        info!(
            "{name}: {} handles, {} native doors",
            report.spawned, report.doors_configured
        );
    }
    let indicators = editor.refresh_indicators();

    for composition in editor.maps() {
        for (kind, count) in composition.kind_counts() {
            if count > 0 {
                info!("{}: {count} {kind}", composition.name());
            }
        }
    }
    let stats = editor.backend().stats();
    info!(
        "{} live instances ({indicators} indicators) across {} compositions; {} spawn calls",
        editor.backend().instance_count(),
        names.len(),
        stats.spawned
    );
    Ok(())
}
