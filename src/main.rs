use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use dataset_dedup::detect::DuplicateDetector;
use dataset_dedup::error::DetectError;
use dataset_dedup::memory::MemoryCatalog;
use dataset_dedup::models::{CatalogEntry, DetectionStats, DuplicateGroup};
use dataset_dedup::progress::{format_elapsed, set_log_only, PhaseProgress};
use dataset_dedup::safety::validate_catalog_output;
use dataset_dedup::sqlite::SqliteCatalog;
use dataset_dedup::DetectorConfig;

#[derive(Parser)]
#[command(name = "dataset-dedup")]
#[command(about = "Detect duplicate datasets in a catalog and pick the original of each group")]
struct Args {
    /// Detector config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum strict similarity for title, notes and original_name
    #[arg(long, global = true, env = "DATASET_DEDUP_THRESHOLD")]
    threshold: Option<f64>,

    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide progress bars and log progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a JSON array of entries into a SQLite catalog
    Import {
        input: PathBuf,
        catalog: PathBuf,

        /// Delete an existing catalog first
        #[arg(long)]
        replace: bool,
    },
    /// Detect duplicates of one entry
    Detect { catalog: PathBuf, id: String },
    /// Detect duplicates for every entry and report the groups
    Scan {
        catalog: PathBuf,

        /// Write the groups here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write stage statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

const WRITE_BATCH_SIZE: usize = 10_000;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<DetectorConfig> {
    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    };
    match args.threshold {
        Some(threshold) => Ok(config.with_threshold(threshold)?),
        None => Ok(config),
    }
}

fn read_entries(path: &Path) -> Result<Vec<CatalogEntry>> {
    let phase = PhaseProgress::spinner("read");
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse entries from {}", path.display()))?;
    phase.finish(format!("Read {} entries from {}", entries.len(), path.display()));
    Ok(entries)
}

fn import(input: &Path, catalog_path: &Path, replace: bool, config: &DetectorConfig) -> Result<()> {
    validate_catalog_output(catalog_path, &[input])?;
    let entries = read_entries(input)?;

    if replace && catalog_path.exists() {
        std::fs::remove_file(catalog_path).context("Failed to remove existing catalog")?;
    }

    tracing::info!(catalog = %catalog_path.display(), "opening catalog");
    let mut catalog = SqliteCatalog::open_with_encoder(catalog_path, config.encoder())
        .context("Failed to open catalog")?;

    let phase = PhaseProgress::bar("write", entries.len() as u64);
    for chunk in entries.chunks(WRITE_BATCH_SIZE) {
        catalog.insert_entries(chunk)?;
        phase.inc(chunk.len() as u64);
    }
    phase.finish(format!("Wrote {} entries", entries.len()));

    let phase = PhaseProgress::spinner("analyze");
    catalog.optimize()?;
    phase.finish("Catalog analyzed");

    tracing::info!(entries = catalog.count()?, "import complete");
    Ok(())
}

fn detect(catalog_path: &Path, id: &str, config: DetectorConfig) -> Result<()> {
    let catalog = SqliteCatalog::open_with_encoder(catalog_path, config.encoder())
        .context("Failed to open catalog")?;
    let entry = catalog
        .entry(id)?
        .with_context(|| format!("No entry with id '{}'", id))?;

    let detector = DuplicateDetector::with_config(&catalog, config);
    let detection = detector.detect_traced(&entry)?;
    tracing::info!(
        id,
        exit = ?detection.exit,
        original = %detection.result.original.id,
        duplicates = detection.result.duplicates.len(),
        "detection finished"
    );

    println!("{}", serde_json::to_string_pretty(&detection.result)?);
    Ok(())
}

fn scan(
    catalog_path: &Path,
    output: Option<&Path>,
    stats_path: Option<&Path>,
    config: DetectorConfig,
) -> Result<()> {
    let start = Instant::now();

    let phase = PhaseProgress::spinner("load");
    let sqlite = SqliteCatalog::open_with_encoder(catalog_path, config.encoder())
        .context("Failed to open catalog")?;
    let mut catalog = MemoryCatalog::with_encoder(config.encoder());
    catalog.extend(sqlite.all_entries()?);
    drop(sqlite);
    phase.finish(format!(
        "Loaded {} entries in {} phonetic clusters",
        catalog.len(),
        catalog.cluster_count()
    ));

    let detector = DuplicateDetector::with_config(&catalog, config);
    let phase = PhaseProgress::bar("detect", catalog.len() as u64);

    let outcomes = catalog
        .entries()
        .par_iter()
        .map(|entry| {
            let mut stats = DetectionStats::default();
            let group = match detector.detect_traced(entry) {
                Ok(detection) => {
                    stats.record(&detection);
                    let result = &detection.result;
                    (result.is_original && result.has_duplicates())
                        .then(|| DuplicateGroup::from_result(result))
                }
                Err(DetectError::MalformedInput { id, field }) => {
                    tracing::warn!(%id, field, "skipping malformed entry");
                    stats.record_malformed();
                    None
                }
                Err(e) => return Err(e),
            };
            phase.inc(1);
            Ok((group, stats))
        })
        .collect::<std::result::Result<Vec<_>, DetectError>>()?;

    let mut groups = Vec::new();
    let mut stats = DetectionStats::default();
    for (group, entry_stats) in outcomes {
        groups.extend(group);
        stats = stats.merge(entry_stats);
    }
    groups.sort();
    stats.groups = groups.len();
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    phase.finish(format!("Found {} duplicate groups", groups.len()));

    stats.log_phase("scan");
    if let Some(path) = stats_path {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    write_groups(&groups, output)?;

    tracing::info!(
        entries = stats.entries_scanned,
        groups = stats.groups,
        duplicates = stats.duplicates,
        elapsed = %format_elapsed(start.elapsed()),
        "scan complete ({:.1}% duplicates)",
        stats.duplicate_rate()
    );
    Ok(())
}

fn write_groups(groups: &[DuplicateGroup], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, groups)?;
            writer.flush()?;
        }
        None => println!("{}", serde_json::to_string_pretty(groups)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let config = load_config(&args)?;

    match &args.command {
        Command::Import {
            input,
            catalog,
            replace,
        } => import(input, catalog, *replace, &config),
        Command::Detect { catalog, id } => detect(catalog, id, config),
        Command::Scan {
            catalog,
            output,
            stats,
        } => scan(catalog, output.as_deref(), stats.as_deref(), config),
    }
}
