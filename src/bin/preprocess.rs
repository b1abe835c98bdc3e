//! Headless pipeline: processes a data folder and writes the boundary
//! artifacts the viewer and downstream analysis read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use thermal_panda::data::format::Modality;
use thermal_panda::data::loader::BatchSummary;
use thermal_panda::data::pairwise::{analyze, CurveSummary};
use thermal_panda::data::replicate::average_replicates_in;
use thermal_panda::data::writer::{read_matrix_with_names, write_averaged};
use thermal_panda::pipeline::{run_modality, write_outputs};
use thermal_panda::PipelineConfig;

#[derive(Parser)]
#[command(name = "preprocess")]
#[command(about = "TGA/DSC curve normalization and pairwise comparison", version)]
struct Cli {
    /// Path to JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process <data_dir>/TGA and <data_dir>/DSC and write their artifacts
    Run {
        /// Folder holding TGA/ and DSC/ subfolders
        data_dir: PathBuf,
        /// Output directory (one subfolder per modality)
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
        /// Only process this modality (tga or dsc)
        #[arg(short, long)]
        modality: Option<Modality>,
    },

    /// Average replicate exports `<base>_<n>.csv` into <dir>/averaged/
    Average {
        /// Directory containing replicate files
        directory: PathBuf,
    },

    /// Recompute pairwise statistics from a persisted matrix and sample index
    Pairwise {
        /// Resampled matrix (.parquet)
        matrix: PathBuf,
        /// Sample index file ("i: name" per line)
        names: PathBuf,
    },
}

fn print_batch(label: &str, summary: &BatchSummary) {
    println!("[{label}]");
    print!("{summary}");
}

fn format_summary(summary: Option<CurveSummary>) -> String {
    match summary {
        Some(s) => format!(
            "mean {:.5}, std {:.5}, max |d| {:.5}, mean |d| {:.5}",
            s.mean, s.std, s.max_abs, s.mean_abs
        ),
        None => "no values".to_string(),
    }
}

fn cmd_run(data_dir: &Path, out: &Path, only: Option<Modality>, config: &PipelineConfig) -> Result<()> {
    let modalities: Vec<Modality> = match only {
        Some(m) => vec![m],
        None => Modality::ALL.to_vec(),
    };
    let mut failures = 0;
    let mut total = BatchSummary::default();
    for modality in modalities {
        let dir = data_dir.join(modality.label());
        match run_modality(&dir, modality, config) {
            Ok(output) => {
                let target = out.join(modality.label().to_lowercase());
                write_outputs(&target, &output)
                    .with_context(|| format!("writing {modality} artifacts to {}", target.display()))?;
                print_batch(modality.label(), &output.summary);
                total.merge(output.summary.clone());
                println!(
                    "{modality}: {} samples, {} pairs -> {}",
                    output.matrix.n_samples(),
                    output.analysis.n_pairs(),
                    target.display()
                );
            }
            Err(e) => {
                warn!("{modality}: {e}");
                failures += 1;
            }
        }
    }
    let (processed, skipped, errors) = total.counts();
    info!("total: {processed} processed, {skipped} skipped, {errors} errors");
    if failures > 0 {
        anyhow::bail!("{failures} modalities failed");
    }
    Ok(())
}

fn cmd_average(dir: &Path, config: &PipelineConfig) -> Result<()> {
    let (tables, summary) = average_replicates_in(dir, &config.extensions)
        .with_context(|| format!("averaging replicates in {}", dir.display()))?;
    let written = write_averaged(dir, &tables)?;
    print_batch("average", &summary);
    println!("{} averaged tables written", written.len());
    Ok(())
}

fn cmd_pairwise(matrix: &Path, names: &Path) -> Result<()> {
    let matrix = read_matrix_with_names(matrix, names)
        .with_context(|| format!("reading {} with {}", matrix.display(), names.display()))?;
    info!("Loaded {matrix}");
    let analysis = analyze(&matrix);

    println!("{} samples, {} pairs", matrix.n_samples(), analysis.n_pairs());
    if let Some(global) = analysis.global {
        println!(
            "difference range [{:.5}, {:.5}], max |d| {:.5}",
            global.diff_min, global.diff_max, global.abs_max
        );
    }
    println!("mean difference:          {}", format_summary(analysis.mean_difference.overall()));
    println!("mean absolute difference: {}", format_summary(analysis.mean_abs_difference.overall()));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match &cli.config {
        Some(path) => {
            let config = PipelineConfig::from_json_file(path)?;
            info!("Loaded config from: {}", path.display());
            config
        }
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Run { data_dir, out, modality } => cmd_run(&data_dir, &out, modality, &config),
        Commands::Average { directory } => cmd_average(&directory, &config),
        Commands::Pairwise { matrix, names } => cmd_pairwise(&matrix, &names),
    }
}
