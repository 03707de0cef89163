//! CLI for the COYO-Tiny dataset tools.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use coyo_core::config;
use coyo_core::fetch::BatchSelection;
use std::path::PathBuf;

use commands::{run_download, run_export_samples, run_filter, run_subset};

/// Top-level CLI for the COYO-Tiny dataset tools.
#[derive(Debug, Parser)]
#[command(name = "coyo")]
#[command(about = "COYO-Tiny: subset, download, filter and export an image-text dataset", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Shuffle a record dump and save a percentage of it as a subset.
    Subset {
        /// Record dump (.jsonl file or directory with records.jsonl).
        #[arg(long)]
        source: PathBuf,
        /// Directory the subset is saved under.
        #[arg(long, default_value = "./datasets_cache")]
        cache_dir: PathBuf,
        /// Percentage of records to keep after shuffling (config default: 10).
        #[arg(long)]
        subset_percentage: Option<f64>,
        /// Name for the saved subset.
        #[arg(long, default_value = "subset")]
        subset_name: String,
        /// Shuffle seed (config default: 42).
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Download the image of every record in a subset.
    Download {
        /// Full path to the dataset subset.
        #[arg(long)]
        subset_path: PathBuf,
        /// Directory to save downloaded images.
        #[arg(long, default_value = "./images")]
        image_directory: PathBuf,
        /// Requests in flight at once (default: number of CPUs).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Process at most N records.
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,
        /// Process only this leading fraction of records, in (0, 1].
        #[arg(long, value_name = "F")]
        sample_fraction: Option<f64>,
    },

    /// Keep only records whose image was downloaded and cache them.
    Filter {
        /// Full path to the dataset subset.
        #[arg(long)]
        subset_path: PathBuf,
        /// Directory with downloaded images (default: <subset-path>/images).
        #[arg(long)]
        image_directory: Option<PathBuf>,
        /// Directory to save the cached dataset.
        #[arg(long)]
        cache_path: PathBuf,
        /// Name of the cached dataset.
        #[arg(long, default_value = "coyo-tiny")]
        dataset_name: String,
    },

    /// Export filtered records as curation-tool samples (JSON).
    ExportSamples {
        /// Filtered dataset (.jsonl file or directory with records.jsonl).
        #[arg(long)]
        dataset_path: PathBuf,
        /// Output JSON file.
        #[arg(long, default_value = "samples.json")]
        output: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Subset {
                source,
                cache_dir,
                subset_percentage,
                subset_name,
                seed,
            } => {
                let percentage = subset_percentage.unwrap_or(cfg.subset.percentage);
                let seed = seed.unwrap_or(cfg.subset.seed);
                run_subset(&source, &cache_dir, &subset_name, percentage, seed)?;
            }
            CliCommand::Download {
                subset_path,
                image_directory,
                concurrency,
                max_items,
                sample_fraction,
            } => {
                let selection = BatchSelection::new(max_items, sample_fraction)?;
                run_download(&cfg.fetch, &subset_path, &image_directory, concurrency, selection)
                    .await?;
            }
            CliCommand::Filter {
                subset_path,
                image_directory,
                cache_path,
                dataset_name,
            } => {
                let image_directory =
                    image_directory.unwrap_or_else(|| subset_path.join("images"));
                run_filter(&subset_path, &image_directory, &cache_path, &dataset_name)?;
            }
            CliCommand::ExportSamples {
                dataset_path,
                output,
            } => run_export_samples(&dataset_path, &output)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
