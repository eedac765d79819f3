use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use txn_geoflow::logging::init_logging;
use txn_geoflow::{Pipeline, PipelineConfig, PostalIndex};

#[derive(Parser)]
#[command(name = "txn-geoflow")]
#[command(about = "Map payer/payee postal codes of a transactions CSV to [lon,lat] routes")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./geoflow.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transactions .csv into sorted, anonymized JSON
    Convert {
        /// Transactions .csv path and filename
        csv_file: PathBuf,

        /// Output directory + base filename; the configured suffix (_latlong.json) is appended.
        /// Without it the JSON is printed to stdout.
        out_base: Option<PathBuf>,

        /// Postal code reference table (overrides the config)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Carry date, app_id and amount into the output
        #[arg(long)]
        passthrough: bool,

        /// Print the conversion report as JSON on stderr
        #[arg(long)]
        report: bool,
    },
    /// Load a reference table and print its statistics
    Reference {
        /// Reference table (overrides the config)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::discover()?,
    };

    match cli.command {
        Commands::Convert {
            csv_file,
            out_base,
            reference,
            passthrough,
            report,
        } => {
            if let Some(path) = reference {
                config.reference_path = path;
            }
            if passthrough {
                config.include_passthrough_fields = true;
            }
            run_convert(&config, &csv_file, out_base.as_deref(), report)
        }
        Commands::Reference { path } => {
            if let Some(path) = path {
                config.reference_path = path;
            }
            run_reference(&config)
        }
    }
}

fn load_reference(config: &PipelineConfig) -> Result<PostalIndex> {
    let index = PostalIndex::load(&config.reference_path, config.reference_delimiter_byte()?)
        .with_context(|| format!("Failed to load reference table {}", config.reference_path.display()))?;
    Ok(index)
}

fn run_convert(config: &PipelineConfig, csv_file: &Path, out_base: Option<&Path>, print_report: bool) -> Result<()> {
    let index = load_reference(config)?;
    let pipeline = Pipeline::new(config)?;

    eprintln!("Parsing transactions from {} ...", csv_file.display());

    let report = match out_base {
        Some(base) => {
            let outfile = config.output_path(base);
            let report = pipeline
                .convert_to_file(csv_file, &outfile, &index)
                .with_context(|| format!("Failed to convert {}", csv_file.display()))?;
            eprintln!(
                "Writing ({}/{}) parsed transactions to {}",
                report.retained,
                report.input_rows,
                outfile.display()
            );
            report
        }
        None => {
            let conversion = pipeline
                .convert(csv_file, &index)
                .with_context(|| format!("Failed to convert {}", csv_file.display()))?;
            println!("{}", conversion.json);
            conversion.report
        }
    };

    if print_report {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn run_reference(config: &PipelineConfig) -> Result<()> {
    let index = load_reference(config)?;

    println!("Reference table: {}", config.reference_path.display());
    println!("✓ {} unique postal codes across {} countries", index.len(), index.country_count());
    println!("✓ {} duplicate rows discarded (first occurrence kept)", index.duplicates());

    Ok(())
}
