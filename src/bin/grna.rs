// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! grna CLI
//!
//! Offline guide RNA scanning of FASTA input and crop/trait registry queries.

use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::util::SubscriberInitExt;

use agro_grna::cli::{strip_bom, write_guides, write_locus, write_registry, OutputFormat, TSV_HEADER};
use agro_grna::fasta::{open_fasta, parse_fasta, FastaRecord};
use agro_grna::scan::{GuideCandidate, PamPattern, ScanParams};
use agro_grna::{GrnaError, LocusRegistry};

#[derive(Parser)]
#[command(name = "grna")]
#[command(author, version, about = "CRISPR-Cas9 guide RNA scanner for crop genes")]
#[command(
    long_about = "Scan DNA sequences for CRISPR-Cas9 guide RNA candidates and query the crop/trait gene registry.

Examples:
  grna scan gene.fa
  grna scan gene.fa.gz --top-k 10 --format tsv
  cat gene.fa | grna scan - --pam NAG
  grna lookup rice 'drought resistance'
  grna crops --format json"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every record of a FASTA file for ranked guide candidates
    Scan {
        /// Input FASTA file, plain or gzip (use - for stdin)
        input: PathBuf,

        /// PAM motif (IUPAC N is a wildcard)
        #[arg(long, default_value = "NGG")]
        pam: String,

        /// Guide (protospacer) length in nucleotides
        #[arg(long, default_value_t = agro_grna::scan::DEFAULT_GUIDE_LENGTH)]
        guide_length: usize,

        /// Number of top-ranked guides to report per record
        #[arg(long, default_value_t = agro_grna::scan::DEFAULT_TOP_K)]
        top_k: usize,

        /// Output format (text, json, tsv)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a crop/trait pair to its registered gene
    Lookup {
        /// Crop name
        crop: String,

        /// Trait name
        #[arg(value_name = "TRAIT")]
        trait_name: String,

        /// Registry JSON file (default: embedded registry)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output format (text, json, tsv)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List supported crops and their traits
    Crops {
        /// Registry JSON file (default: embedded registry)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output format (text, json, tsv)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Scan {
            input,
            pam,
            guide_length,
            top_k,
            format,
            output,
        } => run_scan(&input, &pam, guide_length, top_k, &format, output.as_ref()),
        Commands::Lookup {
            crop,
            trait_name,
            registry,
            format,
        } => run_lookup(&crop, &trait_name, registry.as_deref(), &format),
        Commands::Crops { registry, format } => run_crops(registry.as_deref(), &format),
    }
}

fn run_scan(
    input: &Path,
    pam: &str,
    guide_length: usize,
    top_k: usize,
    format: &str,
    output: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if top_k == 0 {
        return Err(GrnaError::InvalidTopK {
            top_k,
            reason: "at least one guide must be returned".to_string(),
        }
        .into());
    }
    let params = ScanParams::new(PamPattern::new(pam)?, guide_length, top_k)?;
    let format = OutputFormat::from_str(format)?;

    let mut text = String::new();
    open_fasta(input)?.read_to_string(&mut text)?;
    let records = parse_fasta(strip_bom(&text))?;
    if records.is_empty() {
        return Err(GrnaError::InvalidSequence {
            msg: format!("no FASTA records found in {}", input.display()),
        }
        .into());
    }

    let start = Instant::now();
    let results = scan_records(&records, &params);
    debug!(
        records = records.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scan complete"
    );

    let mut writer: Box<dyn Write> = match output {
        Some(path) if path.as_os_str() != "-" => {
            Box::new(BufWriter::new(std::fs::File::create(path)?))
        }
        _ => Box::new(BufWriter::new(io::stdout())),
    };

    if format == OutputFormat::Tsv {
        writeln!(writer, "{}", TSV_HEADER)?;
    }
    for (record, guides) in records.iter().zip(&results) {
        write_guides(
            &mut writer,
            record.id(),
            record.sequence.len(),
            guides,
            format,
        )?;
    }
    writer.flush()?;

    info!(
        records = records.len(),
        guides = results.iter().map(Vec::len).sum::<usize>(),
        "wrote guide candidates"
    );
    Ok(())
}

#[cfg(feature = "parallel")]
fn scan_records(records: &[FastaRecord], params: &ScanParams) -> Vec<Vec<GuideCandidate>> {
    agro_grna::parallel::scan_records_parallel(records, params)
}

#[cfg(not(feature = "parallel"))]
fn scan_records(records: &[FastaRecord], params: &ScanParams) -> Vec<Vec<GuideCandidate>> {
    records
        .iter()
        .map(|record| agro_grna::scan::scan(&record.sequence, params))
        .collect()
}

fn run_lookup(
    crop: &str,
    trait_name: &str,
    registry: Option<&Path>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(registry)?;
    let locus = registry.lookup(crop, trait_name)?;
    let mut stdout = io::stdout().lock();
    write_locus(&mut stdout, &locus, OutputFormat::from_str(format)?)?;
    Ok(())
}

fn run_crops(registry: Option<&Path>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(registry)?;
    let mut stdout = io::stdout().lock();
    write_registry(&mut stdout, &registry, OutputFormat::from_str(format)?)?;
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<LocusRegistry, GrnaError> {
    match path {
        Some(path) => {
            info!("Loading registry from {}", path.display());
            LocusRegistry::from_path(path)
        }
        None => LocusRegistry::embedded(),
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}
