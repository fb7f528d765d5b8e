//! alnsieve - quality control for gene alignments.
//!
//! ## Usage
//!
//! ```bash
//! alnsieve filter-polymorphic -i genes/ -o kept/ --min-rate 0.05
//! alnsieve filter-diversity -i genes/ -o kept/ --min 0.05 --max 0.7
//! alnsieve filter-dnds -i genes/ -o kept/ --max 1.0
//! alnsieve check-dnds gene.fasta --max 1.0 --report
//! alnsieve concat -i kept/ -o supermatrix.fasta
//! ```
//!
//! Folder tools print a run summary on stdout; check tools print `TRUE` or
//! `FALSE`. Logs go to stderr.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use alnsieve::cli::{CheckArgs, Cli, Command, DndsArgs, FolderArgs};
use alnsieve::concat::concatenate_corpus;
use alnsieve::formats::fasta::{write_fasta, write_fasta_file};
use alnsieve::formats::{load, resolve_alignment_path};
use alnsieve::genetic_code::GeneticCode;
use alnsieve::metrics::{AverageDnds, Metric};
use alnsieve::model::Alignment;
use alnsieve::pipeline::{check_alignment, filter_corpus, report_path, FilterJob};
use alnsieve::taxa::{normalize_headers, read_taxon_list, retain_taxa, sample_taxa};
use alnsieve::threshold::ThresholdRange;

/// Runs a folder filter and prints its summary.
fn run_filter(folders: &FolderArgs, metric: &dyn Metric, range: ThresholdRange) -> Result<()> {
    let job = FilterJob {
        input_dir: folders.input.clone(),
        output_dir: folders.output.clone(),
        metric,
        range,
    };
    let summary = filter_corpus(&job)?;
    println!("{}", summary);
    Ok(())
}

/// Runs a single-file check, prints TRUE/FALSE and optionally writes the report.
fn run_check(target: &CheckArgs, metric: &dyn Metric, range: ThresholdRange) -> Result<()> {
    let outcome = check_alignment(&target.alignment, metric, range)?;
    println!("{}", outcome.verdict());

    if target.report {
        let log_path = report_path(&outcome.path);
        fs::write(&log_path, outcome.report())
            .with_context(|| format!("Could not write report {}", log_path.display()))?;
    }
    Ok(())
}

fn dnds_metric(gate: &DndsArgs) -> Result<AverageDnds> {
    gate.metric().ok_or_else(|| {
        let ids: Vec<String> = GeneticCode::available_ids().map(|id| id.to_string()).collect();
        anyhow!(
            "Unknown genetic code: {} (available: {})",
            gate.genetic_code,
            ids.join(", ")
        )
    })
}

/// Loads an alignment given as a file or a base name.
fn load_alignment(path: &Path) -> Result<Alignment> {
    let resolved = resolve_alignment_path(path)
        .ok_or_else(|| anyhow!("No alignment found at {}", path.display()))?;
    load(&resolved).with_context(|| format!("Could not load {}", resolved.display()))
}

/// Writes an alignment to a file, or to stdout when no file is given.
fn emit(alignment: &Alignment, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            write_fasta_file(alignment, path)?;
            info!("Wrote {} sequences to {}", alignment.sequence_count(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_fasta(alignment, &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::FilterPolymorphic { folders, cutoff } => {
            run_filter(&folders, &*cutoff.metric(), cutoff.range()?)
        }
        Command::FilterDiversity { folders, gate } => run_filter(&folders, &gate.metric(), gate.range()?),
        Command::FilterDnds { folders, gate } => {
            let range = gate.range()?;
            run_filter(&folders, &dnds_metric(&gate)?, range)
        }
        Command::CheckPolymorphic { target, cutoff } => {
            run_check(&target, &*cutoff.metric(), cutoff.range()?)
        }
        Command::CheckDiversity { target, gate } => run_check(&target, &gate.metric(), gate.range()?),
        Command::CheckDnds { target, gate } => {
            let range = gate.range()?;
            run_check(&target, &dnds_metric(&gate)?, range)
        }
        Command::Concat { input, output } => {
            let summary = concatenate_corpus(&input, &output)?;
            println!("Alignments concatenated: {}", summary.alignments);
            println!("Files skipped: {}", summary.skipped);
            println!("Common taxa: {}", summary.taxa);
            println!("Concatenated length: {}", summary.length);
            println!("Output: {}", output.display());
            Ok(())
        }
        Command::SampleTaxa { alignment, count, seed } => {
            let alignment = load_alignment(&alignment)?;
            let picked = match seed {
                Some(seed) => sample_taxa(&alignment, count, &mut StdRng::seed_from_u64(seed))?,
                None => sample_taxa(&alignment, count, &mut rand::rng())?,
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for id in picked {
                writeln!(handle, "{}", id)?;
            }
            Ok(())
        }
        Command::Subset { alignment, taxa, output } => {
            let alignment = load_alignment(&alignment)?;
            let wanted = read_taxon_list(&taxa)?;
            if wanted.is_empty() {
                bail!("Taxon list {} is empty", taxa.display());
            }
            let subset = retain_taxa(&alignment, wanted.as_slice())?;
            emit(&subset, output.as_ref())
        }
        Command::FormatHeaders { alignment, output } => {
            let alignment = load_alignment(&alignment)?;
            emit(&normalize_headers(alignment)?, output.as_ref())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level(cli.log_level())?;

    if let Some(threads) = cli.threads {
        if threads == 0 {
            bail!("--threads must be at least 1");
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    run(cli)
}
