//! Command-line argument model for the `alnsieve` binary.
//!
//! Folder tools read a corpus and write the surviving alignments to an output
//! folder; check tools print `TRUE` or `FALSE` for a single alignment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::Level;

use crate::genetic_code::GeneticCode;
use crate::metrics::{AverageDnds, Metric, NucleotideDiversity, PolymorphicRate, PolymorphicSites};
use crate::threshold::{ThresholdError, ThresholdRange};

/// Default nucleotide diversity window.
pub const DEFAULT_MIN_DIVERSITY: f64 = 0.05;
pub const DEFAULT_MAX_DIVERSITY: f64 = 0.7;

/// alnsieve - quality control and filtering of gene alignments
///
/// Filters folders of FASTA alignments by polymorphism, nucleotide diversity
/// or NG86 dN/dS, and concatenates the survivors into a supermatrix.
#[derive(Parser, Debug)]
#[command(name = "alnsieve", author, version, about, long_about = None)]
pub struct Cli {
    /// Number of worker threads for folder tools (default: all cores)
    #[arg(short = 't', long = "threads", global = true, value_name = "THREADS")]
    pub threads: Option<usize>,

    /// Log debug details
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log errors only
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Log level for the chosen subcommand, adjusted by -v/-q.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::Debug
        } else if self.quiet {
            Level::Error
        } else if self.command.is_check() {
            Level::Warn
        } else {
            Level::Info
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep alignments with enough polymorphic sites
    FilterPolymorphic {
        #[command(flatten)]
        folders: FolderArgs,
        #[command(flatten)]
        cutoff: PolymorphicCutoff,
    },

    /// Keep alignments whose nucleotide diversity lies in a range
    FilterDiversity {
        #[command(flatten)]
        folders: FolderArgs,
        #[command(flatten)]
        gate: DiversityArgs,
    },

    /// Keep alignments whose mean pairwise dN/dS lies in a range
    FilterDnds {
        #[command(flatten)]
        folders: FolderArgs,
        #[command(flatten)]
        gate: DndsArgs,
    },

    /// Print TRUE if one alignment has enough polymorphic sites
    CheckPolymorphic {
        #[command(flatten)]
        target: CheckArgs,
        #[command(flatten)]
        cutoff: PolymorphicCutoff,
    },

    /// Print TRUE if one alignment's nucleotide diversity lies in a range
    CheckDiversity {
        #[command(flatten)]
        target: CheckArgs,
        #[command(flatten)]
        gate: DiversityArgs,
    },

    /// Print TRUE if one alignment's mean pairwise dN/dS lies in a range
    CheckDnds {
        #[command(flatten)]
        target: CheckArgs,
        #[command(flatten)]
        gate: DndsArgs,
    },

    /// Concatenate a folder of alignments over their shared taxa
    Concat {
        /// Folder of single-gene alignments
        #[arg(short = 'i', long = "input", value_name = "DIR")]
        input: PathBuf,

        /// Output FASTA file
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: PathBuf,
    },

    /// Print a random sample of taxon ids, one per line
    SampleTaxa {
        /// Alignment file (or base name without extension)
        alignment: PathBuf,

        /// Number of taxa to draw
        #[arg(short = 'n', long = "count")]
        count: usize,

        /// Seed for a reproducible draw
        #[arg(short = 's', long = "seed")]
        seed: Option<u64>,
    },

    /// Keep only the taxa listed in a file
    Subset {
        /// Alignment file (or base name without extension)
        alignment: PathBuf,

        /// File with one taxon id per line
        #[arg(short = 'l', long = "taxa", value_name = "FILE")]
        taxa: PathBuf,

        /// Output FASTA file (default: stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Trim headers to the text before the first '-' or '_'
    FormatHeaders {
        /// Alignment file (or base name without extension)
        alignment: PathBuf,

        /// Output FASTA file (default: stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// True for the single-file TRUE/FALSE tools.
    pub fn is_check(&self) -> bool {
        matches!(
            self,
            Command::CheckPolymorphic { .. } | Command::CheckDiversity { .. } | Command::CheckDnds { .. }
        )
    }
}

#[derive(Args, Debug)]
pub struct FolderArgs {
    /// Folder of FASTA alignments (searched recursively)
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input: PathBuf,

    /// Folder receiving the alignments that pass
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Alignment file (or base name without extension)
    pub alignment: PathBuf,

    /// Also write the value and verdict to <alignment>.log
    #[arg(short = 'r', long = "report")]
    pub report: bool,
}

/// Either a minimum rate or a minimum count of polymorphic sites.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PolymorphicCutoff {
    /// Minimum fraction of polymorphic columns (0-1)
    #[arg(long = "min-rate", value_name = "RATE")]
    pub min_rate: Option<f64>,

    /// Minimum number of polymorphic columns
    #[arg(long = "min-sites", value_name = "COUNT")]
    pub min_sites: Option<usize>,
}

impl PolymorphicCutoff {
    pub fn metric(&self) -> Box<dyn Metric> {
        match self.min_sites {
            Some(_) => Box::new(PolymorphicSites),
            None => Box::new(PolymorphicRate),
        }
    }

    pub fn range(&self) -> Result<ThresholdRange, ThresholdError> {
        match (self.min_rate, self.min_sites) {
            (_, Some(sites)) => ThresholdRange::at_least(sites as f64),
            (Some(rate), None) => ThresholdRange::at_least(rate),
            (None, None) => ThresholdRange::at_least(0.0),
        }
    }
}

#[derive(Args, Debug)]
pub struct DiversityArgs {
    /// Minimum nucleotide diversity
    #[arg(long = "min", default_value_t = DEFAULT_MIN_DIVERSITY)]
    pub min: f64,

    /// Maximum nucleotide diversity
    #[arg(long = "max", default_value_t = DEFAULT_MAX_DIVERSITY)]
    pub max: f64,

    /// Count gap-vs-base columns as differences
    #[arg(long = "include-gaps")]
    pub include_gaps: bool,
}

impl DiversityArgs {
    pub fn metric(&self) -> NucleotideDiversity {
        NucleotideDiversity {
            ignore_gaps: !self.include_gaps,
        }
    }

    pub fn range(&self) -> Result<ThresholdRange, ThresholdError> {
        ThresholdRange::new(self.min, self.max)
    }
}

#[derive(Args, Debug)]
pub struct DndsArgs {
    /// Minimum mean dN/dS
    #[arg(long = "min", default_value_t = 0.0)]
    pub min: f64,

    /// Maximum mean dN/dS (default: no upper bound)
    #[arg(long = "max")]
    pub max: Option<f64>,

    /// Keep gap characters inside codons instead of removing them
    #[arg(long = "include-gaps")]
    pub include_gaps: bool,

    /// NCBI genetic code used for translation (1 = Standard)
    #[arg(short = 'g', long = "genetic-code", default_value_t = 1)]
    pub genetic_code: u8,
}

impl DndsArgs {
    /// Builds the estimator; `None` for an unknown genetic code id.
    pub fn metric(&self) -> Option<AverageDnds> {
        GeneticCode::by_id(self.genetic_code).map(|code| AverageDnds::new(code, self.include_gaps))
    }

    pub fn range(&self) -> Result<ThresholdRange, ThresholdError> {
        match self.max {
            Some(max) => ThresholdRange::new(self.min, max),
            None => ThresholdRange::at_least(self.min),
        }
    }
}
