//! Corpus filtering.
//!
//! Applies one [`Metric`] and one [`ThresholdRange`] to every alignment in a
//! directory tree, writing the passing alignments to an output directory
//! under the same relative path.
//!
//! Files are evaluated in parallel with rayon; each file is independent and
//! per-file failures are logged and counted, never fatal. Results are
//! collected in discovery order and reduced into a [`FilterSummary`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::formats::fasta::write_fasta_file;
use crate::formats::{discover_alignments, load, resolve_alignment_path};
use crate::metrics::Metric;
use crate::threshold::{passes, ThresholdError, ThresholdRange};

/// Errors that stop a filter run before any file is processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input folder '{0}' does not exist")]
    MissingInput(PathBuf),

    #[error("Input path '{0}' is not a folder")]
    NotADirectory(PathBuf),

    #[error("Invalid threshold: {0}")]
    Threshold(#[from] ThresholdError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One filter run: where to read, where to write, what to compute, what to keep.
pub struct FilterJob<'a> {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub metric: &'a dyn Metric,
    pub range: ThresholdRange,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Passed the gate and was written out.
    Kept(f64),
    /// Failed the gate; `None` when the metric was undefined.
    Removed(Option<f64>),
    /// Could not be loaded or written.
    Errored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Running min/max/mean of defined metric values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    sum: f64,
}

impl MetricStats {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            min: value,
            max: value,
            sum: value,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Counts and statistics for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSummary {
    pub metric: &'static str,
    pub range: ThresholdRange,
    pub output_dir: PathBuf,
    pub processed: usize,
    pub kept: usize,
    pub removed: usize,
    /// Removed files whose metric was undefined
    pub undefined: usize,
    pub errored: usize,
    pub stats: Option<MetricStats>,
    pub reports: Vec<FileReport>,
}

impl FilterSummary {
    fn from_reports(job: &FilterJob, reports: Vec<FileReport>) -> Self {
        let mut summary = Self {
            metric: job.metric.name(),
            range: job.range,
            output_dir: job.output_dir.clone(),
            processed: reports.len(),
            kept: 0,
            removed: 0,
            undefined: 0,
            errored: 0,
            stats: None,
            reports: Vec::new(),
        };

        for report in &reports {
            let value = match report.outcome {
                Outcome::Kept(v) => {
                    summary.kept += 1;
                    Some(v)
                }
                Outcome::Removed(v) => {
                    summary.removed += 1;
                    if v.is_none() {
                        summary.undefined += 1;
                    }
                    v
                }
                Outcome::Errored(_) => {
                    summary.errored += 1;
                    None
                }
            };
            if let Some(v) = value {
                match summary.stats.as_mut() {
                    Some(stats) => stats.add(v),
                    None => summary.stats = Some(MetricStats::new(v)),
                }
            }
        }

        summary.reports = reports;
        summary
    }

    /// Kept files as a percentage of all processed files.
    pub fn retention_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.kept as f64 / self.processed as f64 * 100.0
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "FILTER SUMMARY ({} in {})", self.metric, self.range)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total files processed: {}", self.processed)?;
        writeln!(f, "Files kept: {}", self.kept)?;
        writeln!(
            f,
            "Files removed: {} (undefined {}: {})",
            self.removed, self.metric, self.undefined
        )?;
        writeln!(f, "Files with errors: {}", self.errored)?;
        writeln!(f, "Retention rate: {:.1}%", self.retention_rate())?;
        if let Some(stats) = &self.stats {
            writeln!(f, "{} statistics ({} files):", self.metric, stats.count)?;
            writeln!(f, "  Min: {:.6}", stats.min)?;
            writeln!(f, "  Max: {:.6}", stats.max)?;
            writeln!(f, "  Mean: {:.6}", stats.mean())?;
        }
        write!(f, "Filtered files saved to: {}", self.output_dir.display())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn process_file(job: &FilterJob, path: &Path) -> Outcome {
    let name = display_name(path);
    let alignment = match load(path) {
        Ok(alignment) => alignment,
        Err(e) => {
            warn!("Skipping {}: {}", name, e);
            return Outcome::Errored(e.to_string());
        }
    };

    let value = job.metric.compute(&alignment);
    info!("{} - {}", name, job.metric.describe(&alignment, value));

    let value = match value {
        Some(v) if passes(value, &job.range) => v,
        _ => {
            info!("  removed ({} outside {})", job.metric.name(), job.range);
            return Outcome::Removed(value);
        }
    };

    let relative = path.strip_prefix(&job.input_dir).unwrap_or(path);
    let destination = job.output_dir.join(relative);
    match write_fasta_file(&alignment, &destination) {
        Ok(()) => {
            info!("  kept -> {}", destination.display());
            Outcome::Kept(value)
        }
        Err(e) => {
            error!("Could not write {}: {}", destination.display(), e);
            Outcome::Errored(e.to_string())
        }
    }
}

/// Runs a filter over a corpus.
///
/// The threshold and input folder are checked before anything is written;
/// the output folder is created only once both are valid.
pub fn filter_corpus(job: &FilterJob) -> Result<FilterSummary, PipelineError> {
    job.metric.validate(&job.range)?;
    if !job.input_dir.exists() {
        return Err(PipelineError::MissingInput(job.input_dir.clone()));
    }
    if !job.input_dir.is_dir() {
        return Err(PipelineError::NotADirectory(job.input_dir.clone()));
    }

    let files = discover_alignments(&job.input_dir)?;
    fs::create_dir_all(&job.output_dir)?;

    if files.is_empty() {
        warn!("No alignment files found in {}", job.input_dir.display());
    } else {
        info!(
            "Filtering {} alignment files by {} in {}",
            files.len(),
            job.metric.name(),
            job.range
        );
    }

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| FileReport {
            path: path.clone(),
            outcome: process_file(job, path),
        })
        .collect();

    Ok(FilterSummary::from_reports(job, reports))
}

/// Verdict of a single-file check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// The alignment file that was evaluated.
    pub path: PathBuf,
    pub metric: &'static str,
    pub range: ThresholdRange,
    pub value: Option<f64>,
    pub passed: bool,
    /// Why the alignment could not be evaluated, if it could not.
    pub error: Option<String>,
}

impl CheckOutcome {
    /// `TRUE` or `FALSE`.
    pub fn verdict(&self) -> &'static str {
        if self.passed {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Text of the `<alignment>.log` report.
    pub fn report(&self) -> String {
        let value = match self.value {
            Some(v) => format!("{:.6}", v),
            None => "None".to_string(),
        };
        let mut text = format!(
            "{}: {}\nRange: {}\nResult: {}\n",
            self.metric,
            value,
            self.range,
            self.verdict()
        );
        if let Some(error) = &self.error {
            text.push_str(&format!("Error: {}\n", error));
        }
        text
    }
}

/// Evaluates one alignment, given as a file or a base name, against a range.
///
/// The range is validated before the filesystem is touched. An alignment that
/// cannot be found or loaded yields a failing verdict rather than an error.
pub fn check_alignment(
    alignment: &Path,
    metric: &dyn Metric,
    range: ThresholdRange,
) -> Result<CheckOutcome, ThresholdError> {
    metric.validate(&range)?;

    let path = resolve_alignment_path(alignment).unwrap_or_else(|| alignment.to_path_buf());
    let (value, error) = match load(&path) {
        Ok(alignment) => {
            let value = metric.compute(&alignment);
            info!("{} - {}", display_name(&path), metric.describe(&alignment, value));
            (value, None)
        }
        Err(e) => {
            warn!("Could not load {}: {}", path.display(), e);
            (None, Some(e.to_string()))
        }
    };

    Ok(CheckOutcome {
        path,
        metric: metric.name(),
        range,
        value,
        passed: passes(value, &range),
        error,
    })
}

/// Path of the report written next to an alignment: `<alignment>.log`.
pub fn report_path(alignment: &Path) -> PathBuf {
    let mut name = alignment.as_os_str().to_owned();
    name.push(".log");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AverageDnds, NucleotideDiversity, PolymorphicRate};

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_filter_by_diversity() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_dir = output.path().join("kept");

        // pi = 0.25
        write(input.path(), "a.fasta", ">x\nACGT\n>y\nACGA\n");
        // pi = 0.0
        write(input.path(), "b.fa", ">x\nACGT\n>y\nACGT\n");
        // single sequence: undefined
        write(input.path(), "c.fas", ">x\nACGT\n");
        // malformed
        write(input.path(), "d.fna", ">x\nACGT\n>y\nAC\n");
        // pi = 0.5, nested
        write(input.path(), "sub/e.fasta", ">x\nAC\n>y\nAG\n");

        let metric = NucleotideDiversity { ignore_gaps: true };
        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: out_dir.clone(),
            metric: &metric,
            range: ThresholdRange::new(0.1, 0.8).unwrap(),
        };
        let summary = filter_corpus(&job).unwrap();

        assert_eq!(summary.processed, 5);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.removed, 2);
        assert_eq!(summary.undefined, 1);
        assert_eq!(summary.errored, 1);

        let stats = summary.stats.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.5);
        assert!((stats.mean() - 0.25).abs() < 1e-12);
        assert!((summary.retention_rate() - 40.0).abs() < 1e-9);

        assert!(out_dir.join("a.fasta").is_file());
        assert!(out_dir.join("sub").join("e.fasta").is_file());
        assert!(!out_dir.join("b.fa").exists());
        assert!(!out_dir.join("d.fna").exists());

        let kept = load(out_dir.join("a.fasta")).unwrap();
        assert_eq!(kept, load(input.path().join("a.fasta")).unwrap());

        // Reports follow discovery order
        let outcomes: Vec<&Outcome> = summary.reports.iter().map(|r| &r.outcome).collect();
        assert_eq!(outcomes[0], &Outcome::Kept(0.25));
        assert_eq!(outcomes[1], &Outcome::Removed(Some(0.0)));
        assert_eq!(outcomes[2], &Outcome::Removed(None));
        assert!(matches!(outcomes[3], Outcome::Errored(_)));
    }

    #[test]
    fn test_filter_by_polymorphic_rate_one_sided() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "low.fa", ">x\nAAAA\n>y\nAAAC\n");
        write(input.path(), "high.fa", ">x\nAAAA\n>y\nCCCC\n");

        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            metric: &PolymorphicRate,
            range: ThresholdRange::at_least(0.5).unwrap(),
        };
        let summary = filter_corpus(&job).unwrap();

        assert_eq!(summary.kept, 1);
        assert_eq!(summary.removed, 1);
        assert!(output.path().join("high.fa").is_file());
        assert!(!output.path().join("low.fa").exists());
    }

    #[test]
    fn test_filter_by_dnds() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "syn.fa", ">x\nATGAAATAA\n>y\nATGAAGTAA\n");
        write(input.path(), "noorf.fa", ">x\nCCCCCC\n>y\nCCCCCA\n");

        let metric = AverageDnds::default();
        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            metric: &metric,
            range: ThresholdRange::new(0.0, 1.0).unwrap(),
        };
        let summary = filter_corpus(&job).unwrap();

        assert_eq!(summary.kept, 1);
        assert_eq!(summary.undefined, 1);
        assert!(output.path().join("syn.fa").is_file());
    }

    #[test]
    fn test_missing_input_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let out_dir = root.path().join("out");
        let job = FilterJob {
            input_dir: root.path().join("missing"),
            output_dir: out_dir.clone(),
            metric: &PolymorphicRate,
            range: ThresholdRange::at_least(0.1).unwrap(),
        };

        assert!(matches!(filter_corpus(&job), Err(PipelineError::MissingInput(_))));
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_out_of_domain_threshold_touches_nothing() {
        let input = tempfile::tempdir().unwrap();
        let out_dir = input.path().join("out");
        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: out_dir.clone(),
            metric: &PolymorphicRate,
            range: ThresholdRange::at_least(1.5).unwrap(),
        };

        assert!(matches!(filter_corpus(&job), Err(PipelineError::Threshold(_))));
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_empty_corpus() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            metric: &PolymorphicRate,
            range: ThresholdRange::at_least(0.1).unwrap(),
        };

        let summary = filter_corpus(&job).unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.retention_rate(), 0.0);
        assert!(summary.stats.is_none());
        assert!(summary.to_string().contains("Total files processed: 0"));
    }

    #[test]
    fn test_check_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gene.fa");
        fs::write(&path, ">x\nACGT\n>y\nACGA\n").unwrap();

        let metric = NucleotideDiversity { ignore_gaps: true };
        let inside = check_alignment(&path, &metric, ThresholdRange::new(0.1, 0.3).unwrap()).unwrap();
        assert!(inside.passed);
        assert_eq!(inside.verdict(), "TRUE");
        assert!(inside.report().starts_with("nucleotide diversity: 0.250000\nRange: [0.1, 0.3]"));

        let outside = check_alignment(&path, &metric, ThresholdRange::new(0.3, 0.7).unwrap()).unwrap();
        assert_eq!(outside.verdict(), "FALSE");
        assert_eq!(outside.value, Some(0.25));
    }

    #[test]
    fn test_check_malformed_alignment_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fa");
        fs::write(&path, ">x\nACGT\n>x\nACGT\n").unwrap();

        let outcome = check_alignment(&path, &PolymorphicRate, ThresholdRange::at_least(0.0).unwrap()).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.value, None);
        assert!(outcome.error.is_some());
        assert!(outcome.report().contains("polymorphic rate: None"));
    }

    #[test]
    fn test_check_rejects_bad_range_first() {
        let result = check_alignment(
            Path::new("does/not/exist"),
            &NucleotideDiversity { ignore_gaps: true },
            ThresholdRange::new(0.5, 2.0).unwrap(),
        );
        assert!(matches!(result, Err(ThresholdError::OutOfDomain { .. })));
    }

    #[test]
    fn test_report_path() {
        assert_eq!(report_path(Path::new("dir/gene.fa")), PathBuf::from("dir/gene.fa.log"));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlink_loop_is_not_followed() {
        use std::os::unix::fs::symlink;

        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "a.fa", ">x\nAC\n>y\nAG\n");
        write(input.path(), "sub/b.fa", ">x\nAC\n>y\nTG\n");
        symlink(input.path(), input.path().join("sub").join("loop")).unwrap();

        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            metric: &PolymorphicRate,
            range: ThresholdRange::at_least(0.1).unwrap(),
        };
        let summary = filter_corpus(&job).unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.kept, 2);
        assert!(!output.path().join("sub").join("loop").exists());
    }

    #[test]
    fn test_kept_file_keeps_header_descriptions() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "gene.fa",
            ">x gene=cox1 [Homo sapiens]\nACGT\n>y\tpartial cds\nACGA\n",
        );

        let metric = NucleotideDiversity { ignore_gaps: true };
        let job = FilterJob {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().to_path_buf(),
            metric: &metric,
            range: ThresholdRange::new(0.0, 1.0).unwrap(),
        };
        assert_eq!(filter_corpus(&job).unwrap().kept, 1);

        let written = fs::read_to_string(output.path().join("gene.fa")).unwrap();
        let headers: Vec<&str> = written.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(headers, vec![">x gene=cox1 [Homo sapiens]", ">y\tpartial cds"]);
    }

    #[test]
    fn test_check_resolves_base_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gene.fas"), ">x\nACGT\n>y\nACGA\n").unwrap();

        let outcome = check_alignment(
            &dir.path().join("gene"),
            &PolymorphicRate,
            ThresholdRange::at_least(0.2).unwrap(),
        )
        .unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.path, dir.path().join("gene.fas"));
        assert_eq!(report_path(&outcome.path), dir.path().join("gene.fas.log"));
    }
}
