//! Alignment metrics behind one interface.
//!
//! Every filter works the same way: compute one scalar from an alignment,
//! then gate it with a [`ThresholdRange`]. Each metric implements [`Metric`]
//! so that the corpus pipeline and the single-file checks stay generic.

use crate::diversity::nucleotide_diversity;
use crate::dnds::Ng86;
use crate::genetic_code::GeneticCode;
use crate::model::Alignment;
use crate::sites::{polymorphic_rate, polymorphic_site_count};
use crate::threshold::{ThresholdError, ThresholdRange};

/// Domain of fractions.
pub const UNIT_DOMAIN: (f64, f64) = (0.0, 1.0);
/// Domain of non-negative quantities.
pub const NON_NEGATIVE_DOMAIN: (f64, f64) = (0.0, f64::INFINITY);

/// A scalar computed from an alignment.
pub trait Metric: Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Values the metric can take; thresholds must fall inside.
    fn domain(&self) -> (f64, f64);

    /// Computes the metric; `None` when it is undefined for this alignment.
    fn compute(&self, alignment: &Alignment) -> Option<f64>;

    /// Checks a threshold range against [`Metric::domain`].
    fn validate(&self, range: &ThresholdRange) -> Result<(), ThresholdError> {
        range.check_domain(self.name(), self.domain())
    }

    /// Extra per-file detail for the log line.
    fn describe(&self, alignment: &Alignment, value: Option<f64>) -> String {
        let value = match value {
            Some(v) => format!("{:.6}", v),
            None => "undefined".to_string(),
        };
        format!("{}: {}{}", self.name(), value, self.detail(alignment))
    }

    /// Additional context appended by [`Metric::describe`].
    fn detail(&self, _alignment: &Alignment) -> String {
        String::new()
    }
}

/// Fraction of polymorphic columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolymorphicRate;

impl Metric for PolymorphicRate {
    fn name(&self) -> &'static str {
        "polymorphic rate"
    }

    fn domain(&self) -> (f64, f64) {
        UNIT_DOMAIN
    }

    fn compute(&self, alignment: &Alignment) -> Option<f64> {
        Some(polymorphic_rate(alignment))
    }

    fn detail(&self, alignment: &Alignment) -> String {
        format!(
            " | Polymorphic sites: {} | Length: {}",
            polymorphic_site_count(alignment),
            alignment.length()
        )
    }
}

/// Number of polymorphic columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolymorphicSites;

impl Metric for PolymorphicSites {
    fn name(&self) -> &'static str {
        "polymorphic sites"
    }

    fn domain(&self) -> (f64, f64) {
        NON_NEGATIVE_DOMAIN
    }

    fn compute(&self, alignment: &Alignment) -> Option<f64> {
        Some(polymorphic_site_count(alignment) as f64)
    }

    fn detail(&self, alignment: &Alignment) -> String {
        format!(" | Length: {}", alignment.length())
    }
}

/// Nucleotide diversity π.
#[derive(Debug, Clone, Copy)]
pub struct NucleotideDiversity {
    pub ignore_gaps: bool,
}

impl Metric for NucleotideDiversity {
    fn name(&self) -> &'static str {
        "nucleotide diversity"
    }

    fn domain(&self) -> (f64, f64) {
        UNIT_DOMAIN
    }

    fn compute(&self, alignment: &Alignment) -> Option<f64> {
        nucleotide_diversity(alignment, self.ignore_gaps)
    }
}

/// Mean pairwise NG86 dN/dS.
#[derive(Debug, Clone)]
pub struct AverageDnds {
    estimator: Ng86,
    include_gaps: bool,
}

impl AverageDnds {
    pub fn new(code: GeneticCode, include_gaps: bool) -> Self {
        Self {
            estimator: Ng86::new(code),
            include_gaps,
        }
    }
}

impl Default for AverageDnds {
    fn default() -> Self {
        Self::new(GeneticCode::standard(), false)
    }
}

impl Metric for AverageDnds {
    fn name(&self) -> &'static str {
        "dN/dS"
    }

    fn domain(&self) -> (f64, f64) {
        NON_NEGATIVE_DOMAIN
    }

    fn compute(&self, alignment: &Alignment) -> Option<f64> {
        self.estimator.average_dnds(alignment, self.include_gaps)
    }
}
