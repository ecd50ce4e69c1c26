//! Directional movement of aggregate metrics between two analysis runs.
//!
//! A metric family missing from either run is left out of the report rather
//! than reported as zero: "not computed" and "unchanged" must stay distinct.
//!
//! Ratios are computed per run against that run's own denominator, so the
//! unused-code and circular-dependency trends track density rather than raw
//! counts. A zero denominator is floored to 1 and the entry is flagged
//! `low_confidence`.

use crate::results::AnalysisResultSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deltas smaller than this are reported as [`TrendDirection::Stable`].
pub const STABLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Coverage,
    Duplication,
    UnusedCode,
    CircularDependencies,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 4] = [
        TrendMetric::Coverage,
        TrendMetric::Duplication,
        TrendMetric::UnusedCode,
        TrendMetric::CircularDependencies,
    ];

    /// Name used in `ChangeSetInfo::trends`
    pub fn key(&self) -> &'static str {
        match self {
            Self::Coverage => "coverage_trend",
            Self::Duplication => "duplication_trend",
            Self::UnusedCode => "unused_code_trend",
            Self::CircularDependencies => "circular_dependencies_trend",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Coverage => "Coverage",
            Self::Duplication => "Duplication",
            Self::UnusedCode => "Unused code",
            Self::CircularDependencies => "Circular dependencies",
        }
    }

    /// Only coverage improves by going up.
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Self::Coverage)
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Regressing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    pub baseline: f64,
    pub current: f64,
    pub delta: f64,
    /// A zero or missing denominator was floored to 1 on either side.
    pub low_confidence: bool,
}

impl TrendEntry {
    fn new(baseline: f64, current: f64, low_confidence: bool) -> Self {
        Self {
            baseline,
            current,
            delta: current - baseline,
            low_confidence,
        }
    }

    pub fn direction(&self, metric: TrendMetric) -> TrendDirection {
        if self.delta.abs() < STABLE_EPSILON {
            TrendDirection::Stable
        } else if (self.delta > 0.0) == metric.higher_is_better() {
            TrendDirection::Improving
        } else {
            TrendDirection::Regressing
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    entries: BTreeMap<TrendMetric, TrendEntry>,
}

impl TrendReport {
    pub fn get(&self, metric: TrendMetric) -> Option<&TrendEntry> {
        self.entries.get(&metric)
    }

    pub fn contains(&self, metric: TrendMetric) -> bool {
        self.entries.contains_key(&metric)
    }

    pub fn coverage_trend(&self) -> Option<f64> {
        self.delta(TrendMetric::Coverage)
    }

    pub fn duplication_trend(&self) -> Option<f64> {
        self.delta(TrendMetric::Duplication)
    }

    pub fn unused_code_trend(&self) -> Option<f64> {
        self.delta(TrendMetric::UnusedCode)
    }

    pub fn circular_dependencies_trend(&self) -> Option<f64> {
        self.delta(TrendMetric::CircularDependencies)
    }

    fn delta(&self, metric: TrendMetric) -> Option<f64> {
        self.entries.get(&metric).map(|e| e.delta)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrendMetric, &TrendEntry)> {
        self.entries.iter().map(|(metric, entry)| (*metric, entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `metric-name → delta`, the shape carried by `ChangeSetInfo`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(metric, entry)| (metric.key().to_string(), entry.delta))
            .collect()
    }
}

pub struct TrendCalculator;

impl TrendCalculator {
    pub fn diff(baseline: &AnalysisResultSet, current: &AnalysisResultSet) -> TrendReport {
        let entries = TrendMetric::ALL
            .iter()
            .filter_map(|metric| {
                Self::entry_for(*metric, baseline, current).map(|entry| (*metric, entry))
            })
            .collect();
        TrendReport { entries }
    }

    fn entry_for(
        metric: TrendMetric,
        baseline: &AnalysisResultSet,
        current: &AnalysisResultSet,
    ) -> Option<TrendEntry> {
        match metric {
            TrendMetric::Coverage => {
                let base = baseline.coverage()?.average_line_coverage()?;
                let curr = current.coverage()?.average_line_coverage()?;
                Some(TrendEntry::new(base, curr, false))
            }
            TrendMetric::Duplication => {
                let base = baseline.duplication()?.duplication_rate;
                let curr = current.duplication()?.duplication_rate;
                Some(TrendEntry::new(base, curr, false))
            }
            TrendMetric::UnusedCode => {
                let base = baseline.unused_code()?;
                let curr = current.unused_code()?;
                let (base_ratio, base_floored) = density(base.unused_count(), base.total_lines);
                let (curr_ratio, curr_floored) = density(curr.unused_count(), curr.total_lines);
                Some(TrendEntry::new(
                    base_ratio,
                    curr_ratio,
                    base_floored || curr_floored,
                ))
            }
            TrendMetric::CircularDependencies => {
                let base = baseline.dependencies()?;
                let curr = current.dependencies()?;
                let (base_ratio, base_floored) =
                    density(base.circular_count(), base.total_modules);
                let (curr_ratio, curr_floored) =
                    density(curr.circular_count(), curr.total_modules);
                Some(TrendEntry::new(
                    base_ratio,
                    curr_ratio,
                    base_floored || curr_floored,
                ))
            }
        }
    }
}

/// `count / denominator`, flooring a zero denominator to 1.
fn density(count: usize, denominator: usize) -> (f64, bool) {
    let floored = denominator == 0;
    (count as f64 / denominator.max(1) as f64, floored)
}
