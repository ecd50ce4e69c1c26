//! Summary of degradations collected over one run.

use super::collection::{Degradation, DegradationKind};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct DegradationSummary {
    pub total: usize,
    pub by_kind: BTreeMap<DegradationKind, Vec<Option<PathBuf>>>,
}

impl DegradationSummary {
    pub fn from_degradations(degradations: &[Degradation]) -> Self {
        let mut by_kind: BTreeMap<DegradationKind, Vec<Option<PathBuf>>> = BTreeMap::new();
        for degradation in degradations {
            by_kind
                .entry(degradation.kind)
                .or_default()
                .push(degradation.path.clone());
        }

        Self {
            total: degradations.len(),
            by_kind,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str("\nDegraded operations:\n");

        for (kind, paths) in &self.by_kind {
            report.push_str(&format!("  {}: {}\n", kind.as_str(), paths.len()));

            // Show first few examples
            for path in paths.iter().flatten().take(3) {
                report.push_str(&format!("    - {}\n", path.display()));
            }

            let with_path = paths.iter().flatten().count();
            if with_path > 3 {
                report.push_str(&format!("    ... and {} more\n", with_path - 3));
            }
        }

        report
    }
}
