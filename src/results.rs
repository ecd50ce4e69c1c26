//! Analyzer result payloads.
//!
//! The engine treats results as opaque except for the handful of fields the
//! trend calculator reads. Those families get typed variants of
//! [`AnalyzerResult`]; anything else (memory-leak, infinite-loop, future
//! analyzers) travels as [`AnalyzerResult::Opaque`] JSON and is cached and
//! merged untouched.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Result of one analyzer for one run.
///
/// Serialized as `{"kind": ..., "data": ...}`. Anything that does not parse
/// as one of the typed families (an unknown `kind`, no tag at all, a typed
/// `kind` with a foreign shape) is kept verbatim as [`AnalyzerResult::Opaque`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AnalyzerResult {
    Coverage(CoverageResult),
    Duplication(DuplicationResult),
    UnusedCode(UnusedCodeResult),
    Dependencies(DependencyResult),
    Opaque(serde_json::Value),
}

/// Strict mirror of [`AnalyzerResult`]'s wire format.
#[derive(Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum TaggedResult {
    Coverage(CoverageResult),
    Duplication(DuplicationResult),
    UnusedCode(UnusedCodeResult),
    Dependencies(DependencyResult),
    Opaque(serde_json::Value),
}

impl From<TaggedResult> for AnalyzerResult {
    fn from(tagged: TaggedResult) -> Self {
        match tagged {
            TaggedResult::Coverage(c) => Self::Coverage(c),
            TaggedResult::Duplication(d) => Self::Duplication(d),
            TaggedResult::UnusedCode(u) => Self::UnusedCode(u),
            TaggedResult::Dependencies(d) => Self::Dependencies(d),
            TaggedResult::Opaque(value) => Self::Opaque(value),
        }
    }
}

impl<'de> Deserialize<'de> for AnalyzerResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match TaggedResult::deserialize(&value) {
            Ok(tagged) => Ok(tagged.into()),
            Err(e) => {
                log::debug!("Keeping uninterpreted analyzer result as opaque: {}", e);
                Ok(Self::Opaque(value))
            }
        }
    }
}

impl AnalyzerResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Coverage(_) => "coverage",
            Self::Duplication(_) => "duplication",
            Self::UnusedCode(_) => "unused_code",
            Self::Dependencies(_) => "dependencies",
            Self::Opaque(_) => "opaque",
        }
    }
}

/// Per-file coverage, keyed by project-relative path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub files: BTreeMap<String, FileCoverage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub line_coverage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_coverage: Option<f64>,
}

impl CoverageResult {
    /// Mean line coverage over all files; `None` when no file was measured.
    pub fn average_line_coverage(&self) -> Option<f64> {
        if self.files.is_empty() {
            return None;
        }
        let total: f64 = self.files.values().map(|f| f.line_coverage).sum();
        Some(total / self.files.len() as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationResult {
    pub duplication_rate: f64,
    #[serde(default)]
    pub duplicated_lines: usize,
    #[serde(default)]
    pub total_lines: usize,
    #[serde(default)]
    pub blocks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnusedCodeResult {
    pub unused_imports: usize,
    pub unused_variables: usize,
    pub unused_functions: usize,
    pub unused_classes: usize,
    pub unused_exports: usize,
    pub total_lines: usize,
}

impl UnusedCodeResult {
    pub fn unused_count(&self) -> usize {
        self.unused_imports
            + self.unused_variables
            + self.unused_functions
            + self.unused_classes
            + self.unused_exports
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyResult {
    /// Distinct modules in the dependency graph
    pub total_modules: usize,
    /// Each cycle as the ordered list of modules it passes through
    pub cycles: Vec<Vec<String>>,
}

impl DependencyResult {
    pub fn circular_count(&self) -> usize {
        self.cycles.len()
    }
}

/// Analyzer name → result for one whole analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResultSet {
    analyzers: BTreeMap<String, AnalyzerResult>,
}

impl AnalysisResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, analyzer: impl Into<String>, result: AnalyzerResult) {
        self.analyzers.insert(analyzer.into(), result);
    }

    pub fn with(mut self, analyzer: impl Into<String>, result: AnalyzerResult) -> Self {
        self.insert(analyzer, result);
        self
    }

    pub fn get(&self, analyzer: &str) -> Option<&AnalyzerResult> {
        self.analyzers.get(analyzer)
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnalyzerResult)> {
        self.analyzers.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Overlay `fresh` on top of `self`: analyzers present in `fresh` replace
    /// their cached counterpart, the rest are kept.
    pub fn merged_with(&self, fresh: &AnalysisResultSet) -> AnalysisResultSet {
        let mut analyzers = self.analyzers.clone();
        analyzers.extend(
            fresh
                .analyzers
                .iter()
                .map(|(name, result)| (name.clone(), result.clone())),
        );
        AnalysisResultSet { analyzers }
    }

    /// First coverage result, whatever the analyzer is called.
    pub fn coverage(&self) -> Option<&CoverageResult> {
        self.analyzers.values().find_map(|r| match r {
            AnalyzerResult::Coverage(c) => Some(c),
            _ => None,
        })
    }

    pub fn duplication(&self) -> Option<&DuplicationResult> {
        self.analyzers.values().find_map(|r| match r {
            AnalyzerResult::Duplication(d) => Some(d),
            _ => None,
        })
    }

    pub fn unused_code(&self) -> Option<&UnusedCodeResult> {
        self.analyzers.values().find_map(|r| match r {
            AnalyzerResult::UnusedCode(u) => Some(u),
            _ => None,
        })
    }

    pub fn dependencies(&self) -> Option<&DependencyResult> {
        self.analyzers.values().find_map(|r| match r {
            AnalyzerResult::Dependencies(d) => Some(d),
            _ => None,
        })
    }
}
