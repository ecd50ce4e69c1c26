use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Sentinel identity for uncommitted working-tree state.
pub const WORKING_TREE: &str = "WORKING_TREE";

/// Opaque identity of a point in version-control history.
///
/// Compared by equality only; revision ids carry no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn working_tree() -> Self {
        Self(WORKING_TREE.to_string())
    }

    pub fn is_working_tree(&self) -> bool {
        self.0 == WORKING_TREE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 10 characters).
    pub fn short(&self) -> &str {
        self.0.get(..10).unwrap_or(&self.0)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The set of files that differ between two repository states.
///
/// Built once per incremental request and never mutated afterwards;
/// [`ChangeSetInfo::with_trends`] returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetInfo {
    base_revision: Option<RevisionId>,
    current_revision: Option<RevisionId>,
    changed_files: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trends: Option<BTreeMap<String, f64>>,
}

impl ChangeSetInfo {
    pub fn new(
        base_revision: Option<RevisionId>,
        current_revision: Option<RevisionId>,
        changed_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            base_revision,
            current_revision,
            changed_files,
            trends: None,
        }
    }

    /// Degraded result: no history to diff against.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_trends(self, trends: BTreeMap<String, f64>) -> Self {
        Self {
            trends: Some(trends),
            ..self
        }
    }

    pub fn base_revision(&self) -> Option<&RevisionId> {
        self.base_revision.as_ref()
    }

    pub fn current_revision(&self) -> Option<&RevisionId> {
        self.current_revision.as_ref()
    }

    pub fn changed_files(&self) -> &[PathBuf] {
        &self.changed_files
    }

    pub fn trends(&self) -> Option<&BTreeMap<String, f64>> {
        self.trends.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_tree_sentinel() {
        assert!(RevisionId::working_tree().is_working_tree());
        assert!(!RevisionId::new("a1b2c3").is_working_tree());
    }

    #[test]
    fn test_short_revision() {
        let rev = RevisionId::new("0123456789abcdef");
        assert_eq!(rev.short(), "0123456789");
        assert_eq!(RevisionId::new("abc").short(), "abc");
    }

    #[test]
    fn test_with_trends_leaves_rest_untouched() {
        let info = ChangeSetInfo::new(
            Some("base".into()),
            Some("head".into()),
            vec![PathBuf::from("src/lib.rs")],
        );
        let mut trends = BTreeMap::new();
        trends.insert("coverage_trend".to_string(), 1.5);

        let annotated = info.clone().with_trends(trends);
        assert_eq!(annotated.changed_files(), info.changed_files());
        assert_eq!(annotated.base_revision(), info.base_revision());
        assert_eq!(annotated.trends().unwrap()["coverage_trend"], 1.5);
        assert!(info.trends().is_none());
    }

    #[test]
    fn test_empty_has_no_revisions() {
        let info = ChangeSetInfo::empty();
        assert!(info.is_empty());
        assert!(info.base_revision().is_none());
        assert!(info.current_revision().is_none());
    }
}
