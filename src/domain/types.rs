//! Shared value types and normalization helpers.

use serde::{Deserialize, Serialize};

/// Who may see an image in aggregate views.
///
/// Serialized lowercase so backend documents and tag-index snapshots carry
/// `"public"` / `"private"` verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

/// Case-fold a tag for indexing and lookup.
///
/// The tag index is keyed by this form; callers may pass tags in any casing.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize a free-text search query before matching and cache keying.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_serializes_lowercase() {
        let json = serde_json::to_string(&Visibility::Private).expect("serialize");
        assert_eq!(json, "\"private\"");
        let parsed: Visibility = serde_json::from_str("\"public\"").expect("deserialize");
        assert!(parsed.is_public());
    }

    #[test]
    fn tag_normalization_folds_case_and_whitespace() {
        assert_eq!(normalize_tag("  Lion "), "lion");
        assert_eq!(normalize_tag("WILD"), "wild");
    }

    #[test]
    fn query_normalization_matches_tag_rules() {
        assert_eq!(normalize_query(" Sunset Beach "), "sunset beach");
    }
}
