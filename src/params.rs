//! Query parameter types
//!
//! These are the normalized inputs handed to the query driver: field filters,
//! an optional relation filter, free-text search options, and a sort
//! directive. A transport layer (HTTP, RPC) is expected to parse raw payloads
//! into these shapes before calling the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};

/// Ordered field filters plus an optional relation filter
///
/// Fields keep insertion order so generated SQL is deterministic. Unknown
/// field names pass through as equality predicates; schema-level validation
/// belongs to the entity's declared rules, not this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    fields: Vec<(String, Value)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relation: Option<RelationFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field filter; arrays on declared date fields become ranges
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// Attach a relation filter
    pub fn with_relation(mut self, relation: RelationFilter) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn relation(&self) -> Option<&RelationFilter> {
        self.relation.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.relation.is_none()
    }
}

/// Relation filter for constraining a query through an association
///
/// Each variant carries the owning (left) table, the queried (right) table,
/// and the anchor id of the owning row. The typed constructors are preferred;
/// [`RelationFilter::parse`] accepts the legacy string descriptor
/// `left.kind.right.anchor` for callers still carrying that encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RelationFilter {
    HasMany {
        left_table: String,
        right_table: String,
        anchor_id: String,
    },
    ManyToMany {
        left_table: String,
        right_table: String,
        anchor_id: String,
    },
    MorphMany {
        left_table: String,
        right_table: String,
        anchor_id: String,
    },
}

impl RelationFilter {
    pub fn has_many(
        left_table: impl Into<String>,
        right_table: impl Into<String>,
        anchor_id: impl Into<String>,
    ) -> Self {
        Self::HasMany {
            left_table: left_table.into(),
            right_table: right_table.into(),
            anchor_id: anchor_id.into(),
        }
    }

    pub fn many_to_many(
        left_table: impl Into<String>,
        right_table: impl Into<String>,
        anchor_id: impl Into<String>,
    ) -> Self {
        Self::ManyToMany {
            left_table: left_table.into(),
            right_table: right_table.into(),
            anchor_id: anchor_id.into(),
        }
    }

    pub fn morph_many(
        left_table: impl Into<String>,
        right_table: impl Into<String>,
        anchor_id: impl Into<String>,
    ) -> Self {
        Self::MorphMany {
            left_table: left_table.into(),
            right_table: right_table.into(),
            anchor_id: anchor_id.into(),
        }
    }

    /// Parse a legacy `left.kind.right.anchor` descriptor
    ///
    /// Fails fast on anything that is not exactly four non-empty segments
    /// with a known relation kind.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let parts: Vec<&str> = descriptor.split('.').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(EngineError::malformed_relation(descriptor));
        }

        let (left, kind, right, anchor) = (parts[0], parts[1], parts[2], parts[3]);
        match kind {
            "hasMany" => Ok(Self::has_many(left, right, anchor)),
            "manyToMany" => Ok(Self::many_to_many(left, right, anchor)),
            "morphMany" => Ok(Self::morph_many(left, right, anchor)),
            _ => Err(EngineError::malformed_relation(descriptor)),
        }
    }
}

/// Strategy for locating a search token within a field value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    #[default]
    Partial,
    StartsWith,
    EndsWith,
}

/// How predicates for multiple field/token pairs combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineLogic {
    And,
    #[default]
    Or,
}

/// Free-text search options
///
/// An empty term makes the whole search a no-op. Empty `fields` fall back to
/// the entity's declared searchable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, rename = "matchType")]
    pub match_type: MatchType,
    #[serde(default, rename = "caseSensitive")]
    pub case_sensitive: bool,
    #[serde(default, rename = "wordMatching")]
    pub word_matching: bool,
    #[serde(default, rename = "combineLogic")]
    pub combine_logic: CombineLogic,
}

impl SearchOptions {
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_word_matching(mut self, word_matching: bool) -> Self {
        self.word_matching = word_matching;
        self
    }

    pub fn with_combine_logic(mut self, combine_logic: CombineLogic) -> Self {
        self.combine_logic = combine_logic;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort directive
///
/// A field of the form `<relation>_count` asks for a count-aggregate
/// projection when the entity declares a relation of that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// The full normalized query input handed to a driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub search: SearchOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirective>,
}

impl QueryInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // FilterSet Tests
    // =========================================================================

    #[test]
    fn test_filter_set_preserves_order() {
        let filters = FilterSet::new()
            .filter("b", "two")
            .filter("a", "one")
            .filter("c", 3);

        let keys: Vec<&str> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_filter_set_empty() {
        assert!(FilterSet::new().is_empty());
        assert!(!FilterSet::new().filter("a", 1).is_empty());
        assert!(!FilterSet::new()
            .with_relation(RelationFilter::has_many("posts", "comments", "1"))
            .is_empty());
    }

    // =========================================================================
    // RelationFilter Tests
    // =========================================================================

    #[test]
    fn test_parse_has_many() {
        let rel = RelationFilter::parse("users.hasMany.posts.7").unwrap();
        assert_eq!(rel, RelationFilter::has_many("users", "posts", "7"));
    }

    #[test]
    fn test_parse_many_to_many() {
        let rel = RelationFilter::parse("posts.manyToMany.tags.5").unwrap();
        assert_eq!(rel, RelationFilter::many_to_many("posts", "tags", "5"));
    }

    #[test]
    fn test_parse_morph_many() {
        let rel = RelationFilter::parse("users.morphMany.images.3").unwrap();
        assert_eq!(rel, RelationFilter::morph_many("users", "images", "3"));
    }

    #[test]
    fn test_parse_too_few_segments() {
        let err = RelationFilter::parse("users.hasMany.posts").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedRelationDescriptor(_)
        ));
    }

    #[test]
    fn test_parse_empty_segment() {
        assert!(RelationFilter::parse("users..posts.7").is_err());
        assert!(RelationFilter::parse(".hasMany.posts.7").is_err());
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = RelationFilter::parse("users.belongsTo.posts.7").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedRelationDescriptor(_)
        ));
    }

    // =========================================================================
    // SearchOptions / SortDirective Tests
    // =========================================================================

    #[test]
    fn test_search_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.match_type, MatchType::Partial);
        assert_eq!(options.combine_logic, CombineLogic::Or);
        assert!(!options.case_sensitive);
        assert!(options.is_empty());
    }

    #[test]
    fn test_search_whitespace_term_is_empty() {
        assert!(SearchOptions::term("   ").is_empty());
        assert!(!SearchOptions::term("x").is_empty());
    }

    #[test]
    fn test_search_options_deserialize_renames() {
        let options: SearchOptions = serde_json::from_value(json!({
            "term": "widget",
            "matchType": "starts_with",
            "combineLogic": "and",
            "caseSensitive": true
        }))
        .unwrap();

        assert_eq!(options.match_type, MatchType::StartsWith);
        assert_eq!(options.combine_logic, CombineLogic::And);
        assert!(options.case_sensitive);
    }

    #[test]
    fn test_sort_constructors() {
        assert_eq!(SortDirective::asc("id").direction, SortDirection::Asc);
        assert_eq!(SortDirective::desc("name").direction, SortDirection::Desc);
        assert_eq!(SortDirection::Desc.keyword(), "DESC");
    }
}
