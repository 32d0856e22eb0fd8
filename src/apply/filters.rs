//! Filter applicator
//!
//! Translates a [`FilterSet`] into AND-combined predicates on the builder,
//! then hands any relation filter to the relation resolver.

use serde_json::Value;

use crate::apply::relation::apply_relation;
use crate::config::EngineConfig;
use crate::entity::EntityMeta;
use crate::error::Result;
use crate::params::FilterSet;
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::sql::select::SelectBuilder;

/// Permissive boolean coercion for filter values
///
/// Accepts real booleans, nonzero numbers, and the usual string spellings
/// (`true`, `1`, `yes`, `on`, case-insensitive); everything else is false.
pub fn parse_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

/// Apply field filters and the optional relation filter
///
/// - null and empty-string values are skipped
/// - declared boolean fields emit `"col" IS TRUE|FALSE` literals, never a
///   string comparison
/// - declared date fields with array values: `[a, b]` is an inclusive
///   BETWEEN; `[a]` is equality on the start bound. A single upper bound
///   alone is not supported.
/// - everything else is a bound equality predicate
pub fn apply_filters(
    builder: &mut SelectBuilder,
    entity: &EntityMeta,
    filters: &FilterSet,
    config: &EngineConfig,
) -> Result<()> {
    for (key, value) in filters.iter() {
        if value.is_null() {
            continue;
        }
        if matches!(value, Value::String(s) if s.is_empty()) {
            continue;
        }

        validate_identifier(key)?;
        let column = quote_identifier(key);

        if entity.is_boolean_field(key) {
            let literal = if parse_bool(value) { "TRUE" } else { "FALSE" };
            builder.and_where(format!("{column} IS {literal}"));
        } else if let (true, Value::Array(bounds)) = (entity.is_date_field(key), value) {
            match (bounds.first(), bounds.get(1)) {
                (Some(start), Some(end)) => {
                    let p1 = builder.bind(start.clone());
                    let p2 = builder.bind(end.clone());
                    builder.and_where(format!(
                        "{column}::text BETWEEN {p1}::text AND {p2}::text"
                    ));
                }
                (Some(start), None) => {
                    let p = builder.bind(start.clone());
                    builder.and_where(format!("{column}::text = {p}::text"));
                }
                _ => {}
            }
        } else {
            let p = builder.bind(value.clone());
            builder.and_where(format!("{column}::text = {p}::text"));
        }
    }

    if let Some(relation) = filters.relation() {
        apply_relation(builder, relation, config)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_entity() -> EntityMeta {
        EntityMeta::new("Post", "posts")
            .with_booleans(&["is_published", "is_featured"])
            .with_dates(&["created_at", "published_at"])
    }

    fn build(filters: FilterSet) -> SelectBuilder {
        let mut builder = SelectBuilder::new("posts");
        apply_filters(
            &mut builder,
            &post_entity(),
            &filters,
            &EngineConfig::default(),
        )
        .unwrap();
        builder
    }

    // =========================================================================
    // parse_bool Tests
    // =========================================================================

    #[test]
    fn test_parse_bool_permissive() {
        assert!(parse_bool(&json!(true)));
        assert!(parse_bool(&json!("true")));
        assert!(parse_bool(&json!("TRUE")));
        assert!(parse_bool(&json!("1")));
        assert!(parse_bool(&json!("yes")));
        assert!(parse_bool(&json!("on")));
        assert!(parse_bool(&json!(1)));

        assert!(!parse_bool(&json!(false)));
        assert!(!parse_bool(&json!("false")));
        assert!(!parse_bool(&json!("0")));
        assert!(!parse_bool(&json!("no")));
        assert!(!parse_bool(&json!("anything else")));
        assert!(!parse_bool(&json!(0)));
        assert!(!parse_bool(&json!(null)));
    }

    // =========================================================================
    // Boolean Field Tests
    // =========================================================================

    #[test]
    fn test_boolean_field_emits_is_true() {
        let builder = build(FilterSet::new().filter("is_published", "yes"));
        let sql = builder.row_sql();

        assert!(sql.contains("\"is_published\" IS TRUE"));
        // Never a string comparison, never a bound param
        assert!(builder.params().is_empty());
    }

    #[test]
    fn test_boolean_field_emits_is_false() {
        let builder = build(FilterSet::new().filter("is_featured", "0"));
        assert!(builder.row_sql().contains("\"is_featured\" IS FALSE"));
    }

    // =========================================================================
    // Date Field Tests
    // =========================================================================

    #[test]
    fn test_date_range_two_bounds() {
        let builder = build(
            FilterSet::new().filter("created_at", json!(["2026-01-01", "2026-01-31"])),
        );
        let sql = builder.row_sql();

        assert!(sql.contains("\"created_at\"::text BETWEEN $1::text AND $2::text"));
        assert_eq!(builder.params(), &[json!("2026-01-01"), json!("2026-01-31")]);
    }

    #[test]
    fn test_date_range_single_bound_is_equality() {
        // One element means equality on the start bound, not a one-sided range
        let builder = build(FilterSet::new().filter("published_at", json!(["2026-01-01"])));
        let sql = builder.row_sql();

        assert!(sql.contains("\"published_at\"::text = $1::text"));
        assert!(!sql.contains("BETWEEN"));
    }

    #[test]
    fn test_date_empty_array_skipped() {
        let builder = build(FilterSet::new().filter("created_at", json!([])));
        assert!(!builder.row_sql().contains("WHERE"));
    }

    #[test]
    fn test_non_date_array_is_equality() {
        let builder = build(FilterSet::new().filter("payload", json!([1, 2])));
        assert!(builder.row_sql().contains("\"payload\"::text = $1::text"));
    }

    // =========================================================================
    // Skip and Equality Tests
    // =========================================================================

    #[test]
    fn test_null_and_empty_values_skipped() {
        let builder = build(
            FilterSet::new()
                .filter("status", json!(null))
                .filter("category", ""),
        );
        assert!(!builder.row_sql().contains("WHERE"));
        assert!(builder.params().is_empty());
    }

    #[test]
    fn test_unknown_field_passes_through_as_equality() {
        let builder = build(FilterSet::new().filter("whatever", "x"));
        assert!(builder.row_sql().contains("\"whatever\"::text = $1::text"));
    }

    #[test]
    fn test_filters_and_combined_in_order() {
        let builder = build(
            FilterSet::new()
                .filter("status", "draft")
                .filter("author_id", 7),
        );
        let sql = builder.row_sql();

        assert!(sql.contains(
            "WHERE \"status\"::text = $1::text AND \"author_id\"::text = $2::text"
        ));
    }

    #[test]
    fn test_injection_in_field_name_rejected() {
        let mut builder = SelectBuilder::new("posts");
        let filters = FilterSet::new().filter("name; DROP TABLE posts", "x");
        assert!(apply_filters(
            &mut builder,
            &post_entity(),
            &filters,
            &EngineConfig::default()
        )
        .is_err());
    }
}
