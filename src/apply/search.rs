//! Search applicator
//!
//! Builds one predicate per (field, token) pair, combined with the requested
//! logic and wrapped in a single group so the whole search ANDs with any
//! field filters already on the builder.

use regex::Regex;
use serde_json::Value;

use crate::entity::EntityMeta;
use crate::error::Result;
use crate::params::{CombineLogic, MatchType, SearchOptions};
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::sql::select::SelectBuilder;

/// Apply free-text search options
///
/// The term splits into tokens on whitespace-adjacent-slash sequences
/// (`\s+/`), not plain whitespace: `"blue widget"` is one token, while
/// `"blue /widget"` is two. Empty terms are a no-op.
pub fn apply_search(
    builder: &mut SelectBuilder,
    entity: &EntityMeta,
    options: &SearchOptions,
) -> Result<()> {
    let term = options.term.trim();
    if term.is_empty() {
        return Ok(());
    }

    let splitter = Regex::new(r"\s+/").unwrap();
    let tokens: Vec<&str> = splitter.split(term).filter(|t| !t.is_empty()).collect();

    let fields: &[String] = if options.fields.is_empty() {
        entity.searchable_fields()
    } else {
        &options.fields
    };

    let mut parts = Vec::new();
    for field in fields {
        validate_identifier(field)?;
        let column = quote_identifier(field);

        for token in &tokens {
            let (operator, pattern) = match options.match_type {
                MatchType::Exact => ("=", (*token).to_string()),
                MatchType::StartsWith => ("LIKE", format!("{token}%")),
                MatchType::EndsWith => ("LIKE", format!("%{token}")),
                MatchType::Partial => ("LIKE", format!("%{token}%")),
            };

            let p = builder.bind(Value::String(pattern));
            let clause = if options.case_sensitive {
                format!("{column}::text {operator} {p}::text")
            } else {
                format!("LOWER({column}::text) {operator} LOWER({p}::text)")
            };
            parts.push(clause);
        }
    }

    if parts.is_empty() {
        return Ok(());
    }

    let glue = match options.combine_logic {
        CombineLogic::And => " AND ",
        CombineLogic::Or => " OR ",
    };
    builder.and_where(format!("({})", parts.join(glue)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_entity() -> EntityMeta {
        EntityMeta::new("Product", "products").with_searchable(&["name", "sku"])
    }

    fn build(options: SearchOptions) -> SelectBuilder {
        let mut builder = SelectBuilder::new("products");
        apply_search(&mut builder, &product_entity(), &options).unwrap();
        builder
    }

    #[test]
    fn test_empty_term_is_noop() {
        let builder = build(SearchOptions::term(""));
        assert!(!builder.row_sql().contains("WHERE"));

        let builder = build(SearchOptions::term("   "));
        assert!(!builder.row_sql().contains("WHERE"));
    }

    #[test]
    fn test_partial_match_both_side_wildcards() {
        let builder = build(SearchOptions::term("widget").with_fields(vec!["name".into()]));

        assert!(builder
            .row_sql()
            .contains("(LOWER(\"name\"::text) LIKE LOWER($1::text))"));
        assert_eq!(builder.params(), &[json!("%widget%")]);
    }

    #[test]
    fn test_starts_with_and_ends_with_wildcards() {
        let builder = build(
            SearchOptions::term("wid")
                .with_fields(vec!["name".into()])
                .with_match_type(MatchType::StartsWith),
        );
        assert_eq!(builder.params(), &[json!("wid%")]);

        let builder = build(
            SearchOptions::term("get")
                .with_fields(vec!["name".into()])
                .with_match_type(MatchType::EndsWith),
        );
        assert_eq!(builder.params(), &[json!("%get")]);
    }

    #[test]
    fn test_exact_match_case_sensitive() {
        let builder = build(
            SearchOptions::term("Widget")
                .with_fields(vec!["name".into()])
                .with_match_type(MatchType::Exact)
                .with_case_sensitive(true),
        );

        assert!(builder.row_sql().contains("(\"name\"::text = $1::text)"));
        assert_eq!(builder.params(), &[json!("Widget")]);
    }

    #[test]
    fn test_defaults_to_entity_searchable_fields() {
        let builder = build(SearchOptions::term("x"));
        let sql = builder.row_sql();

        assert!(sql.contains("\"name\""));
        assert!(sql.contains("\"sku\""));
        assert_eq!(builder.params().len(), 2);
    }

    #[test]
    fn test_or_combine_logic() {
        let builder = build(SearchOptions::term("x"));
        assert!(builder.row_sql().contains(" OR "));
        assert!(!builder.row_sql().contains(" AND "));
    }

    #[test]
    fn test_and_combine_logic_requires_all() {
        let builder = build(
            SearchOptions::term("x").with_combine_logic(CombineLogic::And),
        );
        assert!(builder.row_sql().contains(" AND "));
    }

    #[test]
    fn test_token_split_on_whitespace_slash() {
        // "blue /widget" splits; "blue widget" stays one token
        let builder = build(
            SearchOptions::term("blue /widget").with_fields(vec!["name".into()]),
        );
        assert_eq!(builder.params(), &[json!("%blue%"), json!("%widget%")]);

        let builder = build(
            SearchOptions::term("blue widget").with_fields(vec!["name".into()]),
        );
        assert_eq!(builder.params(), &[json!("%blue widget%")]);
    }

    #[test]
    fn test_group_wraps_for_and_with_filters() {
        let mut builder = SelectBuilder::new("products");
        let p = builder.bind(json!("active"));
        builder.and_where(format!("\"status\"::text = {p}::text"));

        apply_search(
            &mut builder,
            &product_entity(),
            &SearchOptions::term("x").with_fields(vec!["name".into()]),
        )
        .unwrap();

        let sql = builder.row_sql();
        assert!(sql.contains(
            "WHERE \"status\"::text = $1::text AND (LOWER(\"name\"::text) LIKE LOWER($2::text))"
        ));
    }

    #[test]
    fn test_bad_search_field_rejected() {
        let mut builder = SelectBuilder::new("products");
        let options = SearchOptions::term("x").with_fields(vec!["na me".into()]);
        assert!(apply_search(&mut builder, &product_entity(), &options).is_err());
    }
}
