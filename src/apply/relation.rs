//! Relation join resolver
//!
//! Expands a [`RelationFilter`] into the join/predicate pattern for its
//! relation kind. Pivot table names and polymorphic type names come from the
//! configuration's naming tables.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::params::RelationFilter;
use crate::sql::naming::singularize;
use crate::sql::sanitize::{quote_identifier, quote_qualified, validate_identifier};
use crate::sql::select::SelectBuilder;

/// Apply a relation filter to the builder
pub fn apply_relation(
    builder: &mut SelectBuilder,
    relation: &RelationFilter,
    config: &EngineConfig,
) -> Result<()> {
    match relation {
        RelationFilter::HasMany {
            left_table,
            right_table,
            anchor_id,
        } => {
            // Self-referential relations anchor on parent_id
            let column = if left_table == right_table {
                "parent_id".to_string()
            } else {
                format!("{}_id", singularize(left_table))
            };
            validate_identifier(&column)?;

            let p = builder.bind(Value::String(anchor_id.clone()));
            builder.and_where(format!(
                "{}::text = {p}::text",
                quote_identifier(&column)
            ));
        }

        RelationFilter::ManyToMany {
            left_table,
            right_table,
            anchor_id,
        } => {
            let left_singular = singularize(left_table);
            let pivot = config.pivot_naming().pivot_table(&left_singular, right_table);
            validate_identifier(&pivot)?;
            validate_identifier(right_table)?;

            join_pivot(builder, &pivot, right_table);

            let owner_column = format!("{left_singular}_id");
            let p = builder.bind(Value::String(anchor_id.clone()));
            builder.and_where(format!(
                "{}::text = {p}::text",
                quote_qualified(&pivot, &owner_column)
            ));
        }

        RelationFilter::MorphMany {
            left_table,
            right_table,
            anchor_id,
        } => {
            let pivot = format!("model_has_{right_table}");
            validate_identifier(&pivot)?;
            validate_identifier(right_table)?;

            let model_type = config
                .morph_types()
                .resolve(left_table)
                .ok_or_else(|| EngineError::unresolved_type(left_table.clone()))?
                .to_string();

            join_pivot(builder, &pivot, right_table);

            let p1 = builder.bind(Value::String(model_type));
            builder.and_where(format!(
                "{}::text = {p1}::text",
                quote_qualified(&pivot, "model_type")
            ));
            let p2 = builder.bind(Value::String(anchor_id.clone()));
            builder.and_where(format!(
                "{}::text = {p2}::text",
                quote_qualified(&pivot, "model_id")
            ));
        }
    }

    Ok(())
}

/// Join a pivot table against the queried (right) table's primary key
fn join_pivot(builder: &mut SelectBuilder, pivot: &str, right_table: &str) {
    let related_key = format!("{}_id", singularize(right_table));
    builder.join(format!(
        "JOIN {pivot_q} ON {right_id} = {pivot_key}",
        pivot_q = quote_identifier(pivot),
        right_id = quote_qualified(right_table, "id"),
        pivot_key = quote_qualified(pivot, &related_key),
    ));
}
