//! Sort applicator
//!
//! Direct column ordering, with `<relation>_count` requesting a correlated
//! count projection over a declared relation.

use crate::entity::EntityMeta;
use crate::error::Result;
use crate::params::SortDirective;
use crate::sql::sanitize::{quote_identifier, quote_qualified, validate_identifier};
use crate::sql::select::SelectBuilder;

/// Apply the sort directive, defaulting to primary-key ascending
///
/// A field named `<relation>_count` for a declared relation adds a
/// `(SELECT COUNT(*) ...)` projection and orders by its alias. Undeclared
/// `_count` names fall back to a direct sort on the literal field name.
pub fn apply_sort(
    builder: &mut SelectBuilder,
    entity: &EntityMeta,
    sort: Option<&SortDirective>,
) -> Result<()> {
    let (field, direction) = match sort {
        Some(directive) => (directive.field.as_str(), directive.direction),
        None => (entity.primary_key(), Default::default()),
    };
    let keyword = direction.keyword();

    if let Some(relation_name) = field.strip_suffix("_count") {
        if let Some(relation) = entity.relation(relation_name) {
            validate_identifier(&relation.table)?;
            validate_identifier(&relation.foreign_key)?;

            let alias = quote_identifier(field);
            builder.select_expr(format!(
                "(SELECT COUNT(*) FROM {rel_table} WHERE {rel_fk} = {own_pk}) AS {alias}",
                rel_table = quote_identifier(&relation.table),
                rel_fk = quote_qualified(&relation.table, &relation.foreign_key),
                own_pk = quote_qualified(entity.table(), entity.primary_key()),
            ));
            builder.order_by(format!("{alias} {keyword}"));
            return Ok(());
        }
    }

    validate_identifier(field)?;
    builder.order_by(format!("{} {keyword}", quote_identifier(field)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RelationDecl;
    use crate::params::SortDirective;

    fn post_entity() -> EntityMeta {
        EntityMeta::new("Post", "posts")
            .with_relation(RelationDecl::new("comments", "comments", "post_id"))
    }

    fn build(sort: Option<SortDirective>) -> SelectBuilder {
        let mut builder = SelectBuilder::new("posts");
        apply_sort(&mut builder, &post_entity(), sort.as_ref()).unwrap();
        builder
    }

    #[test]
    fn test_default_sort_primary_key_asc() {
        let builder = build(None);
        assert!(builder.row_sql().ends_with("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn test_direct_field_desc() {
        let builder = build(Some(SortDirective::desc("title")));
        assert!(builder.row_sql().ends_with("ORDER BY \"title\" DESC"));
    }

    #[test]
    fn test_relation_count_adds_aggregate() {
        let builder = build(Some(SortDirective::desc("comments_count")));
        let sql = builder.row_sql();

        assert!(sql.contains(
            "(SELECT COUNT(*) FROM \"comments\" WHERE \"comments\".\"post_id\" = \"posts\".\"id\") AS \"comments_count\""
        ));
        assert!(sql.ends_with("ORDER BY \"comments_count\" DESC"));
    }

    #[test]
    fn test_undeclared_count_falls_back_to_literal_field() {
        // Lenient: no error, sort directly on the literal column name
        let builder = build(Some(SortDirective::asc("likes_count")));
        let sql = builder.row_sql();

        assert!(!sql.contains("SELECT COUNT(*)"));
        assert!(sql.ends_with("ORDER BY \"likes_count\" ASC"));
    }

    #[test]
    fn test_custom_primary_key_default() {
        let entity = EntityMeta::new("Sku", "skus").with_primary_key("sku_code");
        let mut builder = SelectBuilder::new("skus");
        apply_sort(&mut builder, &entity, None).unwrap();

        assert!(builder.row_sql().ends_with("ORDER BY \"sku_code\" ASC"));
    }

    #[test]
    fn test_invalid_sort_field_rejected() {
        let mut builder = SelectBuilder::new("posts");
        let directive = SortDirective::asc("id; --");
        assert!(apply_sort(&mut builder, &post_entity(), Some(&directive)).is_err());
    }
}
