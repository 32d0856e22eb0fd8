//! Dynamic SELECT assembly
//!
//! `SelectBuilder` accumulates predicates, joins, ordering, and bind
//! parameters, then renders the row query and a matching count query. Rows
//! are projected through `to_jsonb` so the engine needs no per-column type
//! catalog; callers get each row back as one JSON object.
//!
//! Placeholders are numbered in bind order; the count query shares the same
//! WHERE clause and parameter list, so placeholder numbering stays aligned
//! between the two statements.

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::sql::sanitize::quote_identifier;

/// Builder for one executable SELECT over a base table
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    selects: Vec<String>,
    joins: Vec<String>,
    predicates: Vec<String>,
    params: Vec<Value>,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            selects: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            params: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The unquoted base table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Push a bind parameter and return its placeholder (`$1`, `$2`, ...)
    pub fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    /// Add a predicate; all predicates are AND-combined
    pub fn and_where(&mut self, clause: impl Into<String>) {
        self.predicates.push(clause.into());
    }

    /// Add a complete JOIN fragment (including the `JOIN` keyword)
    pub fn join(&mut self, clause: impl Into<String>) {
        self.joins.push(clause.into());
    }

    /// Add an extra select expression alongside the row projection
    pub fn select_expr(&mut self, expr: impl Into<String>) {
        self.selects.push(expr.into());
    }

    /// Add an ORDER BY part (already quoted)
    pub fn order_by(&mut self, part: impl Into<String>) {
        self.order.push(part.into());
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    pub fn limit(&mut self, n: i64) {
        self.limit = Some(n);
    }

    pub fn offset(&mut self, n: i64) {
        self.offset = Some(n);
    }

    /// Bind parameters in placeholder order
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render the row query: `SELECT to_jsonb("t".*) AS record ... `
    pub fn row_sql(&self) -> String {
        let table = quote_identifier(&self.table);
        let mut sql = format!("SELECT to_jsonb({table}.*) AS record");

        for expr in &self.selects {
            sql.push_str(", ");
            sql.push_str(expr);
        }

        sql.push_str(&format!(" FROM {table}"));
        self.push_tail(&mut sql);

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Render the count query over the same joins and predicates
    pub fn count_sql(&self) -> String {
        let table = quote_identifier(&self.table);
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        self.push_tail(&mut sql);
        sql
    }

    fn push_tail(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }
    }
}

/// Bind a JSON value onto a query with its natural wire type
///
/// Strings, booleans, and numbers go over as their native Postgres types;
/// arrays and objects are bound as `jsonb`.
pub(crate) fn bind_json<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_select() {
        let builder = SelectBuilder::new("posts");
        assert_eq!(
            builder.row_sql(),
            "SELECT to_jsonb(\"posts\".*) AS record FROM \"posts\""
        );
        assert_eq!(builder.count_sql(), "SELECT COUNT(*) FROM \"posts\"");
    }

    #[test]
    fn test_bind_numbering() {
        let mut builder = SelectBuilder::new("posts");
        assert_eq!(builder.bind(json!("a")), "$1");
        assert_eq!(builder.bind(json!(2)), "$2");
        assert_eq!(builder.bind(json!(true)), "$3");
        assert_eq!(builder.params().len(), 3);
    }

    #[test]
    fn test_predicates_and_combined() {
        let mut builder = SelectBuilder::new("posts");
        let p1 = builder.bind(json!("draft"));
        builder.and_where(format!("\"status\"::text = {p1}::text"));
        builder.and_where("\"is_active\" IS TRUE");

        let sql = builder.row_sql();
        assert!(sql.contains(
            "WHERE \"status\"::text = $1::text AND \"is_active\" IS TRUE"
        ));
    }

    #[test]
    fn test_join_and_order_and_window() {
        let mut builder = SelectBuilder::new("tags");
        builder.join("JOIN \"post_tags\" ON \"tags\".\"id\" = \"post_tags\".\"tag_id\"");
        builder.order_by("\"id\" ASC");
        builder.limit(10);
        builder.offset(20);

        let sql = builder.row_sql();
        assert_eq!(
            sql,
            "SELECT to_jsonb(\"tags\".*) AS record FROM \"tags\" \
             JOIN \"post_tags\" ON \"tags\".\"id\" = \"post_tags\".\"tag_id\" \
             ORDER BY \"id\" ASC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_count_shares_where_but_not_window() {
        let mut builder = SelectBuilder::new("posts");
        let p1 = builder.bind(json!(5));
        builder.and_where(format!("\"author_id\"::text = {p1}::text"));
        builder.order_by("\"id\" DESC");
        builder.limit(10);

        let count = builder.count_sql();
        assert_eq!(
            count,
            "SELECT COUNT(*) FROM \"posts\" WHERE \"author_id\"::text = $1::text"
        );
        assert!(!count.contains("ORDER BY"));
        assert!(!count.contains("LIMIT"));
    }

    #[test]
    fn test_extra_select_expressions() {
        let mut builder = SelectBuilder::new("posts");
        builder.select_expr("(SELECT COUNT(*) FROM \"comments\") AS \"comments_count\"");

        let sql = builder.row_sql();
        assert!(sql.starts_with(
            "SELECT to_jsonb(\"posts\".*) AS record, (SELECT COUNT(*) FROM \"comments\") AS \"comments_count\" FROM"
        ));
        // Aggregate projections never leak into the count query
        assert_eq!(builder.count_sql(), "SELECT COUNT(*) FROM \"posts\"");
    }
}
