//! CRUD orchestrator
//!
//! [`CrudStore`] is the high-level entry point. It resolves entity names
//! through the registry, validates mutation payloads, executes writes against
//! the pool, and hands read paths to the configured [`QueryDriver`]. The
//! driver and validator are injected, with PostgreSQL and the built-in
//! required-rule validator as defaults.

use std::sync::Arc;

use serde_json::{Map, Value};
use sqlx::postgres::Postgres;
use sqlx::{Executor, PgPool};
use tracing::debug;

use crate::config::EngineConfig;
use crate::driver::{PgQueryDriver, QueryDriver};
use crate::entity::{EntityMeta, EntityRegistry};
use crate::error::{EngineError, Result};
use crate::page::{CursorPage, OffsetPage, SimplePage};
use crate::params::{FilterSet, QueryInput};
use crate::record::Record;
use crate::rules::{update_unique_rules, BasicValidator, Validator};
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::sql::select::bind_json;

/// Rows scanned per batch when clearing a table
const DELETE_BATCH: i64 = 500;

/// Per-item accounting for a bulk update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Items received
    pub attempted: usize,
    /// Items whose row was changed
    pub updated: usize,
    /// Items skipped: missing key, missing row, or nothing to set
    pub skipped: usize,
}

/// High-level CRUD and query entry point
pub struct CrudStore {
    pool: PgPool,
    registry: EntityRegistry,
    driver: Arc<dyn QueryDriver>,
    validator: Arc<dyn Validator>,
    config: Arc<EngineConfig>,
}

impl CrudStore {
    /// Create a store with the default configuration
    pub fn new(pool: PgPool, registry: EntityRegistry) -> Self {
        Self::with_config(pool, registry, EngineConfig::default())
    }

    pub fn with_config(pool: PgPool, registry: EntityRegistry, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let driver = Arc::new(PgQueryDriver::new(pool.clone(), Arc::clone(&config)));
        Self {
            pool,
            registry,
            driver,
            validator: Arc::new(BasicValidator),
            config,
        }
    }

    /// Replace the query driver
    pub fn with_driver(mut self, driver: Arc<dyn QueryDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Replace the payload validator
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn meta(&self, entity: &str) -> Result<Arc<EntityMeta>> {
        self.registry
            .get(entity)
            .ok_or_else(|| EngineError::unknown_entity(entity))
    }

    /// Run the entity's rules against the payload
    ///
    /// On updates the row's own value must not trip unique rules, so its id
    /// is spliced into them first.
    fn validate_data(
        &self,
        meta: &EntityMeta,
        data: &Map<String, Value>,
        exclude_id: Option<&str>,
    ) -> Result<Map<String, Value>> {
        let mut rules = meta.rules().clone();
        if let Some(id) = exclude_id {
            update_unique_rules(&mut rules, id);
        }
        self.validator
            .validate(data, &rules)
            .map_err(EngineError::Validation)
    }

    // =========================================================================
    // Single-record operations
    // =========================================================================

    /// Fetch one record by primary key
    pub async fn find(&self, entity: &str, id: &str) -> Result<Option<Record>> {
        let meta = self.meta(entity)?;
        let table = quote_identifier(meta.table());
        let sql = format!(
            "SELECT to_jsonb({table}.*) AS record FROM {table} WHERE {pk}::text = $1::text",
            pk = quote_identifier(meta.primary_key()),
        );
        debug!(entity, id, "find");

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Record::from_row).transpose()
    }

    /// Validate and insert a record, returning the stored row
    pub async fn create(&self, entity: &str, data: &Map<String, Value>) -> Result<Record> {
        let meta = self.meta(entity)?;
        let validated = self.validate_data(&meta, data, None)?;
        let table = quote_identifier(meta.table());

        let (sql, params) = if validated.is_empty() {
            (
                format!("INSERT INTO {table} DEFAULT VALUES RETURNING to_jsonb({table}.*) AS record"),
                Vec::new(),
            )
        } else {
            let mut columns = Vec::new();
            let mut placeholders = Vec::new();
            let mut params = Vec::new();
            for (field, value) in &validated {
                validate_identifier(field)?;
                columns.push(quote_identifier(field));
                params.push(value.clone());
                placeholders.push(format!("${}", params.len()));
            }
            (
                format!(
                    "INSERT INTO {table} ({}) VALUES ({}) RETURNING to_jsonb({table}.*) AS record",
                    columns.join(", "),
                    placeholders.join(", "),
                ),
                params,
            )
        };
        debug!(entity, sql = %sql, "create");

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = bind_json(query, param);
        }
        let row = query.fetch_one(&self.pool).await?;
        Record::from_row(&row)
    }

    /// Validate and update a record by primary key
    ///
    /// Returns whether the row was changed. A payload with nothing left after
    /// validation is a successful no-op.
    pub async fn update(&self, entity: &str, id: &str, data: &Map<String, Value>) -> Result<bool> {
        let meta = self.meta(entity)?;
        let validated = self.validate_data(&meta, data, Some(id))?;

        match Self::update_statement(&meta, id, &validated)? {
            Some((sql, params)) => {
                debug!(entity, id, sql = %sql, "update");
                let affected = execute(&self.pool, &sql, &params).await?;
                Ok(affected > 0)
            }
            None => Ok(true),
        }
    }

    /// Delete one record by primary key
    pub async fn delete(&self, entity: &str, id: &str) -> Result<bool> {
        let meta = self.meta(entity)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}::text = $1::text",
            quote_identifier(meta.table()),
            quote_identifier(meta.primary_key()),
        );
        debug!(entity, id, "delete");

        let affected = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(affected.rows_affected() > 0)
    }

    // =========================================================================
    // Bulk operations
    // =========================================================================

    /// Update many records in one transaction
    ///
    /// Signals batch completion: `true` once the transaction commits, even
    /// when every entry was skipped. See [`bulk_update_detailed`] for
    /// per-item accounting.
    ///
    /// [`bulk_update_detailed`]: Self::bulk_update_detailed
    pub async fn bulk_update(&self, entity: &str, items: &[Map<String, Value>]) -> Result<bool> {
        self.bulk_update_detailed(entity, items).await?;
        Ok(true)
    }

    /// Update many records in one transaction, with per-item accounting
    ///
    /// Items without a usable primary key value are skipped, as are items
    /// whose row no longer exists. Validation or database errors abort and
    /// roll back the whole batch.
    pub async fn bulk_update_detailed(
        &self,
        entity: &str,
        items: &[Map<String, Value>],
    ) -> Result<BulkOutcome> {
        let meta = self.meta(entity)?;
        let pk = meta.primary_key();
        let mut outcome = BulkOutcome {
            attempted: items.len(),
            ..Default::default()
        };

        let mut tx = self.pool.begin().await?;
        for item in items {
            let Some(id) = item.get(pk).and_then(id_text) else {
                outcome.skipped += 1;
                continue;
            };

            // The key addresses the row; it is not part of the SET list
            let mut data = item.clone();
            data.remove(pk);
            let validated = self.validate_data(&meta, &data, Some(&id))?;

            match Self::update_statement(&meta, &id, &validated)? {
                Some((sql, params)) => {
                    let affected = execute(&mut *tx, &sql, &params).await?;
                    if affected > 0 {
                        outcome.updated += 1;
                    } else {
                        outcome.skipped += 1;
                    }
                }
                None => outcome.skipped += 1,
            }
        }
        tx.commit().await?;

        debug!(
            entity,
            attempted = outcome.attempted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            "bulk update"
        );
        Ok(outcome)
    }

    /// Delete the records with the given primary keys
    ///
    /// An empty id list deletes nothing and reports `false`.
    pub async fn delete_some(&self, entity: &str, ids: &[String]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let meta = self.meta(entity)?;

        let placeholders: Vec<String> = (1..=ids.len()).map(|n| format!("${n}::text")).collect();
        let sql = format!(
            "DELETE FROM {} WHERE {}::text IN ({})",
            quote_identifier(meta.table()),
            quote_identifier(meta.primary_key()),
            placeholders.join(", "),
        );
        debug!(entity, count = ids.len(), "delete some");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.as_str());
        }
        let affected = query.execute(&self.pool).await?;
        Ok(affected.rows_affected() > 0)
    }

    /// Delete every record of the entity, in keyset batches
    ///
    /// Rows are removed one batch at a time so a large table never pins one
    /// long-running statement.
    pub async fn delete_all(&self, entity: &str) -> Result<bool> {
        let meta = self.meta(entity)?;
        let table = quote_identifier(meta.table());
        let pk = quote_identifier(meta.primary_key());

        let first_sql = format!(
            "SELECT {pk}::text FROM {table} ORDER BY {pk}::text ASC LIMIT {DELETE_BATCH}"
        );
        let next_sql = format!(
            "SELECT {pk}::text FROM {table} WHERE {pk}::text > $1::text \
             ORDER BY {pk}::text ASC LIMIT {DELETE_BATCH}"
        );
        let delete_sql = format!("DELETE FROM {table} WHERE {pk}::text = $1::text");

        let mut deleted: u64 = 0;
        let mut last_id: Option<String> = None;
        loop {
            let batch: Vec<(String,)> = match &last_id {
                Some(id) => {
                    sqlx::query_as(&next_sql)
                        .bind(id.as_str())
                        .fetch_all(&self.pool)
                        .await?
                }
                None => sqlx::query_as(&first_sql).fetch_all(&self.pool).await?,
            };
            if batch.is_empty() {
                break;
            }

            for (id,) in &batch {
                deleted += sqlx::query(&delete_sql)
                    .bind(id.as_str())
                    .execute(&self.pool)
                    .await?
                    .rows_affected();
            }
            last_id = batch.into_iter().next_back().map(|(id,)| id);
        }

        debug!(entity, deleted, "delete all");
        Ok(deleted > 0)
    }

    // =========================================================================
    // Query dispatch
    // =========================================================================

    /// Offset pagination with a total count
    pub async fn paginate(
        &self,
        entity: &str,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<OffsetPage> {
        let meta = self.meta(entity)?;
        self.driver.paginate(&meta, query, per_page, page).await
    }

    /// Next-only pagination without a count query
    pub async fn simple_paginate(
        &self,
        entity: &str,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<SimplePage> {
        let meta = self.meta(entity)?;
        self.driver
            .simple_paginate(&meta, query, per_page, page)
            .await
    }

    /// Keyset pagination from an opaque cursor
    pub async fn cursor_paginate(
        &self,
        entity: &str,
        query: &QueryInput,
        per_page: i64,
        cursor: Option<&str>,
    ) -> Result<CursorPage> {
        let meta = self.meta(entity)?;
        self.driver
            .cursor_paginate(&meta, query, per_page, cursor)
            .await
    }

    /// Unpaginated free-text search, optionally pre-filtered
    pub async fn search(
        &self,
        entity: &str,
        term: &str,
        fields: &[String],
        filters: &FilterSet,
    ) -> Result<Vec<Record>> {
        let meta = self.meta(entity)?;
        self.driver.search(&meta, term, fields, filters).await
    }

    /// All records matching the filters
    pub async fn all(&self, entity: &str, filters: &FilterSet) -> Result<Vec<Record>> {
        let meta = self.meta(entity)?;
        self.driver.all(&meta, filters).await
    }

    /// Build an UPDATE statement, or `None` when there is nothing to set
    fn update_statement(
        meta: &EntityMeta,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<Option<(String, Vec<Value>)>> {
        if data.is_empty() {
            return Ok(None);
        }

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (field, value) in data {
            validate_identifier(field)?;
            params.push(value.clone());
            assignments.push(format!("{} = ${}", quote_identifier(field), params.len()));
        }

        params.push(Value::String(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE {}::text = ${}::text",
            quote_identifier(meta.table()),
            assignments.join(", "),
            quote_identifier(meta.primary_key()),
            params.len(),
        );
        Ok(Some((sql, params)))
    }
}

/// Run a statement with its JSON parameters against any executor
async fn execute<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_json(query, param);
    }
    Ok(query.execute(executor).await?.rows_affected())
}

/// Primary-key text for a payload value; `None` when it cannot address a row
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
