//! Query drivers
//!
//! [`QueryDriver`] is the pluggable contract for executing normalized query
//! input against some data source; [`PgQueryDriver`] is the PostgreSQL
//! implementation. Alternate sources (a search index, a read replica with a
//! different shape) implement the same trait and advertise what they handle
//! through `supports`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::apply::{apply_filters, apply_search, apply_sort};
use crate::config::EngineConfig;
use crate::entity::EntityMeta;
use crate::error::{EngineError, Result};
use crate::page::{Cursor, CursorPage, OffsetPage, SimplePage};
use crate::params::{FilterSet, QueryInput, SearchOptions, SortDirection, SortDirective};
use crate::record::Record;
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::sql::select::{bind_json, SelectBuilder};

/// Pluggable driver contract for executing queries
///
/// Exactly one driver handles a given request; selection is the caller's
/// concern, typically by probing `supports` at wiring time.
#[async_trait]
pub trait QueryDriver: Send + Sync {
    /// Stable driver name, for diagnostics
    fn name(&self) -> &'static str;

    /// Whether this driver can serve queries for the entity
    fn supports(&self, entity: &EntityMeta) -> bool;

    /// Offset pagination with a total count
    async fn paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<OffsetPage>;

    /// Next-only pagination; skips the count query
    async fn simple_paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<SimplePage>;

    /// Keyset pagination over the sort field (primary key by default)
    async fn cursor_paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        cursor: Option<&str>,
    ) -> Result<CursorPage>;

    /// Unpaginated filtered full-text query
    async fn search(
        &self,
        entity: &EntityMeta,
        term: &str,
        fields: &[String],
        filters: &FilterSet,
    ) -> Result<Vec<Record>>;

    /// All rows matching the filters
    async fn all(&self, entity: &EntityMeta, filters: &FilterSet) -> Result<Vec<Record>>;
}

/// Compose the applicators in their fixed order: filters, search, sort
pub(crate) fn compose_query(
    entity: &EntityMeta,
    query: &QueryInput,
    config: &EngineConfig,
) -> Result<SelectBuilder> {
    let mut builder = SelectBuilder::new(entity.table());
    apply_filters(&mut builder, entity, &query.filters, config)?;
    apply_search(&mut builder, entity, &query.search)?;
    apply_sort(&mut builder, entity, query.sort.as_ref())?;
    Ok(builder)
}

/// PostgreSQL query driver
pub struct PgQueryDriver {
    pool: PgPool,
    config: Arc<EngineConfig>,
}

impl PgQueryDriver {
    pub fn new(pool: PgPool, config: Arc<EngineConfig>) -> Self {
        Self { pool, config }
    }

    fn clamp_per_page(&self, per_page: i64) -> i64 {
        if per_page <= 0 {
            self.config.default_per_page
        } else {
            per_page.min(self.config.max_per_page)
        }
    }

    async fn fetch_records(&self, builder: &SelectBuilder) -> Result<Vec<Record>> {
        let sql = builder.row_sql();
        debug!(sql = %sql, params = builder.params().len(), "executing select");

        let mut query = sqlx::query(&sql);
        for param in builder.params() {
            query = bind_json(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(Record::from_row).collect()
    }

    async fn fetch_count(&self, builder: &SelectBuilder) -> Result<i64> {
        let sql = builder.count_sql();
        debug!(sql = %sql, "executing count");

        // Same bind path as the row query so params keep their wire types
        let mut query = sqlx::query(&sql);
        for param in builder.params() {
            query = bind_json(query, param);
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// The keyset field and direction for cursor pagination
    ///
    /// Aggregate `<relation>_count` sorts cannot be keyed, so they fall back
    /// to the primary key.
    fn cursor_key(entity: &EntityMeta, sort: Option<&SortDirective>) -> (String, SortDirection) {
        match sort {
            Some(directive) => {
                let is_aggregate = directive
                    .field
                    .strip_suffix("_count")
                    .is_some_and(|name| entity.relation(name).is_some());
                if is_aggregate {
                    (entity.primary_key().to_string(), directive.direction)
                } else {
                    (directive.field.clone(), directive.direction)
                }
            }
            None => (entity.primary_key().to_string(), SortDirection::Asc),
        }
    }

    /// ORDER BY part for a keyset scan
    ///
    /// The keyset predicate compares under `::text`, so the ordering must use
    /// the same collation or pages drift across cursor boundaries.
    fn keyset_order(field: &str, descending: bool) -> String {
        format!(
            "{}::text {}",
            quote_identifier(field),
            if descending { "DESC" } else { "ASC" }
        )
    }
}

#[async_trait]
impl QueryDriver for PgQueryDriver {
    fn name(&self) -> &'static str {
        "database"
    }

    fn supports(&self, entity: &EntityMeta) -> bool {
        !entity.table().is_empty()
    }

    async fn paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<OffsetPage> {
        let per_page = self.clamp_per_page(per_page);
        let page = page.max(1);

        let mut builder = compose_query(entity, query, &self.config)?;
        let total = self.fetch_count(&builder).await?;

        builder.limit(per_page);
        builder.offset((page - 1) * per_page);
        let items = self.fetch_records(&builder).await?;

        Ok(OffsetPage {
            items,
            total,
            per_page,
            current_page: page,
        })
    }

    async fn simple_paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        page: i64,
    ) -> Result<SimplePage> {
        let per_page = self.clamp_per_page(per_page);
        let page = page.max(1);

        let mut builder = compose_query(entity, query, &self.config)?;
        // One extra row answers has_more without a count query
        builder.limit(per_page + 1);
        builder.offset((page - 1) * per_page);

        let mut items = self.fetch_records(&builder).await?;
        let has_more = items.len() as i64 > per_page;
        items.truncate(per_page as usize);

        Ok(SimplePage {
            items,
            per_page,
            current_page: page,
            has_more,
        })
    }

    async fn cursor_paginate(
        &self,
        entity: &EntityMeta,
        query: &QueryInput,
        per_page: i64,
        cursor: Option<&str>,
    ) -> Result<CursorPage> {
        let per_page = self.clamp_per_page(per_page);
        let (key_field, direction) = Self::cursor_key(entity, query.sort.as_ref());
        validate_identifier(&key_field)?;

        let cursor = cursor.map(Cursor::decode).transpose()?;
        if let Some(cursor) = &cursor {
            // A cursor minted under one sort cannot seed a different keyset
            if cursor.field != key_field {
                return Err(EngineError::InvalidCursor(format!(
                    "cursor keyed on {}, query orders on {key_field}",
                    cursor.field
                )));
            }
        }
        let paging_back = cursor.as_ref().is_some_and(|c| c.before);
        let descending = matches!(direction, SortDirection::Desc);

        let mut builder = SelectBuilder::new(entity.table());
        apply_filters(&mut builder, entity, &query.filters, &self.config)?;
        apply_search(&mut builder, entity, &query.search)?;

        if let Some(cursor) = &cursor {
            let comparison = match (descending, cursor.before) {
                (false, false) | (true, true) => ">",
                (false, true) | (true, false) => "<",
            };
            let p = builder.bind(cursor.value.clone());
            builder.and_where(format!(
                "{}::text {comparison} {p}::text",
                quote_identifier(&key_field)
            ));
        }

        // Paging backwards flips the scan order; the page is re-reversed below
        let scan_descending = descending ^ paging_back;
        builder.order_by(Self::keyset_order(&key_field, scan_descending));
        builder.limit(per_page + 1);

        let mut items = self.fetch_records(&builder).await?;
        let has_more = items.len() as i64 > per_page;
        items.truncate(per_page as usize);
        if paging_back {
            items.reverse();
        }

        let key_of = |record: &Record| record.get(&key_field).cloned();
        let first_key = items.first().and_then(&key_of);
        let last_key = items.last().and_then(&key_of);

        let (next_cursor, prev_cursor) = if paging_back {
            // Rows after this page are where we came from
            (
                last_key.map(|v| Cursor::after(&key_field, v).encode()),
                if has_more {
                    first_key.map(|v| Cursor::before(&key_field, v).encode())
                } else {
                    None
                },
            )
        } else {
            (
                if has_more {
                    last_key.map(|v| Cursor::after(&key_field, v).encode())
                } else {
                    None
                },
                if cursor.is_some() {
                    first_key.map(|v| Cursor::before(&key_field, v).encode())
                } else {
                    None
                },
            )
        };

        Ok(CursorPage {
            items,
            per_page,
            next_cursor,
            prev_cursor,
        })
    }

    async fn search(
        &self,
        entity: &EntityMeta,
        term: &str,
        fields: &[String],
        filters: &FilterSet,
    ) -> Result<Vec<Record>> {
        let mut builder = SelectBuilder::new(entity.table());
        apply_filters(&mut builder, entity, filters, &self.config)?;
        apply_search(
            &mut builder,
            entity,
            &SearchOptions::term(term).with_fields(fields.to_vec()),
        )?;
        self.fetch_records(&builder).await
    }

    async fn all(&self, entity: &EntityMeta, filters: &FilterSet) -> Result<Vec<Record>> {
        let mut builder = SelectBuilder::new(entity.table());
        apply_filters(&mut builder, entity, filters, &self.config)?;
        self.fetch_records(&builder).await
    }
}
