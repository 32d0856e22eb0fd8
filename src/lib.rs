//! # dynaquery
//!
//! A dynamic query construction and pagination engine for PostgreSQL.
//!
//! This crate turns normalized query input (field filters, relation filters,
//! free-text search, sorting) into parameterized SQL over registered entities,
//! and layers validated CRUD operations on top. Entities are declared as
//! metadata; no table-specific code is generated or required.
//!
//! ## Features
//!
//! - **Field Filters**: Equality, boolean, and date-range filtering with
//!   null/empty skipping
//! - **Relation Filters**: has-many, many-to-many (pivot join), and
//!   polymorphic many relations, declared as typed values
//! - **Free-Text Search**: Exact/partial/prefix/suffix matching over multiple
//!   fields with AND/OR combining
//! - **Sorting**: Direct column sorts plus `<relation>_count` aggregate sorts
//! - **Pagination**: Offset (with total), simple (next-only), and keyset
//!   cursor pagination with opaque cursors
//! - **Validated CRUD**: Create/update/delete with rule-based payload
//!   validation and unique-rule exclusion on updates
//! - **SQL Injection Prevention**: All identifiers are quoted and validated;
//!   all values are bound parameters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynaquery::{
//!     CrudStore, EntityMeta, EntityRegistry, FilterSet, QueryInput, RuleSet,
//!     SearchOptions, SortDirective,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/mydb").await?;
//!
//!     // Declare entities once, up front
//!     let registry = EntityRegistry::new().with(
//!         EntityMeta::new("Product", "products")
//!             .with_searchable(&["name", "sku"])
//!             .with_booleans(&["in_stock"])
//!             .with_rules(
//!                 RuleSet::new()
//!                     .rule("name", "required|unique:products")
//!                     .rule("sku", "string"),
//!             ),
//!     );
//!     let store = CrudStore::new(pool, registry);
//!
//!     // Create a record
//!     let data = serde_json::json!({"name": "Blue Widget", "sku": "WIDGET-001"});
//!     let product = store
//!         .create("Product", data.as_object().unwrap())
//!         .await?;
//!
//!     // Filtered, searched, sorted pagination
//!     let query = QueryInput::new()
//!         .with_filters(FilterSet::new().filter("in_stock", true))
//!         .with_search(SearchOptions::term("widget"))
//!         .with_sort(SortDirective::desc("created_at"));
//!     let page = store.paginate("Product", &query, 15, 1).await?;
//!     println!("{} of {} products", page.items.len(), page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Engine-wide settings live on [`EngineConfig`]:
//!
//! ```rust
//! use dynaquery::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .default_per_page(15)            // Page size when none is given
//!     .max_per_page(100)               // Hard page-size ceiling
//!     .pivot_stem("role", "role_has")  // Irregular pivot table stems
//!     .morph_type("users", "User")     // Polymorphic type names by table
//!     .build();
//! ```
//!
//! ## Drivers
//!
//! Reads go through the [`QueryDriver`] trait. [`PgQueryDriver`] is the
//! default; an alternate backend (a search index, a replica with a different
//! shape) plugs in via [`CrudStore::with_driver`].

pub mod apply;
pub mod config;
pub mod driver;
pub mod entity;
pub mod error;
pub mod page;
pub mod params;
pub mod record;
pub mod rules;
pub mod sql;
pub mod store;

// Re-export main types for convenience
pub use config::{EngineConfig, EngineConfigBuilder};
pub use driver::{PgQueryDriver, QueryDriver};
pub use entity::{EntityMeta, EntityRegistry, RelationDecl};
pub use error::{EngineError, Result};
pub use page::{Cursor, CursorPage, OffsetPage, SimplePage};
pub use params::{
    CombineLogic, FilterSet, MatchType, QueryInput, RelationFilter, SearchOptions, SortDirection,
    SortDirective,
};
pub use record::Record;
pub use rules::{update_unique_rules, BasicValidator, FieldErrors, RuleSet, Validator};
pub use store::{BulkOutcome, CrudStore};

// Re-export SQL utilities for advanced users
pub use sql::naming::{singularize, MorphTypeMap, PivotNaming};
pub use sql::sanitize::{quote_identifier, validate_identifier};
pub use sql::select::SelectBuilder;
