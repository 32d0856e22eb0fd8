//! SQL assembly utilities
//!
//! - `sanitize`: identifier quoting and validation
//! - `naming`: pivot table and polymorphic type naming conventions
//! - `select`: the dynamic SELECT builder

pub mod naming;
pub mod sanitize;
pub mod select;

pub use naming::{singularize, MorphTypeMap, PivotNaming};
pub use sanitize::{quote_identifier, quote_qualified, validate_identifier};
pub use select::SelectBuilder;
