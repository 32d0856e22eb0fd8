//! Query applicators
//!
//! Each applicator translates one slice of the normalized query input into
//! predicates, joins, or ordering on a [`crate::sql::SelectBuilder`]. The
//! driver composes them in a fixed order: filters, then search, then sort.

pub mod filters;
pub mod relation;
pub mod search;
pub mod sort;

pub use filters::apply_filters;
pub use relation::apply_relation;
pub use search::apply_search;
pub use sort::apply_sort;
