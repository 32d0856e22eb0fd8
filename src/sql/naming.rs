//! Naming conventions for relation plumbing
//!
//! Pivot table names and polymorphic type names follow conventions that were
//! historically hard-coded; both are data-driven tables here so callers can
//! extend them.

use std::collections::HashMap;

/// Singularize an English table name
///
/// Deliberately minimal: `ies` -> `y`, a trailing `s` is dropped, `ss` stays.
/// Table naming in this engine is convention-driven, not linguistic.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }
    word.to_string()
}

/// Pivot table name resolution for many-to-many relations
///
/// The default convention is `<singular_left>_<right_table>`. Owners whose
/// pivot stem deviates from their singular name are registered in an override
/// table; the stock configuration carries `role` -> `role_has` so a
/// roles/permissions relation resolves to `role_has_permissions`.
#[derive(Debug, Clone)]
pub struct PivotNaming {
    stems: HashMap<String, String>,
}

impl Default for PivotNaming {
    fn default() -> Self {
        let mut stems = HashMap::new();
        stems.insert("role".to_string(), "role_has".to_string());
        Self { stems }
    }
}

impl PivotNaming {
    /// A naming table with no overrides
    pub fn bare() -> Self {
        Self {
            stems: HashMap::new(),
        }
    }

    /// Register a pivot stem override for a relation owner
    pub fn stem(mut self, singular: impl Into<String>, stem: impl Into<String>) -> Self {
        self.stems.insert(singular.into(), stem.into());
        self
    }

    /// Resolve the pivot table name for `singular_left` joined to `right_table`
    pub fn pivot_table(&self, singular_left: &str, right_table: &str) -> String {
        let stem = self
            .stems
            .get(singular_left)
            .map(String::as_str)
            .unwrap_or(singular_left);
        format!("{stem}_{right_table}")
    }
}

/// Closed lookup from a table name to its polymorphic type name
///
/// Used for `morphMany` relations, where the pivot stores the owning type in
/// a `model_type` column. An unregistered table is a configuration error,
/// surfaced by the relation resolver.
#[derive(Debug, Clone)]
pub struct MorphTypeMap {
    types: HashMap<String, String>,
}

impl Default for MorphTypeMap {
    fn default() -> Self {
        let mut types = HashMap::new();
        types.insert("users".to_string(), "User".to_string());
        Self { types }
    }
}

impl MorphTypeMap {
    /// A type map with no registrations
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a table -> type name mapping
    pub fn register(mut self, table: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.types.insert(table.into(), type_name.into());
        self
    }

    /// Resolve the type name for a table, if registered
    pub fn resolve(&self, table: &str) -> Option<&str> {
        self.types.get(table).map(String::as_str)
    }
}
