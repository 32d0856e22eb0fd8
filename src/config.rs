//! Engine configuration
//!
//! Built once and shared; holds pagination limits plus the naming tables
//! used by the relation resolver.

use crate::sql::naming::{MorphTypeMap, PivotNaming};

/// Configuration for the query engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page size used when the caller passes a non-positive value
    pub default_per_page: i64,
    /// Upper bound on any requested page size
    pub max_per_page: i64,
    pivot_naming: PivotNaming,
    morph_types: MorphTypeMap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    pub fn pivot_naming(&self) -> &PivotNaming {
        &self.pivot_naming
    }

    pub fn morph_types(&self) -> &MorphTypeMap {
        &self.morph_types
    }
}

/// Builder for [`EngineConfig`]
#[derive(Debug)]
pub struct EngineConfigBuilder {
    default_per_page: i64,
    max_per_page: i64,
    pivot_naming: PivotNaming,
    morph_types: MorphTypeMap,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            default_per_page: 15,
            max_per_page: 100,
            pivot_naming: PivotNaming::default(),
            morph_types: MorphTypeMap::default(),
        }
    }

    /// Set the default page size (default: 15)
    pub fn default_per_page(mut self, per_page: i64) -> Self {
        self.default_per_page = per_page;
        self
    }

    /// Set the maximum page size (default: 100)
    pub fn max_per_page(mut self, per_page: i64) -> Self {
        self.max_per_page = per_page;
        self
    }

    /// Register a pivot-stem override for a many-to-many relation owner
    pub fn pivot_stem(mut self, singular: impl Into<String>, stem: impl Into<String>) -> Self {
        self.pivot_naming = self.pivot_naming.stem(singular, stem);
        self
    }

    /// Replace the pivot naming table entirely
    pub fn pivot_naming(mut self, naming: PivotNaming) -> Self {
        self.pivot_naming = naming;
        self
    }

    /// Register a polymorphic type mapping for a table
    pub fn morph_type(mut self, table: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.morph_types = self.morph_types.register(table, type_name);
        self
    }

    /// Replace the polymorphic type map entirely
    pub fn morph_types(mut self, types: MorphTypeMap) -> Self {
        self.morph_types = types;
        self
    }

    pub fn build(self) -> EngineConfig {
        EngineConfig {
            default_per_page: self.default_per_page,
            max_per_page: self.max_per_page,
            pivot_naming: self.pivot_naming,
            morph_types: self.morph_types,
        }
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
