//! Queryable entity metadata
//!
//! An entity declares everything the engine needs to build queries against
//! its table: primary key, searchable fields, boolean and date field sets,
//! countable relations, and its validation rule set. Entities are registered
//! once and looked up by stable name on every call; the engine never mutates
//! a registered entity.

use std::collections::HashMap;
use std::sync::Arc;

use crate::rules::RuleSet;

/// A declared relation, used for `<name>_count` sorting
#[derive(Debug, Clone)]
pub struct RelationDecl {
    pub name: String,
    pub table: String,
    pub foreign_key: String,
}

impl RelationDecl {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// Schema metadata for one queryable entity
#[derive(Debug, Clone)]
pub struct EntityMeta {
    name: String,
    table: String,
    primary_key: String,
    searchable_fields: Vec<String>,
    boolean_fields: Vec<String>,
    date_fields: Vec<String>,
    relations: Vec<RelationDecl>,
    rules: RuleSet,
}

impl EntityMeta {
    /// Declare an entity backed by `table`, with an `id` primary key
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            searchable_fields: Vec::new(),
            boolean_fields: Vec::new(),
            date_fields: Vec::new(),
            relations: Vec::new(),
            rules: RuleSet::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_searchable(mut self, fields: &[&str]) -> Self {
        self.searchable_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_booleans(mut self, fields: &[&str]) -> Self {
        self.boolean_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_dates(mut self, fields: &[&str]) -> Self {
        self.date_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_relation(mut self, relation: RelationDecl) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    pub fn is_boolean_field(&self, field: &str) -> bool {
        self.boolean_fields.iter().any(|f| f == field)
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.iter().any(|f| f == field)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDecl> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// Registry of queryable entities, keyed by stable entity name
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, Arc<EntityMeta>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, replacing any previous registration of that name
    pub fn with(mut self, meta: EntityMeta) -> Self {
        self.register(meta);
        self
    }

    pub fn register(&mut self, meta: EntityMeta) {
        self.entities.insert(meta.name().to_string(), Arc::new(meta));
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityMeta>> {
        self.entities.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_entity() -> EntityMeta {
        EntityMeta::new("Post", "posts")
            .with_searchable(&["title", "body"])
            .with_booleans(&["is_published"])
            .with_dates(&["created_at", "published_at"])
            .with_relation(RelationDecl::new("comments", "comments", "post_id"))
    }

    #[test]
    fn test_entity_defaults() {
        let meta = EntityMeta::new("Post", "posts");
        assert_eq!(meta.primary_key(), "id");
        assert!(meta.searchable_fields().is_empty());
        assert!(meta.rules().is_empty());
    }

    #[test]
    fn test_entity_field_sets() {
        let meta = post_entity();
        assert!(meta.is_boolean_field("is_published"));
        assert!(!meta.is_boolean_field("title"));
        assert!(meta.is_date_field("published_at"));
        assert!(!meta.is_date_field("is_published"));
    }

    #[test]
    fn test_entity_relation_lookup() {
        let meta = post_entity();
        let rel = meta.relation("comments").unwrap();
        assert_eq!(rel.table, "comments");
        assert_eq!(rel.foreign_key, "post_id");
        assert!(meta.relation("likes").is_none());
    }

    #[test]
    fn test_custom_primary_key() {
        let meta = EntityMeta::new("Sku", "skus").with_primary_key("sku_code");
        assert_eq!(meta.primary_key(), "sku_code");
    }

    #[test]
    fn test_registry_lookup() {
        let registry = EntityRegistry::new().with(post_entity());
        assert!(registry.get("Post").is_some());
        assert!(registry.get("User").is_none());
        assert_eq!(registry.get("Post").unwrap().table(), "posts");
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = EntityRegistry::new().with(post_entity());
        registry.register(EntityMeta::new("Post", "archived_posts"));
        assert_eq!(registry.get("Post").unwrap().table(), "archived_posts");
    }
}
