//! Error types for the query engine

use thiserror::Error;

use crate::rules::FieldErrors;

/// Errors that can occur while building or executing queries
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("malformed relation descriptor: {0}")]
    MalformedRelationDescriptor(String),

    #[error("no polymorphic type registered for table: {0}")]
    UnresolvedPolymorphicType(String),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

impl EngineError {
    pub fn malformed_relation(descriptor: impl Into<String>) -> Self {
        Self::MalformedRelationDescriptor(descriptor.into())
    }

    pub fn unresolved_type(table: impl Into<String>) -> Self {
        Self::UnresolvedPolymorphicType(table.into())
    }

    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity(name.into())
    }

    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier(name.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
