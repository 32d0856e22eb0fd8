//! Row materialization
//!
//! The driver projects every row through `to_jsonb`, so a record is one JSON
//! object keyed by column name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::error::{EngineError, Result};

/// One materialized row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub(crate) fn from_row(row: &PgRow) -> Result<Self> {
        let value: Value = row.try_get("record")?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(EngineError::database(format!(
                "row projection was not an object: {other}"
            ))),
        }
    }
}
