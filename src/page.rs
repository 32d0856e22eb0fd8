//! Pagination result shapes and the opaque cursor codec

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::record::Record;

/// Offset pagination: page window plus total count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetPage {
    pub items: Vec<Record>,
    pub total: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
}

impl OffsetPage {
    /// Last page number, at least 1
    pub fn last_page(&self) -> i64 {
        if self.total <= 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }
}

/// Simple pagination: no count query, just a has-more probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplePage {
    pub items: Vec<Record>,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Keyset pagination: opaque cursors in both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage {
    pub items: Vec<Record>,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(rename = "prevCursor", skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

/// Decoded cursor payload
///
/// Encodes the ordering field, the last-seen key value, and whether the
/// cursor points backwards. Callers treat the encoded form as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub field: String,
    pub value: Value,
    #[serde(default)]
    pub before: bool,
}

impl Cursor {
    pub fn after(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            before: false,
        }
    }

    pub fn before(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            before: true,
        }
    }

    /// Encode to the opaque wire form (URL-safe base64 over JSON)
    pub fn encode(&self) -> String {
        // Serializing a struct of plain JSON values cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode an opaque cursor string
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| EngineError::InvalidCursor(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::InvalidCursor(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = Cursor::after("id", json!(42));
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
        assert!(!decoded.before);
    }

    #[test]
    fn test_cursor_before_round_trip() {
        let cursor = Cursor::before("created_at", json!("2026-01-01T00:00:00Z"));
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.field, "created_at");
        assert!(decoded.before);
    }

    #[test]
    fn test_cursor_decode_garbage() {
        assert!(matches!(
            Cursor::decode("not base64 at all!!"),
            Err(EngineError::InvalidCursor(_))
        ));
        // Valid base64, invalid payload
        let encoded = URL_SAFE_NO_PAD.encode(b"plain text");
        assert!(matches!(
            Cursor::decode(&encoded),
            Err(EngineError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_offset_page_last_page() {
        let page = OffsetPage {
            items: Vec::new(),
            total: 45,
            per_page: 10,
            current_page: 1,
        };
        assert_eq!(page.last_page(), 5);

        let empty = OffsetPage {
            items: Vec::new(),
            total: 0,
            per_page: 10,
            current_page: 1,
        };
        assert_eq!(empty.last_page(), 1);
    }
}
