//! Validation rule storage and the `unique` rule rewrite
//!
//! The engine does not define validation rule types. It stores each entity's
//! declared rules verbatim, rewrites `unique:` rules when updating an
//! existing record so the record can keep its own unique value, and hands the
//! rule set to a pluggable [`Validator`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field -> rule list, plus per-field validation messages
///
/// Rules are opaque strings in the `name` or `name:param,param` form. Packed
/// rule strings (`"required|unique:users,email"`) are split on `|` at insert
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    messages: BTreeMap<String, String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare rules for a field; accepts packed `a|b|c` strings
    pub fn rule(mut self, field: impl Into<String>, packed: &str) -> Self {
        let rules = packed.split('|').map(str::to_string).collect();
        self.rules.insert(field.into(), rules);
        self
    }

    /// Declare a message, keyed `field.rule` (e.g. `email.required`)
    pub fn message(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(key.into(), text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules_for(&self, field: &str) -> Option<&[String]> {
        self.rules.get(field).map(Vec::as_slice)
    }

    pub fn message_for(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.rules.iter()
    }
}

/// Rewrite `unique:` rules so an update excepts the record's own id
///
/// `unique:table[,column[,except[,idColumn]]]` becomes
/// `unique:table,column,<exclude_id>,<idColumn>`, with the column defaulting
/// to the field name and the id column to `id`. Idempotent for a fixed id.
/// Rules whose parameter list cannot be parsed are left unmodified.
pub fn update_unique_rules(rules: &mut RuleSet, exclude_id: &str) {
    for (field, field_rules) in rules.rules.iter_mut() {
        for rule in field_rules.iter_mut() {
            let Some(rest) = rule.strip_prefix("unique:") else {
                continue;
            };
            let params: Vec<&str> = rest.split(',').collect();
            let table = params[0];
            if table.is_empty() {
                // Unparsable parameter list; leave the rule alone
                continue;
            }
            let column = params
                .get(1)
                .filter(|c| !c.is_empty())
                .copied()
                .unwrap_or(field.as_str());
            let id_column = params
                .get(3)
                .filter(|c| !c.is_empty())
                .copied()
                .unwrap_or("id");

            *rule = format!("unique:{table},{column},{exclude_id},{id_column}");
        }
    }
}

/// Structured field -> error messages map raised on validation failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validation collaborator boundary
///
/// Implementations receive the raw data and the (possibly rewritten) rule
/// set, and return the validated subset of the data or a structured error
/// map. The engine ships [`BasicValidator`]; applications with a full rule
/// engine plug it in here.
pub trait Validator: Send + Sync {
    fn validate(
        &self,
        data: &Map<String, Value>,
        rules: &RuleSet,
    ) -> Result<Map<String, Value>, FieldErrors>;
}

/// Minimal validator: enforces `required`, delegates every other rule
///
/// Returns the rule-covered subset of the input so undeclared fields never
/// reach an INSERT or UPDATE. An empty rule set passes the data through
/// unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicValidator;

impl Validator for BasicValidator {
    fn validate(
        &self,
        data: &Map<String, Value>,
        rules: &RuleSet,
    ) -> Result<Map<String, Value>, FieldErrors> {
        if rules.is_empty() {
            return Ok(data.clone());
        }

        let mut errors = FieldErrors::new();
        let mut validated = Map::new();

        for (field, field_rules) in rules.iter() {
            let value = data.get(field);
            let required = field_rules.iter().any(|r| r == "required");
            let missing = match value {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };

            if required && missing {
                let message = rules
                    .message_for(&format!("{field}.required"))
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("The {field} field is required."));
                errors.add(field.clone(), message);
                continue;
            }

            if let Some(value) = value {
                validated.insert(field.clone(), value.clone());
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(errors)
        }
    }
}
