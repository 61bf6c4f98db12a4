//! Parameterized SET fragments for partial updates.
//!
//! Values never reach the SQL text; every present field becomes a
//! `column = $N` clause and its value is pushed onto the parameter list at
//! position N.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SqlError {
    #[error("No data")]
    NoUpdateData,
}

/// Logical field name → physical column name. Fields missing from the table
/// are used verbatim.
pub type ColumnMap = &'static [(&'static str, &'static str)];

pub fn column_for(columns: ColumnMap, field: &str) -> String {
    columns
        .iter()
        .find(|(logical, _)| *logical == field)
        .map(|(_, physical)| physical.to_string())
        .unwrap_or_else(|| field.to_string())
}

/// Ordered sparse set of field values. A field that was never set is absent
/// and will not be touched; a field set to `Value::Null` is present and
/// writes NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, Value)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `field` present with `value`, replacing any earlier value in
    /// place so the original position is kept.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    /// Set `field` only when `value` is `Some`.
    pub fn set_present<T: Into<Value>>(&mut self, field: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.set(field, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A typed sparse update record for one entity.
pub trait PartialUpdate {
    /// Column translation used when building the SET fragment.
    const COLUMNS: ColumnMap;

    fn attributes(&self) -> AttributeMap;
}

/// SQL fragment plus the parameters its placeholders refer to, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    /// Placeholder number for the next parameter a caller appends after
    /// this fragment's own.
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }
}

/// Build the `SET` body for a partial update.
///
/// `{ "title": "New", "target_goal": 5 }` with an empty column map becomes
/// `title = $1, target_goal = $2` with params `["New", 5]`.
pub fn sql_for_partial_update(
    data: &AttributeMap,
    columns: ColumnMap,
) -> Result<SqlFragment, SqlError> {
    if data.is_empty() {
        return Err(SqlError::NoUpdateData);
    }

    let mut clauses = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());
    for (field, value) in data.iter() {
        params.push(value.clone());
        clauses.push(format!("{} = ${}", column_for(columns, field), params.len()));
    }

    Ok(SqlFragment {
        sql: clauses.join(", "),
        params,
    })
}

/// Convenience for typed update records.
pub fn sql_for_update<U: PartialUpdate>(update: &U) -> Result<SqlFragment, SqlError> {
    sql_for_partial_update(&update.attributes(), U::COLUMNS)
}
