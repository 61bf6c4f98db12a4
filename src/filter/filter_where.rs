use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterField, FilterOp, FilterParams, FilterTable, WhereClause};

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    predicates: Vec<String>,
}

impl FilterWhere {
    fn new() -> Self {
        Self {
            param_values: vec![],
            param_index: 0,
            predicates: vec![],
        }
    }

    /// Build predicates for the present filters, numbering placeholders from 1.
    pub fn generate(
        filters: &[(&str, Value)],
        fields: FilterTable,
    ) -> Result<WhereClause, FilterError> {
        let mut filter_where = Self::new();
        for (name, value) in filters {
            let field = Self::lookup(fields, name)?;
            filter_where.push_condition(field, value)?;
        }
        Ok(filter_where.finish())
    }

    pub fn generate_for<F: FilterParams>(params: &F) -> Result<WhereClause, FilterError> {
        Self::generate(&params.filters(), F::FIELDS)
    }

    fn lookup(fields: FilterTable, name: &str) -> Result<&'static FilterField, FilterError> {
        fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
    }

    fn push_condition(&mut self, field: &FilterField, value: &Value) -> Result<(), FilterError> {
        let predicate = match field.op {
            FilterOp::Eq => format!("{} = {}", field.column, self.param(value.clone())),
            FilterOp::EqIgnoreCase => {
                let folded = Self::folded(field, value)?;
                format!("lower({}) = {}", field.column, self.param(Value::String(folded)))
            }
            FilterOp::ContainsIgnoreCase => {
                let pattern = format!("%{}%", escape_like(&Self::folded(field, value)?));
                format!("lower({}) LIKE {}", field.column, self.param(Value::String(pattern)))
            }
        };
        self.predicates.push(predicate);
        Ok(())
    }

    fn folded(field: &FilterField, value: &Value) -> Result<String, FilterError> {
        value
            .as_str()
            .map(str::to_lowercase)
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires a string", field.name)))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    fn finish(self) -> WhereClause {
        WhereClause {
            predicates: self.predicates,
            params: self.param_values,
        }
    }
}

/// Escape LIKE wildcards so user text only matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
