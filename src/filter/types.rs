use serde_json::Value;

/// Comparison a filter name is bound to. Fixed per field, never chosen by
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `column = $N`
    Eq,
    /// `lower(column) = $N`, value lower-cased
    EqIgnoreCase,
    /// `lower(column) LIKE $N`, value lower-cased and wrapped in `%`
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub name: &'static str,
    pub column: &'static str,
    pub op: FilterOp,
}

impl FilterField {
    pub const fn new(name: &'static str, column: &'static str, op: FilterOp) -> Self {
        Self { name, column, op }
    }
}

/// Static filter configuration for one entity.
pub type FilterTable = &'static [FilterField];

/// A typed sparse filter record for one entity.
pub trait FilterParams {
    const FIELDS: FilterTable;

    /// Present filters only, in declaration order.
    fn filters(&self) -> Vec<(&'static str, Value)>;
}

/// Predicates to be AND-ed together plus their parameters, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub predicates: Vec<String>,
    pub params: Vec<Value>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// ` WHERE a AND b`, or an empty string when there is nothing to filter on.
    pub fn to_sql(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }
}
