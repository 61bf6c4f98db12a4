use serde_json::Value;
use sqlx::{postgres::PgArguments, FromRow, Postgres};

/// Bind an ordered parameter list onto a query in placeholder order.
pub fn bind_params_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [Value],
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    for v in params {
        q = match v {
            Value::Null => q.bind(None::<String>),
            Value::Bool(b) => q.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    q.bind(i)
                } else if let Some(f) = n.as_f64() {
                    q.bind(f)
                } else {
                    q.bind(n.to_string())
                }
            }
            Value::String(s) => q.bind(s.as_str()),
            // JSONB
            Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
        };
    }
    q
}
