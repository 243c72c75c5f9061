//! Execution gateway consumed by the pagination merger.
//!
//! The merger never opens connections or manages transactions; it hands
//! every statement to a [`Gateway`] and propagates whatever the gateway
//! reports, untouched.

use crate::error::QueryResult;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A row source the pagination merger can issue statements against.
///
/// Statements arrive with `?` placeholders and a positional [`Value`] list;
/// adapters translate both to their backend's convention.
pub trait Gateway: Send + Sync {
    type Row: Send;

    /// Run a statement and return all rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Self::Row>>> + Send;

    /// Run a statement expected to produce a single scalar, e.g. a COUNT.
    /// Zero rows yields [`Value::Null`].
    fn execute_scalar(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<Value>> + Send;
}

impl Gateway for tokio_postgres::Client {
    type Row = Row;

    async fn execute(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        let sql = numbered_placeholders(sql);
        let params = bind_params(params);
        Ok(tokio_postgres::Client::query(self, &sql, &params).await?)
    }

    async fn execute_scalar(&self, sql: &str, params: &[Value]) -> QueryResult<Value> {
        let sql = numbered_placeholders(sql);
        let params = bind_params(params);
        let row = tokio_postgres::Client::query_opt(self, &sql, &params).await?;
        Ok(row.as_ref().map(scalar_value).unwrap_or(Value::Null))
    }
}

impl Gateway for tokio_postgres::Transaction<'_> {
    type Row = Row;

    async fn execute(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        let sql = numbered_placeholders(sql);
        let params = bind_params(params);
        Ok(tokio_postgres::Transaction::query(self, &sql, &params).await?)
    }

    async fn execute_scalar(&self, sql: &str, params: &[Value]) -> QueryResult<Value> {
        let sql = numbered_placeholders(sql);
        let params = bind_params(params);
        let row = tokio_postgres::Transaction::query_opt(self, &sql, &params).await?;
        Ok(row.as_ref().map(scalar_value).unwrap_or(Value::Null))
    }
}

fn bind_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// Rewrite `?` placeholders to `$1..$n`, skipping string literals.
fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    let mut in_string = false;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_string => {
                in_string = true;
                out.push(c);
            }
            '\'' if in_string => {
                out.push(c);
                // '' escapes a quote inside the literal
                if chars.peek() == Some(&'\'') {
                    out.push('\'');
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            '?' if !in_string => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

fn scalar_value(row: &Row) -> Value {
    if let Ok(v) = row.try_get::<_, i64>(0) {
        return Value::Int(v);
    }
    if let Ok(v) = row.try_get::<_, i32>(0) {
        return Value::Int(v.into());
    }
    if let Ok(v) = row.try_get::<_, f64>(0) {
        return Value::Float(v);
    }
    if let Ok(v) = row.try_get::<_, bool>(0) {
        return Value::Bool(v);
    }
    if let Ok(v) = row.try_get::<_, String>(0) {
        return Value::Str(v);
    }
    Value::Null
}
