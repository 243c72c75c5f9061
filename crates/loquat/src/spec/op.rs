//! Condition operators and the shared condition-key parser.
//!
//! A stored condition is keyed `OP__field` (two underscores). The key format
//! is also what the naming-convention parser emits, so parsing a raw key back
//! into `(Op, field)` sits on the hot path of every compiled query and is
//! memoized process-wide.

use crate::error::{QueryError, QueryResult};
use dashmap::DashMap;
use std::sync::LazyLock;

/// Separator between operator and field name in a condition key.
pub const KEY_SEPARATOR: &str = "__";

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Like,
    NotLike,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Inequality, rendered as `<>`
    Not,
    /// Two bind values: low and high bound
    Between,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    /// Rendered as `= ''`
    IsEmpty,
    /// Rendered as `<> ''`
    IsNotEmpty,
    JsonContains,
    /// Grouped nested specs joined by `or`
    Or,
    /// Grouped nested specs joined by `and`
    And,
}

impl Op {
    pub fn as_key(&self) -> &'static str {
        match self {
            Op::Eq => "EQ",
            Op::Like => "LIKE",
            Op::NotLike => "NOTLIKE",
            Op::Gt => "GT",
            Op::Lt => "LT",
            Op::Gte => "GTE",
            Op::Lte => "LTE",
            Op::Not => "NOT",
            Op::Between => "BETWEEN",
            Op::IsNull => "ISNULL",
            Op::IsNotNull => "ISNOTNULL",
            Op::In => "IN",
            Op::NotIn => "NOTIN",
            Op::IsEmpty => "ISEMPTY",
            Op::IsNotEmpty => "ISNOTEMPTY",
            Op::JsonContains => "JSON_CONTAINS",
            Op::Or => "OR",
            Op::And => "AND",
        }
    }

    pub fn parse(s: &str) -> QueryResult<Op> {
        let op = match s.to_ascii_uppercase().as_str() {
            "EQ" => Op::Eq,
            "LIKE" => Op::Like,
            "NOTLIKE" => Op::NotLike,
            "GT" => Op::Gt,
            "LT" => Op::Lt,
            "GTE" => Op::Gte,
            "LTE" => Op::Lte,
            "NOT" => Op::Not,
            "BETWEEN" => Op::Between,
            "ISNULL" => Op::IsNull,
            "ISNOTNULL" => Op::IsNotNull,
            "IN" => Op::In,
            "NOTIN" => Op::NotIn,
            "ISEMPTY" => Op::IsEmpty,
            "ISNOTEMPTY" => Op::IsNotEmpty,
            "JSON_CONTAINS" => Op::JsonContains,
            "OR" => Op::Or,
            "AND" => Op::And,
            other => {
                return Err(QueryError::validation(format!("Unknown operator: {other}")));
            }
        };
        Ok(op)
    }

    /// Build the condition key for this operator and field.
    pub fn join(&self, field: &str) -> String {
        format!("{}{KEY_SEPARATOR}{field}", self.as_key())
    }
}

/// Raw key → (operator, field) parses, keyed by the literal key string.
/// Shared by every query thread; readers take no lock.
static KEY_CACHE: LazyLock<DashMap<String, (Op, String)>> = LazyLock::new(DashMap::new);

/// Parse a condition key of the form `OP__field`, memoized.
pub fn parse_key(key: &str) -> QueryResult<(Op, String)> {
    if let Some(hit) = KEY_CACHE.get(key) {
        return Ok(hit.clone());
    }
    let (op_part, field) = key
        .split_once(KEY_SEPARATOR)
        .ok_or_else(|| QueryError::validation(format!("'{key}' is not a valid condition key")))?;
    if field.is_empty() || field.contains(KEY_SEPARATOR) {
        return Err(QueryError::validation(format!(
            "'{key}' is not a valid condition key"
        )));
    }
    let parsed = (Op::parse(op_part)?, field.to_string());
    KEY_CACHE.insert(key.to_string(), parsed.clone());
    Ok(parsed)
}
