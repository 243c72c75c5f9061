//! Criteria builder ("Spec"): an ordered set of named conditions that
//! compiles to a WHERE-clause fragment plus a parallel ordered parameter
//! list.
//!
//! Every setter validates its value at the call site; a blank value, a bare
//! `%` wildcard or an empty IN list is a [`QueryError::Construction`], never
//! a silent no-op. Compilation is pure: compiling the same spec twice yields
//! identical SQL and identical parameters.

mod op;
mod sort;

pub use op::{KEY_SEPARATOR, Op, parse_key};
pub use sort::{NO_SORT, Sort};

use crate::error::{QueryError, QueryResult};
use crate::ident;
use crate::value::Value;

/// The value slot of one stored condition.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValue {
    /// No bind value (IS NULL, IS EMPTY, ...)
    None,
    Single(Value),
    /// BETWEEN bounds, or JSON_CONTAINS value + optional path
    Pair(Value, Value),
    List(Vec<Value>),
    /// Nested specs of an AND/OR group
    Group(Vec<Spec>),
}

/// The flattened record of parameters contributed by one compiled condition.
///
/// The concatenation of all compiled conditions' values, in the order the
/// conditions were written into the SQL fragment, is the bind-parameter
/// list. `param_count` always equals the number of `?` emitted for the
/// condition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub field: String,
    pub values: Vec<Value>,
    pub param_count: usize,
}

/// Result of compiling a [`Spec`] to a WHERE fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    /// WHERE-clause fragment, `"1=1"` when the spec holds no conditions.
    pub sql: String,
    pub conditions: Vec<CompiledCondition>,
}

impl CompiledWhere {
    /// Bind parameters in emission order.
    pub fn params(&self) -> Vec<Value> {
        self.conditions
            .iter()
            .flat_map(|c| c.values.iter().cloned())
            .collect()
    }
}

/// Criteria builder.
///
/// ```
/// # use loquat::{Spec, QueryResult};
/// # fn demo() -> QueryResult<()> {
/// let spec = Spec::new()
///     .eq("status", "active")?
///     .gte("age", 18)?
///     .desc("created_at");
/// let compiled = spec.compile_where(None)?;
/// assert_eq!(compiled.sql, "`status` = ? and `age` >= ?");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spec {
    /// Conditions keyed `OP__field`, insertion-ordered; re-setting the same
    /// key replaces the value in place.
    entries: Vec<(String, SpecValue)>,
    sort: Sort,
    group_by: Option<String>,
    having: Option<String>,
    limit: u64,
    limit_begin: u64,
}

impl Spec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conditions.
    pub fn condition_count(&self) -> usize {
        self.entries.len()
    }

    pub fn has_conditions(&self) -> bool {
        !self.entries.is_empty()
    }

    // ==================== Condition setters ====================

    /// `field = ?`
    pub fn eq(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Eq, field, value.into())
    }

    /// `field like ?`; rejects blank values and bare `%`/`%%` patterns.
    pub fn like(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let value = value.into();
        verify_like(field, "like", &value)?;
        Ok(self.put(Op::Like.join(field), SpecValue::Single(value)))
    }

    /// `field not like ?`; rejects blank values and bare `%`/`%%` patterns.
    pub fn not_like(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let value = value.into();
        verify_like(field, "not like", &value)?;
        Ok(self.put(Op::NotLike.join(field), SpecValue::Single(value)))
    }

    /// `field > ?`
    pub fn gt(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Gt, field, value.into())
    }

    /// `field < ?`
    pub fn lt(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Lt, field, value.into())
    }

    /// `field >= ?`
    pub fn gte(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Gte, field, value.into())
    }

    /// `field <= ?`
    pub fn lte(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Lte, field, value.into())
    }

    /// `field <> ?`
    pub fn not(self, field: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.single(Op::Not, field, value.into())
    }

    /// `field between ? and ?`
    pub fn between(
        self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> QueryResult<Self> {
        let (low, high) = (low.into(), high.into());
        if low.is_blank() || high.is_blank() {
            return Err(QueryError::construction(field, "between bound is blank"));
        }
        Ok(self.put(Op::Between.join(field), SpecValue::Pair(low, high)))
    }

    /// `field in (?, ...)`; rejects empty collections.
    pub fn in_list<T: Into<Value>>(
        self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> QueryResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(QueryError::construction(field, "in list is empty"));
        }
        Ok(self.put(Op::In.join(field), SpecValue::List(values)))
    }

    /// `field not in (?, ...)`; rejects empty collections.
    pub fn not_in<T: Into<Value>>(
        self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> QueryResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(QueryError::construction(field, "not in list is empty"));
        }
        Ok(self.put(Op::NotIn.join(field), SpecValue::List(values)))
    }

    /// `field is null`
    pub fn is_null(self, field: &str) -> Self {
        self.put(Op::IsNull.join(field), SpecValue::None)
    }

    /// `field is not null`
    pub fn is_not_null(self, field: &str) -> Self {
        self.put(Op::IsNotNull.join(field), SpecValue::None)
    }

    /// `field = ''`
    pub fn is_empty(self, field: &str) -> Self {
        self.put(Op::IsEmpty.join(field), SpecValue::None)
    }

    /// `field <> ''`
    pub fn is_not_empty(self, field: &str) -> Self {
        self.put(Op::IsNotEmpty.join(field), SpecValue::None)
    }

    /// `json_contains(field, ?)`, with a second bind value when `path` is
    /// given: `json_contains(field, ?, ?)`.
    pub fn json_contains(
        self,
        field: &str,
        value: impl Into<Value>,
        path: Option<&str>,
    ) -> Self {
        let path = match path {
            Some(p) if !p.trim().is_empty() => Value::Str(p.to_string()),
            _ => Value::Null,
        };
        self.put(
            Op::JsonContains.join(field),
            SpecValue::Pair(value.into(), path),
        )
    }

    /// Group nested specs with `or`; at least two are required and every
    /// member must carry at least one condition.
    pub fn or(self, specs: Vec<Spec>) -> QueryResult<Self> {
        if specs.len() < 2 {
            return Err(QueryError::construction(
                "or",
                "or group needs at least two nested specs",
            ));
        }
        Self::verify_group_members("or", &specs)?;
        // The field part of a group key is never rendered; any stable
        // non-empty name works.
        Ok(self.put(Op::Or.join("spec"), SpecValue::Group(specs)))
    }

    /// Group nested specs with `and`; at least one is required and every
    /// member must carry at least one condition.
    pub fn and(self, specs: Vec<Spec>) -> QueryResult<Self> {
        if specs.is_empty() {
            return Err(QueryError::construction(
                "and",
                "and group needs at least one nested spec",
            ));
        }
        Self::verify_group_members("and", &specs)?;
        Ok(self.put(Op::And.join("spec"), SpecValue::Group(specs)))
    }

    /// A member with no conditions would render as a dangling joiner
    /// inside the group parentheses.
    fn verify_group_members(op: &str, specs: &[Spec]) -> QueryResult<()> {
        if specs.iter().any(|s| !s.has_conditions()) {
            return Err(QueryError::construction(
                op,
                format!("{op} group members must each carry a condition"),
            ));
        }
        Ok(())
    }

    // ==================== Sort / group / limit ====================

    /// Sort ascending by `field` (the `default` placeholder is ignored).
    pub fn asc(mut self, field: &str) -> Self {
        self.sort.asc(field);
        self
    }

    /// Sort descending by `field`.
    pub fn desc(mut self, field: &str) -> Self {
        self.sort.desc(field);
        self
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_string());
        self
    }

    pub fn having(mut self, having: &str) -> Self {
        self.having = Some(having.to_string());
        self
    }

    pub fn limit(mut self, size: u64) -> Self {
        self.limit = size;
        self
    }

    pub fn limit_begin(mut self, begin: u64) -> Self {
        self.limit_begin = begin;
        self
    }

    pub fn get_group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn get_having(&self) -> Option<&str> {
        self.having.as_deref()
    }

    pub fn get_limit(&self) -> u64 {
        self.limit
    }

    pub fn get_limit_begin(&self) -> u64 {
        self.limit_begin
    }

    // ==================== Compilation ====================

    /// Compile to a WHERE fragment plus the parameters it binds.
    ///
    /// Conditions render in insertion order joined by `" and "`; an empty
    /// spec compiles to `"1=1"` so the fragment is always safely AND-able.
    /// The optional `alias` prefixes every field as `alias.field`.
    pub fn compile_where(&self, alias: Option<&str>) -> QueryResult<CompiledWhere> {
        let mut conditions = Vec::new();
        let sql = self.build(alias, &mut conditions)?;
        let sql = if sql.trim().is_empty() {
            "1=1".to_string()
        } else {
            sql
        };
        Ok(CompiledWhere { sql, conditions })
    }

    fn single(self, op: Op, field: &str, value: Value) -> QueryResult<Self> {
        if value.is_blank() {
            return Err(QueryError::construction(
                field,
                format!("{} value is blank", op.as_key().to_ascii_lowercase()),
            ));
        }
        Ok(self.put(op.join(field), SpecValue::Single(value)))
    }

    fn put(mut self, key: String, value: SpecValue) -> Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    fn build(
        &self,
        alias: Option<&str>,
        out: &mut Vec<CompiledCondition>,
    ) -> QueryResult<String> {
        let prefix = ident::alias_prefix(alias);
        let mut sql = String::new();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                sql.push_str(" and ");
            }
            let (op, field) = parse_key(key)?;
            self.render_condition(&mut sql, op, &field, value, &prefix, alias, out)?;
        }
        Ok(sql)
    }

    #[allow(clippy::too_many_arguments)]
    fn render_condition(
        &self,
        sql: &mut String,
        op: Op,
        field: &str,
        value: &SpecValue,
        prefix: &str,
        alias: Option<&str>,
        out: &mut Vec<CompiledCondition>,
    ) -> QueryResult<()> {
        let col = || format!("{prefix}{}", ident::quote(field));
        match (op, value) {
            (Op::Eq, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} = ?", col()));
                out.push(one(field, v));
            }
            (Op::Like, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} like ?", col()));
                out.push(one(field, v));
            }
            (Op::NotLike, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} not like ?", col()));
                out.push(one(field, v));
            }
            (Op::Gt, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} > ?", col()));
                out.push(one(field, v));
            }
            (Op::Lt, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} < ?", col()));
                out.push(one(field, v));
            }
            (Op::Gte, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} >= ?", col()));
                out.push(one(field, v));
            }
            (Op::Lte, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} <= ?", col()));
                out.push(one(field, v));
            }
            (Op::Not, SpecValue::Single(v)) => {
                sql.push_str(&format!("{} <> ?", col()));
                out.push(one(field, v));
            }
            (Op::Between, SpecValue::Pair(low, high)) => {
                sql.push_str(&format!("{} between ? and ?", col()));
                out.push(CompiledCondition {
                    field: field.to_string(),
                    values: vec![low.clone(), high.clone()],
                    param_count: 2,
                });
            }
            (Op::IsNull, _) => sql.push_str(&format!("{} is null", col())),
            (Op::IsNotNull, _) => sql.push_str(&format!("{} is not null", col())),
            (Op::IsEmpty, _) => sql.push_str(&format!("{} = ''", col())),
            (Op::IsNotEmpty, _) => sql.push_str(&format!("{} <> ''", col())),
            (Op::In, SpecValue::List(values)) | (Op::NotIn, SpecValue::List(values)) => {
                let marks = vec!["?"; values.len()].join(",");
                let kw = if op == Op::In { "in" } else { "not in" };
                sql.push_str(&format!("{} {kw} ({marks})", col()));
                out.push(CompiledCondition {
                    field: field.to_string(),
                    values: values.clone(),
                    param_count: values.len(),
                });
            }
            (Op::JsonContains, SpecValue::Pair(v, path)) => {
                sql.push_str(&format!("json_contains({}, ?", col()));
                out.push(CompiledCondition {
                    field: field.to_string(),
                    values: vec![json_search_value(v)],
                    param_count: 1,
                });
                if path.is_null() {
                    sql.push(')');
                } else {
                    sql.push_str(", ?)");
                    out.push(one(field, path));
                }
            }
            (Op::Or, SpecValue::Group(specs)) | (Op::And, SpecValue::Group(specs)) => {
                let joiner = if op == Op::Or { " or " } else { " and " };
                sql.push('(');
                for (i, nested) in specs.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(joiner);
                    }
                    let inner = nested.build(alias, out)?;
                    // A single-condition member needs no parentheses.
                    if nested.condition_count() > 1 {
                        sql.push('(');
                        sql.push_str(&inner);
                        sql.push(')');
                    } else {
                        sql.push_str(&inner);
                    }
                }
                sql.push(')');
            }
            (op, value) => {
                return Err(QueryError::validation(format!(
                    "Condition {op:?} cannot hold {value:?}"
                )));
            }
        }
        Ok(())
    }
}

fn one(field: &str, value: &Value) -> CompiledCondition {
    CompiledCondition {
        field: field.to_string(),
        values: vec![value.clone()],
        param_count: 1,
    }
}

/// JSON containment compares against a JSON document: strings are wrapped
/// as JSON string literals, other scalars bind as their text form.
fn json_search_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Str(s) => Value::Str(format!("\"{s}\"")),
        other => Value::Str(other.to_string()),
    }
}

fn verify_like(field: &str, op_name: &str, value: &Value) -> QueryResult<()> {
    if value.is_blank() {
        return Err(QueryError::construction(
            field,
            format!("{op_name} value is blank"),
        ));
    }
    if let Some(s) = value.as_str()
        && (s == "%" || s == "%%")
    {
        return Err(QueryError::construction(
            field,
            format!("{op_name} value is a bare wildcard"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
