//! SQL template compiler.
//!
//! A template is SQL-like text with `${expr}` value placeholders and tera
//! directives (`{% if %}`, `{% for %}`) for conditional/looping fragments.
//! `#`-prefixed lines are comments; the `#loquat-union` line splits the text
//! into a base query plus additional union members; a trailing `;` is
//! tolerated. Compilation yields a positional-parameter (`?`) SQL string per
//! segment and a strictly ordered, typed value list.

mod engine;
mod registry;

pub use registry::TemplateRegistry;

use crate::error::QueryResult;
use crate::sqls;
use crate::union::UnionSqlInfo;
use crate::value::Value;

/// Line marker separating the base query from additional union members.
pub const UNION_MARKER: &str = "#loquat-union";

/// Caller-supplied values a template is compiled against.
pub type TemplateValues = serde_json::Map<String, serde_json::Value>;

/// A parsed template: comment-stripped, one base segment plus zero or more
/// union segments. Parsing happens once; compilation happens per call.
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    name: String,
    union_before: String,
    union_after: Vec<String>,
}

/// Result of compiling a template against a value map.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    /// The base query with `?` placeholders.
    pub sql: String,
    /// Bind values for the base query, in emission order.
    pub params: Vec<Value>,
    /// Compiled union members, in template order (empty when the template
    /// has no union marker).
    pub unions: Vec<UnionSqlInfo>,
}

impl CompiledTemplate {
    pub fn is_union(&self) -> bool {
        !self.unions.is_empty()
    }

    /// Flatten into the ordered source list the pagination merger consumes:
    /// the base query first, then each union member.
    pub fn into_sources(self) -> Vec<UnionSqlInfo> {
        let mut sources = Vec::with_capacity(self.unions.len() + 1);
        sources.push(UnionSqlInfo::new(self.sql, self.params));
        sources.extend(self.unions);
        sources
    }
}

impl SqlTemplate {
    /// Parse template text.
    ///
    /// Full-line `#` comments are dropped (except the union marker line),
    /// remaining lines are joined with single spaces, the text is split at
    /// the union marker, and each segment loses a single trailing `;`.
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        let joined = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with('#') || line.starts_with(UNION_MARKER))
            .collect::<Vec<_>>()
            .join(" ");
        let mut segments = joined
            .split(UNION_MARKER)
            .map(sqls::wipe_end_semicolon)
            .collect::<Vec<_>>();
        let union_before = if segments.is_empty() {
            String::new()
        } else {
            segments.remove(0)
        };
        Self {
            name: name.into(),
            union_before,
            union_after: segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the template declares union members.
    pub fn has_unions(&self) -> bool {
        !self.union_after.is_empty()
    }

    /// Compile every segment against `values`.
    ///
    /// An empty segment is legal and compiles to an empty SQL string with no
    /// params; callers must guard against executing it.
    pub fn compile(&self, values: &TemplateValues) -> QueryResult<CompiledTemplate> {
        let (sql, params) = engine::compile_segment(&self.name, &self.union_before, values)?;
        let mut unions = Vec::with_capacity(self.union_after.len());
        for segment in &self.union_after {
            let (sql, params) = engine::compile_segment(&self.name, segment.trim(), values)?;
            unions.push(UnionSqlInfo::new(sql, params));
        }
        Ok(CompiledTemplate {
            sql,
            params,
            unions,
        })
    }

    /// Variable roots referenced by this template, used by the registry
    /// self-check to synthesize sample values.
    pub(crate) fn variable_roots(&self) -> Vec<(String, bool)> {
        let mut roots = Vec::new();
        engine::collect_roots(&self.union_before, &mut roots);
        for segment in &self.union_after {
            engine::collect_roots(segment, &mut roots);
        }
        roots
    }
}

#[cfg(test)]
mod tests;
