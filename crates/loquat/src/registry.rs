//! Startup-populated query dispatch.
//!
//! Every query a caller can run is registered once, at startup, under a
//! stable identifier that resolves to a prepared statement, a criteria
//! factory, or a named template. Registration is the only write path;
//! lookups afterwards are read-only and lock-free for readers.

use crate::error::{QueryError, QueryResult};
use crate::spec::Spec;
use crate::template::{SqlTemplate, TemplateRegistry, TemplateValues};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;

type CriteriaFactory = dyn Fn() -> Spec + Send + Sync;

/// What a query identifier resolves to.
pub enum QueryKind {
    /// A fixed statement with positional placeholders, bound as-is.
    Prepared { sql: String },
    /// Builds a fresh criteria builder per invocation.
    Criteria(Box<CriteriaFactory>),
    /// A template compiled against caller-supplied values.
    Template(Arc<SqlTemplate>),
}

impl fmt::Debug for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Prepared { sql } => f.debug_struct("Prepared").field("sql", sql).finish(),
            QueryKind::Criteria(_) => f.write_str("Criteria"),
            QueryKind::Template(t) => f.debug_tuple("Template").field(&t.name()).finish(),
        }
    }
}

/// Identifier → query dispatch table, plus the template store behind its
/// template entries.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    entries: DashMap<String, Arc<QueryKind>>,
    templates: TemplateRegistry,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_prepared(&self, id: impl Into<String>, sql: impl Into<String>) -> QueryResult<()> {
        self.insert(id.into(), QueryKind::Prepared { sql: sql.into() })
    }

    pub fn register_criteria<F>(&self, id: impl Into<String>, factory: F) -> QueryResult<()>
    where
        F: Fn() -> Spec + Send + Sync + 'static,
    {
        self.insert(id.into(), QueryKind::Criteria(Box::new(factory)))
    }

    /// Register a template under `id`, parsing it immediately.
    pub fn register_template(&self, id: impl Into<String>, text: &str) -> QueryResult<()> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(QueryError::DuplicateName(id));
        }
        self.templates.register(id.clone(), text)?;
        let template = self
            .templates
            .get(&id)
            .ok_or_else(|| QueryError::UnknownQuery(id.clone()))?;
        self.insert(id, QueryKind::Template(template))
    }

    /// Register every `<@name>` block of a template set. Returns how many
    /// blocks were registered.
    pub fn register_template_set(&self, text: &str) -> QueryResult<usize> {
        let names = self.templates.register_set(text)?;
        for name in &names {
            let template = self
                .templates
                .get(name)
                .ok_or_else(|| QueryError::UnknownQuery(name.clone()))?;
            self.insert(name.clone(), QueryKind::Template(template))?;
        }
        Ok(names.len())
    }

    pub fn resolve(&self, id: &str) -> QueryResult<Arc<QueryKind>> {
        self.entries
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| QueryError::UnknownQuery(id.to_string()))
    }

    /// Compile every registered template against synthetic values, failing
    /// fast on broken ones. Call once at startup.
    pub fn self_check(&self) -> QueryResult<()> {
        self.templates.self_check()
    }

    /// Self-check with caller-supplied sample values taking precedence.
    pub fn self_check_with(&self, overrides: &TemplateValues) -> QueryResult<()> {
        self.templates.self_check_with(overrides)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&self, id: String, kind: QueryKind) -> QueryResult<()> {
        match self.entries.entry(id) {
            Entry::Occupied(entry) => Err(QueryError::DuplicateName(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(kind));
                Ok(())
            }
        }
    }
}
