//! Named template storage and the startup self-check.

use super::{SqlTemplate, TemplateValues};
use crate::error::{QueryError, QueryResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

/// `<@name> … </@name>` blocks in a template set.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<@\s*([A-Za-z_][\w.]*)\s*>(.*?)</@\s*([A-Za-z_][\w.]*)\s*>")
        .expect("block regex")
});

/// Concurrent, insert-once store of parsed templates.
///
/// Templates are parsed at registration and shared behind `Arc`, so lookups
/// on the hot path never re-parse. Registration rejects duplicates instead
/// of silently shadowing.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: DashMap<String, Arc<SqlTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store one template under `name`.
    pub fn register(&self, name: impl Into<String>, text: &str) -> QueryResult<()> {
        let name = name.into();
        let template = Arc::new(SqlTemplate::new(name.clone(), text));
        match self.templates.entry(name) {
            Entry::Occupied(entry) => Err(QueryError::DuplicateName(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(template);
                Ok(())
            }
        }
    }

    /// Parse a template set: a file of `<@name> … </@name>` blocks, each
    /// registered under its block name. Text between blocks is ignored.
    /// Returns the names registered, in file order.
    pub fn register_set(&self, text: &str) -> QueryResult<Vec<String>> {
        let mut registered = Vec::new();
        for caps in BLOCK_RE.captures_iter(text) {
            let open = &caps[1];
            let close = &caps[3];
            if open != close {
                return Err(QueryError::validation(format!(
                    "template block <@{open}> closed by </@{close}>"
                )));
            }
            self.register(open, &caps[2])?;
            registered.push(open.to_string());
        }
        if registered.is_empty() && !text.trim().is_empty() {
            return Err(QueryError::validation(
                "template set contains no <@name> blocks",
            ));
        }
        Ok(registered)
    }

    pub fn get(&self, name: &str) -> Option<Arc<SqlTemplate>> {
        self.templates.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Compile every registered template once against synthetic values,
    /// surfacing broken directives and malformed placeholders at startup
    /// instead of on the first live call.
    pub fn self_check(&self) -> QueryResult<()> {
        self.self_check_with(&TemplateValues::new())
    }

    /// Self-check with caller-supplied values taking precedence over the
    /// synthesized ones, for templates whose directives only accept a
    /// particular shape.
    pub fn self_check_with(&self, overrides: &TemplateValues) -> QueryResult<()> {
        for entry in self.templates.iter() {
            let template = entry.value();
            let mut values = sample_values(&template.variable_roots());
            for (key, val) in overrides {
                values.insert(key.clone(), val.clone());
            }
            template.compile(&values)?;
            tracing::debug!(template = %entry.key(), "template self-check passed");
        }
        Ok(())
    }
}

/// Synthesize a value map exercising every referenced variable: list roots
/// get a two-element numeric list, scalars get `1`, dotted paths become
/// nested objects.
fn sample_values(roots: &[(String, bool)]) -> TemplateValues {
    let mut values = TemplateValues::new();
    for (path, is_list) in roots {
        let leaf = if *is_list {
            serde_json::json!([1, 2])
        } else {
            serde_json::json!(1)
        };
        insert_path(&mut values, path, leaf);
    }
    values
}

fn insert_path(map: &mut TemplateValues, path: &str, leaf: serde_json::Value) {
    match path.split_once('.') {
        None => {
            map.entry(path.to_string()).or_insert(leaf);
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| serde_json::json!({}));
            if !entry.is_object() {
                *entry = serde_json::json!({});
            }
            if let serde_json::Value::Object(obj) = entry {
                insert_path(obj, rest, leaf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicates() {
        let registry = TemplateRegistry::new();
        registry.register("find_user", "select * from user").unwrap();
        let err = registry.register("find_user", "select 1").unwrap_err();
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn register_set_parses_named_blocks() {
        let registry = TemplateRegistry::new();
        let names = registry
            .register_set(
                "<@find_by_id>\nselect * from user where id = ${id}\n</@find_by_id>\n\
                 <@count_all>\nselect count(*) from user\n</@count_all>",
            )
            .unwrap();
        assert_eq!(names, vec!["find_by_id", "count_all"]);
        assert!(registry.get("find_by_id").is_some());
        assert!(registry.get("count_all").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn register_set_rejects_mismatched_close_tag() {
        let registry = TemplateRegistry::new();
        let err = registry
            .register_set("<@a>select 1</@b>")
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[test]
    fn register_set_rejects_blockless_text() {
        let registry = TemplateRegistry::new();
        assert!(registry.register_set("select 1").is_err());
        assert!(registry.register_set("  \n ").unwrap().is_empty());
    }

    #[test]
    fn self_check_compiles_every_template() {
        let registry = TemplateRegistry::new();
        registry
            .register(
                "search",
                "select * from user where name like '%${name}%' \
                 {% if age is defined %}and age > ${age}{% endif %}",
            )
            .unwrap();
        registry
            .register("by_ids", "select * from user where id in (${join(ids)})")
            .unwrap();
        registry.self_check().unwrap();
    }

    #[test]
    fn self_check_surfaces_broken_directives() {
        let registry = TemplateRegistry::new();
        registry
            .register("broken", "select 1 {% if x %}")
            .unwrap();
        let err = registry.self_check().unwrap_err();
        assert!(matches!(err, QueryError::Template { .. }));
    }

    #[test]
    fn self_check_nests_dotted_paths() {
        let registry = TemplateRegistry::new();
        registry
            .register(
                "nested",
                "select * from orders where user_id = ${filter.user_id} \
                 and status = ${filter.status}",
            )
            .unwrap();
        registry.self_check().unwrap();
    }
}
