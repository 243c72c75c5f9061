//! Sort rules for criteria queries.
//!
//! Fields are stored in insertion order; a field recorded through
//! [`Sort::desc`] carries the `_D` suffix and renders as `DESC` with the
//! suffix stripped. The placeholder name `default` means "no sort" and is
//! never recorded.

/// Placeholder field name that opts a caller-supplied sort field out.
pub const NO_SORT: &str = "default";

const DESC_SUFFIX: &str = "_D";

/// Ordered sort state of a [`Spec`](super::Spec).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    fields: Vec<String>,
}

impl Sort {
    pub fn asc(&mut self, field: &str) {
        if field != NO_SORT && !self.fields.iter().any(|f| f == field) {
            self.fields.push(field.to_string());
        }
    }

    pub fn desc(&mut self, field: &str) {
        let tagged = format!("{field}{DESC_SUFFIX}");
        if field != NO_SORT && !self.fields.contains(&tagged) {
            self.fields.push(tagged);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render `" order by a, b desc"`, or an empty string when unsorted.
    pub fn to_sql(&self) -> String {
        if self.fields.is_empty() {
            return String::new();
        }
        let mut sql = String::from(" order by ");
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            match field.strip_suffix(DESC_SUFFIX) {
                Some(bare) => {
                    sql.push_str(bare);
                    sql.push_str(" desc");
                }
                None => sql.push_str(field),
            }
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_insertion_order() {
        let mut sort = Sort::default();
        sort.asc("name");
        sort.desc("created_at");
        assert_eq!(sort.to_sql(), " order by name, created_at desc");
    }

    #[test]
    fn empty_sort_renders_nothing() {
        assert_eq!(Sort::default().to_sql(), "");
    }

    #[test]
    fn default_placeholder_is_ignored() {
        let mut sort = Sort::default();
        sort.asc(NO_SORT);
        sort.desc(NO_SORT);
        assert!(sort.is_empty());
    }

    #[test]
    fn duplicate_fields_are_recorded_once() {
        let mut sort = Sort::default();
        sort.asc("id");
        sort.asc("id");
        assert_eq!(sort.to_sql(), " order by id");
    }
}
