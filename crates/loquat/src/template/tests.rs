use super::*;
use crate::error::QueryError;
use crate::value::Value;

fn values(v: serde_json::Value) -> TemplateValues {
    v.as_object().cloned().unwrap_or_default()
}

fn compile(text: &str, vals: serde_json::Value) -> CompiledTemplate {
    SqlTemplate::new("t", text).compile(&values(vals)).unwrap()
}

#[test]
fn plain_placeholders_bind_in_order() {
    let compiled = compile(
        "select * from user where name = ${name} and age = ${age} and active = ${active}",
        serde_json::json!({"name": "kate", "age": 30, "active": true}),
    );
    assert_eq!(
        compiled.sql,
        "select * from user where name = ? and age = ? and active = ?"
    );
    assert_eq!(
        compiled.params,
        vec![
            Value::Str("kate".into()),
            Value::Int(30),
            Value::Bool(true)
        ]
    );
}

#[test]
fn float_values_stay_float() {
    let compiled = compile(
        "select * from orders where total > ${total}",
        serde_json::json!({"total": 9.5}),
    );
    assert_eq!(compiled.params, vec![Value::Float(9.5)]);
}

#[test]
fn like_pattern_binds_without_quotes() {
    let compiled = compile(
        "select * from user where name LIKE '%${name}%'",
        serde_json::json!({"name": "ka"}),
    );
    assert_eq!(compiled.sql, "select * from user where name LIKE ?");
    assert_eq!(compiled.params, vec![Value::Str("%ka%".into())]);
}

#[test]
fn unterminated_like_quote_keeps_a_multibyte_tail() {
    let compiled = compile(
        "select * from user where name like '${name}",
        serde_json::json!({"name": "café"}),
    );
    assert_eq!(compiled.sql, "select * from user where name like ?");
    assert_eq!(compiled.params, vec![Value::Str("café".into())]);
}

#[test]
fn quotes_outside_like_context_are_kept() {
    let compiled = compile(
        "select concat('${prefix}', name) from user",
        serde_json::json!({"prefix": "Mr "}),
    );
    assert_eq!(compiled.sql, "select concat(?, name) from user");
    assert_eq!(compiled.params, vec![Value::Str("'Mr '".into())]);
}

#[test]
fn join_expands_numeric_list() {
    let compiled = compile(
        "select * from user where id in (${join(ids)})",
        serde_json::json!({"ids": [1, 2, 3]}),
    );
    assert_eq!(compiled.sql, "select * from user where id in (?,?,?)");
    assert_eq!(
        compiled.params,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn join_strips_quotes_from_string_elements() {
    let compiled = compile(
        "select * from user where status in (${join(statuses)})",
        serde_json::json!({"statuses": ["new", "active"]}),
    );
    assert_eq!(compiled.sql, "select * from user where status in (?,?)");
    assert_eq!(
        compiled.params,
        vec![Value::Str("new".into()), Value::Str("active".into())]
    );
}

#[test]
fn join_accepts_explicit_separator_and_pipe_form() {
    let call = compile(
        "select * from t where id in (${join(ids, ',')})",
        serde_json::json!({"ids": [4, 5]}),
    );
    let pipe = compile(
        "select * from t where id in (${ids | join})",
        serde_json::json!({"ids": [4, 5]}),
    );
    assert_eq!(call.sql, "select * from t where id in (?,?)");
    assert_eq!(call.sql, pipe.sql);
    assert_eq!(call.params, pipe.params);
}

#[test]
fn empty_join_expands_to_zero_placeholders() {
    let compiled = compile(
        "select * from t where id in (${join(ids)})",
        serde_json::json!({"ids": []}),
    );
    assert_eq!(compiled.sql, "select * from t where id in ()");
    assert!(compiled.params.is_empty());
}

#[test]
fn conditional_directive_guards_placeholder() {
    let text = "select * from user where 1=1 \
                {% if age is defined %}and age > ${age}{% endif %}";
    let with = compile(text, serde_json::json!({"age": 18}));
    assert_eq!(with.sql, "select * from user where 1=1 and age > ?");
    assert_eq!(with.params, vec![Value::Int(18)]);

    let without = compile(text, serde_json::json!({}));
    assert_eq!(without.sql.trim_end(), "select * from user where 1=1");
    assert!(without.params.is_empty());
}

#[test]
fn loop_directive_emits_one_placeholder_per_element() {
    let compiled = compile(
        "select * from t where id in (\
         {% for id in ids %}${id}{% if not loop.last %},{% endif %}{% endfor %})",
        serde_json::json!({"ids": [7, 8]}),
    );
    assert_eq!(compiled.sql, "select * from t where id in (?,?)");
    assert_eq!(compiled.params, vec![Value::Int(7), Value::Int(8)]);
}

#[test]
fn compile_is_deterministic() {
    let template = SqlTemplate::new("t", "select * from t where a = ${a} and b like '%${b}%'");
    let vals = values(serde_json::json!({"a": 1, "b": "x"}));
    let first = template.compile(&vals).unwrap();
    let second = template.compile(&vals).unwrap();
    assert_eq!(first, second);
}

#[test]
fn comments_are_stripped_and_semicolon_tolerated() {
    let compiled = compile(
        "# fetch one user\nselect * from user\n# by primary key\nwhere id = ${id};\n",
        serde_json::json!({"id": 9}),
    );
    assert_eq!(compiled.sql, "select * from user where id = ?");
    assert_eq!(compiled.params, vec![Value::Int(9)]);
}

#[test]
fn union_marker_splits_segments() {
    let template = SqlTemplate::new(
        "t",
        "select id from cats where owner = ${owner};\n\
         #loquat-union\n\
         select id from dogs where owner = ${owner};\n",
    );
    assert!(template.has_unions());
    let compiled = template
        .compile(&values(serde_json::json!({"owner": "kate"})))
        .unwrap();
    assert_eq!(compiled.sql, "select id from cats where owner = ?");
    assert_eq!(compiled.params, vec![Value::Str("kate".into())]);
    assert_eq!(compiled.unions.len(), 1);
    assert_eq!(compiled.unions[0].sql, "select id from dogs where owner = ?");
    assert_eq!(compiled.unions[0].params, vec![Value::Str("kate".into())]);
}

#[test]
fn comment_only_template_compiles_to_empty_sql() {
    let compiled = compile("# nothing here\n# still nothing\n", serde_json::json!({}));
    assert_eq!(compiled.sql, "");
    assert!(compiled.params.is_empty());
}

#[test]
fn unresolvable_variable_is_a_template_error() {
    let template = SqlTemplate::new("broken", "select * from t where a = ${missing}");
    let err = template.compile(&values(serde_json::json!({}))).unwrap_err();
    assert!(matches!(err, QueryError::Template { .. }));
}

#[test]
fn variable_roots_cover_placeholders_directives_and_lists() {
    let template = SqlTemplate::new(
        "t",
        "select * from t where id in (${join(ids)}) \
         {% if min_age is defined %}and age > ${min_age}{% endif %}",
    );
    let roots = template.variable_roots();
    assert!(roots.contains(&("ids".to_string(), true)));
    assert!(roots.contains(&("min_age".to_string(), false)));
}
