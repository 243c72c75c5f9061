use super::*;

#[test]
fn empty_spec_compiles_to_tautology() {
    let compiled = Spec::new().compile_where(None).unwrap();
    assert_eq!(compiled.sql, "1=1");
    assert!(compiled.params().is_empty());
}

#[test]
fn conditions_render_in_insertion_order() {
    let spec = Spec::new()
        .gte("age", 18)
        .unwrap()
        .eq("status", "active")
        .unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`age` >= ? and `status` = ?");
    assert_eq!(
        compiled.params(),
        vec![Value::Int(18), Value::Str("active".into())]
    );
}

#[test]
fn alias_prefixes_every_field() {
    let spec = Spec::new().eq("name", "bob").unwrap();
    let compiled = spec.compile_where(Some("u")).unwrap();
    assert_eq!(compiled.sql, "u.`name` = ?");
}

#[test]
fn compile_is_idempotent() {
    let spec = Spec::new()
        .eq("a", 1)
        .unwrap()
        .between("b", 2, 3)
        .unwrap();
    let first = spec.compile_where(None).unwrap();
    let second = spec.compile_where(None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn param_count_matches_emitted_placeholders() {
    let spec = Spec::new()
        .eq("a", 1)
        .unwrap()
        .between("b", 10, 20)
        .unwrap()
        .in_list("c", vec![1, 2, 3])
        .unwrap()
        .is_null("d");
    let compiled = spec.compile_where(None).unwrap();
    let placeholders = compiled.sql.matches('?').count();
    let declared: usize = compiled.conditions.iter().map(|c| c.param_count).sum();
    assert_eq!(placeholders, declared);
    assert_eq!(compiled.params().len(), declared);
}

#[test]
fn eq_rejects_blank_values() {
    assert!(Spec::new().eq("name", Value::Null).is_err());
    assert!(Spec::new().eq("name", "").is_err());
    assert!(Spec::new().gt("age", "").is_err());
    assert!(Spec::new().not("age", Value::Null).is_err());
}

#[test]
fn like_rejects_bare_wildcards() {
    assert!(Spec::new().like("name", "%").is_err());
    assert!(Spec::new().like("name", "%%").is_err());
    assert!(Spec::new().not_like("name", "%").is_err());

    let spec = Spec::new().like("name", "%abc%").unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`name` like ?");
    assert_eq!(compiled.params(), vec![Value::Str("%abc%".into())]);
}

#[test]
fn between_emits_two_placeholders_in_order() {
    let spec = Spec::new().between("age", 10, 20).unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`age` between ? and ?");
    assert_eq!(compiled.params(), vec![Value::Int(10), Value::Int(20)]);
    assert_eq!(compiled.conditions[0].param_count, 2);
}

#[test]
fn in_list_rejects_empty_and_expands_placeholders() {
    assert!(Spec::new().in_list("id", Vec::<i64>::new()).is_err());
    assert!(Spec::new().not_in("id", Vec::<i64>::new()).is_err());

    let spec = Spec::new().in_list("id", vec![1, 2, 3]).unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`id` in (?,?,?)");
    assert_eq!(
        compiled.params(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn not_in_renders_negated_keyword() {
    let spec = Spec::new().not_in("id", vec![7]).unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`id` not in (?)");
}

#[test]
fn null_and_empty_checks_bind_nothing() {
    let spec = Spec::new()
        .is_null("a")
        .is_not_null("b")
        .is_empty("c")
        .is_not_empty("d");
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(
        compiled.sql,
        "`a` is null and `b` is not null and `c` = '' and `d` <> ''"
    );
    assert!(compiled.params().is_empty());
}

#[test]
fn or_group_requires_two_members() {
    assert!(Spec::new().or(vec![Spec::new().eq("a", 1).unwrap()]).is_err());
    assert!(Spec::new().and(vec![]).is_err());
}

#[test]
fn group_members_without_conditions_are_rejected() {
    let err = Spec::new()
        .or(vec![Spec::new().eq("a", 1).unwrap(), Spec::new()])
        .unwrap_err();
    assert!(err.is_construction());
    assert!(Spec::new().and(vec![Spec::new()]).is_err());
    // Sorting alone is not a condition.
    assert!(
        Spec::new()
            .and(vec![Spec::new().eq("a", 1).unwrap(), Spec::new().asc("b")])
            .is_err()
    );
}

#[test]
fn or_group_renders_without_inner_parens_for_single_conditions() {
    let spec = Spec::new()
        .or(vec![
            Spec::new().eq("a", 1).unwrap(),
            Spec::new().eq("b", 2).unwrap(),
        ])
        .unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "(`a` = ? or `b` = ?)");
    assert_eq!(compiled.params(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn or_group_parenthesizes_multi_condition_members() {
    let spec = Spec::new()
        .or(vec![
            Spec::new().eq("a", 1).unwrap().eq("b", 2).unwrap(),
            Spec::new().eq("c", 3).unwrap(),
        ])
        .unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "((`a` = ? and `b` = ?) or `c` = ?)");
    assert_eq!(
        compiled.params(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn and_group_joins_members_with_and() {
    let spec = Spec::new()
        .and(vec![
            Spec::new().gte("age", 18).unwrap(),
            Spec::new().lte("age", 65).unwrap(),
        ])
        .unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "(`age` >= ? and `age` <= ?)");
}

#[test]
fn json_contains_without_path_binds_one_param() {
    let spec = Spec::new().json_contains("tags", "rust", None);
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "json_contains(`tags`, ?)");
    assert_eq!(compiled.params(), vec![Value::Str("\"rust\"".into())]);
}

#[test]
fn json_contains_with_path_binds_two_params() {
    let spec = Spec::new().json_contains("doc", 5, Some("$.ids"));
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "json_contains(`doc`, ?, ?)");
    assert_eq!(
        compiled.params(),
        vec![Value::Str("5".into()), Value::Str("$.ids".into())]
    );
}

#[test]
fn resetting_a_condition_replaces_in_place() {
    let spec = Spec::new()
        .eq("a", 1)
        .unwrap()
        .eq("b", 2)
        .unwrap()
        .eq("a", 9)
        .unwrap();
    let compiled = spec.compile_where(None).unwrap();
    assert_eq!(compiled.sql, "`a` = ? and `b` = ?");
    assert_eq!(compiled.params(), vec![Value::Int(9), Value::Int(2)]);
}

#[test]
fn clone_has_value_semantics() {
    let base = Spec::new().eq("tenant", 1).unwrap().asc("id");
    let derived = base.clone().eq("status", "open").unwrap();
    // the original is untouched by mutations of the clone
    assert_eq!(base.condition_count(), 1);
    assert_eq!(derived.condition_count(), 2);
    assert_eq!(base.sort(), derived.sort());
}

#[test]
fn sort_and_limit_metadata_are_carried() {
    let spec = Spec::new()
        .eq("a", 1)
        .unwrap()
        .asc("name")
        .desc("created_at")
        .group_by("dept")
        .having("count(*) > 1")
        .limit(20)
        .limit_begin(40);
    assert_eq!(spec.sort().to_sql(), " order by name, created_at desc");
    assert_eq!(spec.get_group_by(), Some("dept"));
    assert_eq!(spec.get_having(), Some("count(*) > 1"));
    assert_eq!(spec.get_limit(), 20);
    assert_eq!(spec.get_limit_begin(), 40);
}
