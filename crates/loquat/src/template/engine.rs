//! Placeholder rewriting, template evaluation and typed parameter
//! extraction.
//!
//! Compilation is a three-pass dance over the segment text:
//!
//! 1. every `${expr}` span is rewritten in place to a private marker
//!    `(={ … (|=|)TYPE }=)` whose interpolation and type tag are both
//!    resolved by the template engine;
//! 2. the rewritten text runs through tera, resolving directives and
//!    interpolations while the markers pass through literally;
//! 3. the rendered text is re-scanned for markers left-to-right, each one
//!    emitting `?` placeholder(s) and an ordered, typed bind value.

use super::TemplateValues;
use crate::error::{QueryError, QueryResult};
use crate::sqls;
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tera::{Context, Tera};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\{(.*?)\}").expect("placeholder regex"));

/// Rendered marker, with the quote/percent characters that may hug a LIKE
/// pattern captured around it.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)('?)(%?)\(=\{ (.*?)\(\|=\|\)(string|number|bool|origin|join) \}=\)(%?)('?)")
        .expect("marker regex")
});

static LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\s+)like(\s*?)'$").expect("like regex"));

static JOIN_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*join\s*\((.+)\)\s*$").expect("join call regex"));

/// Argument list of a `join(list, 'sep')` call. The separator is matched
/// greedily from the right so a quoted comma stays inside the separator.
static JOIN_ARGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.*?),\s*'(.*)'\s*$").expect("join args regex"));

static JOIN_PIPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*join\b").expect("join pipe regex"));

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*").expect("ident regex")
});

static FOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"for\s+([A-Za-z_]\w*)\s+in\s+([A-Za-z_][\w.]*)").expect("for regex")
});

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%(.*?)%\}").expect("directive regex"));

/// Inferred type tag of a surviving placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamTag {
    Str,
    Number,
    Bool,
    /// Pass-through: numeric/boolean/string sniffed at substitution time.
    Origin,
}

/// Compile one template segment to `(sql, params)`.
pub(super) fn compile_segment(
    name: &str,
    segment: &str,
    values: &TemplateValues,
) -> QueryResult<(String, Vec<Value>)> {
    if segment.trim().is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    let rewritten = rewrite_placeholders(segment);

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_filter("join", join_filter);
    tera.register_filter("type_tag", type_tag_filter);
    let ctx = Context::from_serialize(values)
        .map_err(|e| QueryError::template(name, tera_message(&e)))?;
    let rendered = tera
        .render_str(&rewritten, &ctx)
        .map_err(|e| QueryError::template(name, tera_message(&e)))?;

    Ok(extract_params(&rendered))
}

/// Rewrite every `${expr}` span into the private marker format.
fn rewrite_placeholders(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() * 2);
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(segment) {
        let m = caps.get(0).expect("whole match");
        let expr = caps[1].trim().to_string();
        out.push_str(&segment[last..m.start()]);
        match join_rewrite(&expr) {
            Some(pipe_expr) => {
                out.push_str("(={ {{ ");
                out.push_str(&pipe_expr);
                out.push_str(" }}(|=|)join }=)");
            }
            None => {
                // The second interpolation resolves the runtime type of the
                // same expression to a literal tag.
                out.push_str("(={ {{ ");
                out.push_str(&expr);
                out.push_str(" }}(|=|){{ ");
                out.push_str(&expr);
                out.push_str(" | type_tag }} }=)");
            }
        }
        last = m.end();
    }
    out.push_str(&segment[last..]);
    out
}

/// Detect a list-expansion helper call and normalize it to the `join`
/// filter: `join(ids)` and `join(ids, ',')` become `ids | join`; an
/// expression already piping into `join` is used as-is.
fn join_rewrite(expr: &str) -> Option<String> {
    if let Some(caps) = JOIN_CALL_RE.captures(expr) {
        let args = caps[1].trim().to_string();
        if let Some(arg_caps) = JOIN_ARGS_RE.captures(&args) {
            return Some(format!(
                "{} | join(sep=\"{}\")",
                arg_caps[1].trim(),
                &arg_caps[2]
            ));
        }
        return Some(format!("{args} | join"));
    }
    if JOIN_PIPE_RE.is_match(expr) {
        return Some(expr.to_string());
    }
    None
}

/// Re-scan the rendered text for markers, emitting `?` placeholders and
/// collecting typed raw values in emission order.
fn extract_params(rendered: &str) -> (String, Vec<Value>) {
    let mut sql = String::with_capacity(rendered.len());
    let mut raws: Vec<(String, ParamTag)> = Vec::new();
    let mut last = 0;

    for caps in MARKER_RE.captures_iter(rendered) {
        let m = caps.get(0).expect("whole match");
        let tag = &caps[4];
        let val = format!("{}{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[5], &caps[6]);

        if tag == "join" {
            sql.push_str(&rendered[last..m.start()]);
            push_join_elements(&mut sql, &mut raws, val.trim());
        } else {
            let tag = match tag {
                "string" => ParamTag::Str,
                "number" => ParamTag::Number,
                "bool" => ParamTag::Bool,
                _ => ParamTag::Origin,
            };
            // LIKE pattern: the placeholder sits inside single quotes right
            // after the keyword; the quotes are consumed, the pattern binds.
            let like_ctx = {
                let mut pre = rendered[last..m.start()].to_string();
                pre.push_str(&caps[1]);
                LIKE_RE.is_match(&pre)
            };
            sql.push_str(&rendered[last..m.start()]);
            sql.push('?');
            if like_ctx {
                let pattern = val.strip_prefix('\'').unwrap_or(&val);
                let pattern = pattern.strip_suffix('\'').unwrap_or(pattern);
                raws.push((pattern.to_string(), tag));
            } else {
                raws.push((val, tag));
            }
        }
        last = m.end();
    }
    sql.push_str(&rendered[last..]);

    let params = raws
        .into_iter()
        .map(|(raw, tag)| coerce(&raw, tag))
        .collect();
    (sqls::wipe_end_semicolon(&sql), params)
}

/// Expand a rendered join list into one `?` per element.
///
/// A list that rendered to nothing expands to zero placeholders; upstream
/// criteria validation is where empty lists get rejected.
fn push_join_elements(sql: &mut String, raws: &mut Vec<(String, ParamTag)>, body: &str) {
    if body.is_empty() {
        return;
    }
    let is_str = body.ends_with('\'');
    let elements: Vec<&str> = if is_str {
        body.split("',").collect()
    } else {
        body.split(',').collect()
    };
    for (i, cur) in elements.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push('?');
        let starts = cur.starts_with('\'');
        let ends = cur.ends_with('\'');
        if is_str && (starts || ends) {
            let inner = &cur[usize::from(starts)..cur.len() - usize::from(ends)];
            raws.push((inner.to_string(), ParamTag::Str));
        } else {
            raws.push((cur.to_string(), ParamTag::Origin));
        }
    }
}

fn coerce(raw: &str, tag: ParamTag) -> Value {
    match tag {
        ParamTag::Str => Value::Str(raw.to_string()),
        ParamTag::Number => Value::number(raw),
        ParamTag::Bool => Value::Bool(raw.eq_ignore_ascii_case("true")),
        ParamTag::Origin => Value::sniff(raw),
    }
}

/// The list-joining helper exposed to templates.
///
/// String elements are single-quoted and joined with commas so the
/// downstream scan can recover them element-by-element; other scalars join
/// with the separator (default `,`).
fn join_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let arr = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("join expects a list value"))?;
    let sep = args
        .get("sep")
        .and_then(|v| v.as_str())
        .unwrap_or(",")
        .to_string();
    let strings = arr.first().map(|v| v.is_string()).unwrap_or(false);
    let rendered = if strings {
        arr.iter()
            .map(|v| format!("'{}'", v.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        arr.iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(&sep)
    };
    Ok(tera::Value::String(rendered))
}

/// Renders the runtime type of a value as the literal tag the marker scan
/// recognizes.
fn type_tag_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let tag = match value {
        tera::Value::String(_) => "string",
        tera::Value::Number(_) => "number",
        tera::Value::Bool(_) => "bool",
        _ => "origin",
    };
    Ok(tera::Value::String(tag.to_string()))
}

fn render_scalar(v: &tera::Value) -> String {
    match v {
        tera::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a tera error chain into one message.
fn tera_message(err: &tera::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// Directive keywords, literals and filter names that look like variable
/// references but are not.
const NON_VARIABLES: &[&str] = &[
    "if", "elif", "else", "endif", "for", "endfor", "in", "and", "or", "not", "is", "set",
    "endset", "true", "false", "loop", "join", "sep", "string", "number", "defined",
];

/// Collect `(variable_root, is_list)` pairs referenced by a raw segment.
/// Used only for the registry self-check's synthetic sample values.
pub(super) fn collect_roots(segment: &str, out: &mut Vec<(String, bool)>) {
    let mut loop_vars: Vec<String> = Vec::new();

    for caps in DIRECTIVE_RE.captures_iter(segment) {
        let inner = &caps[1];
        for fc in FOR_RE.captures_iter(inner) {
            loop_vars.push(fc[1].to_string());
            push_root(&fc[2], true, &[], out);
        }
        for ident in IDENT_RE.find_iter(inner) {
            push_root(ident.as_str(), false, &loop_vars, out);
        }
    }
    for caps in PLACEHOLDER_RE.captures_iter(segment) {
        let expr = caps[1].trim();
        let is_join = join_rewrite(expr).is_some();
        for ident in IDENT_RE.find_iter(expr) {
            push_root(ident.as_str(), is_join, &loop_vars, out);
        }
    }
}

fn push_root(name: &str, is_list: bool, skip: &[String], out: &mut Vec<(String, bool)>) {
    let root = name.split('.').next().unwrap_or(name);
    if NON_VARIABLES.contains(&root) || skip.iter().any(|v| v == root) {
        return;
    }
    match out.iter_mut().find(|(n, _)| n == name) {
        Some(entry) => entry.1 |= is_list,
        None => out.push((name.to_string(), is_list)),
    }
}
