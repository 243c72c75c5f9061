//! SQL text utilities shared by the template compiler and the paginators.

use crate::value::Value;

/// Strip a single trailing statement terminator (plus surrounding space).
pub fn wipe_end_semicolon(sql: &str) -> String {
    let trimmed = sql.trim();
    match trimmed.strip_suffix(';') {
        Some(rest) => rest.trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

/// Derive a COUNT query from a SELECT.
///
/// A trailing top-level ORDER BY is truncated (its placeholders disappear
/// with it; callers must truncate their parameter lists to match, see
/// [`placeholder_count`]), then the remainder is wrapped in a counting
/// subquery. Wrapping keeps GROUP BY and set-operation queries correct: the
/// count is over the produced rows, not the scanned ones.
pub fn count_sql(sql: &str) -> String {
    let body = truncate_order_by(&wipe_end_semicolon(sql));
    format!("SELECT count(*) FROM ({}) t_count", body.trim())
}

/// Render a ranged sub-query. `limit … offset …` keeps the statement
/// portable across backends, unlike the two-argument `limit` form.
pub fn limit_query(sql: &str, start: u64, size: u64) -> String {
    format!("{} limit {size} offset {start}", wipe_end_semicolon(sql))
}

/// Number of `?` placeholders in `sql`, ignoring those inside string literals.
pub fn placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' if in_string => {
                // '' is an escaped quote inside a literal
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            '\'' => in_string = true,
            '?' if !in_string => count += 1,
            _ => {}
        }
    }
    count
}

/// Interpolate params into `?` slots for tracing output.
///
/// Strings are single-quoted with `\` and `'` escaped. This is a debugging
/// rendition only; executed SQL always goes out parameterized.
pub fn real_sql(sql: &str, params: &[Value]) -> String {
    if params.is_empty() {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut next = 0;
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string && next < params.len() => {
                render_param(&mut out, &params[next]);
                next += 1;
            }
            _ => out.push(ch),
        }
    }
    out
}

fn render_param(out: &mut String, value: &Value) {
    match value {
        Value::Str(s) => {
            out.push('\'');
            for ch in s.chars() {
                match ch {
                    '\\' => out.push_str("\\\\"),
                    '\'' => out.push_str("\\'"),
                    _ => out.push(ch),
                }
            }
            out.push('\'');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Truncate a trailing top-level ORDER BY clause.
///
/// "Top-level" means paren depth zero and outside string literals; an ORDER
/// BY inside a subquery is left alone.
fn truncate_order_by(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let lower = sql.to_ascii_lowercase();
    let lower_bytes = lower.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut cut: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i];
        if in_string {
            if ch == b'\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match ch {
            b'\'' => in_string = true,
            b'(' => depth += 1,
            b')' => depth -= 1,
            b'o' | b'O' if depth == 0 => {
                if keyword_at(lower_bytes, i, b"order")
                    && let Some(j) = skip_ws(lower_bytes, i + 5)
                    && keyword_at(lower_bytes, j, b"by")
                {
                    cut = Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    match cut {
        Some(idx) => sql[..idx].trim_end().to_string(),
        None => sql.to_string(),
    }
}

/// True if `word` starts at `i` on a word boundary.
fn keyword_at(lower: &[u8], i: usize, word: &[u8]) -> bool {
    if i + word.len() > lower.len() || &lower[i..i + word.len()] != word {
        return false;
    }
    let before_ok = i == 0 || !lower[i - 1].is_ascii_alphanumeric() && lower[i - 1] != b'_';
    let after = i + word.len();
    let after_ok =
        after == lower.len() || !lower[after].is_ascii_alphanumeric() && lower[after] != b'_';
    before_ok && after_ok
}

/// Index of the first non-whitespace byte at or after `i`, if any whitespace
/// was actually skipped.
fn skip_ws(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    (j > i && j < bytes.len()).then_some(j)
}
