//! Safe SQL identifier handling.
//!
//! Criteria compilation never emits a caller-supplied field name verbatim:
//! every name goes through [`quote`] first. Quoting is backtick-based and
//! understands the shapes field lists actually take:
//!
//! - `*` passes through
//! - dotted names quote only the column part: `u.name` → ``u.`name` ``
//! - `col as alias` / `col alias` quote only the column part
//! - already-backticked names pass through unchanged

/// Quote a field name for safe emission into SQL text.
pub fn quote(field: &str) -> String {
    match field.find('.') {
        Some(idx) => {
            let (prefix, col) = field.split_at(idx + 1);
            if col == "*" {
                format!("{prefix}{col}")
            } else {
                format!("{prefix}{}", quote_bare(col))
            }
        }
        None => {
            if field == "*" {
                field.to_string()
            } else {
                quote_bare(field)
            }
        }
    }
}

/// Prefix for a table alias: `"u"` → `"u."`, none → `""`.
pub fn alias_prefix(alias: Option<&str>) -> String {
    match alias {
        Some(a) if !a.trim().is_empty() => format!("{a}."),
        _ => String::new(),
    }
}

/// Quote a single name, preserving an `AS`/space alias suffix.
fn quote_bare(field: &str) -> String {
    let field = field.trim();
    let lower = field.to_ascii_lowercase();
    if let Some(pos) = lower.find(" as ") {
        let col = field[..pos].trim();
        let alias = field[pos + 4..].trim();
        format!("{} {}", backtick(col), alias)
    } else if let Some(pos) = field.find(' ') {
        let col = field[..pos].trim();
        let alias = field[pos..].trim();
        format!("{} {}", backtick(col), alias)
    } else {
        backtick(field)
    }
}

fn backtick(name: &str) -> String {
    if name.starts_with('`') {
        return name.to_string();
    }
    // Embedded backticks are doubled so the quoted form cannot be broken out of.
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for ch in name.chars() {
        if ch == '`' {
            out.push('`');
        }
        out.push(ch);
    }
    out.push('`');
    out
}
