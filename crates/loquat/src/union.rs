//! Windowed pagination over one or more ordered row sources.
//!
//! A union query is an ordered sequence of independent SELECTs treated as
//! one logical result set. One page is assembled by counting each source,
//! then issuing ranged sub-queries only against the sources that actually
//! contribute rows to the requested window.

use crate::error::QueryResult;
use crate::gateway::Gateway;
use crate::page::{Page, PageRequest};
use crate::sqls;
use crate::value::Value;

/// One row source: its SQL, bind values and, once known, its row count.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSqlInfo {
    pub sql: String,
    pub params: Vec<Value>,
    /// Filled in by the merger's COUNT pass; pre-set it to skip that pass.
    pub count: Option<u64>,
}

impl UnionSqlInfo {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Fetch one page from a single query.
///
/// The total comes from the request when the caller cached it from a
/// previous page, otherwise from a derived COUNT query. The first page
/// always recounts: a cached total is a hint carried between pages, and
/// page zero is where a fresh walk of the result set begins.
pub async fn paginate<G: Gateway>(
    gateway: &G,
    sql: &str,
    params: &[Value],
    request: PageRequest,
) -> QueryResult<Page<G::Row>> {
    paginate_with_count_sql(gateway, sql, params, request, sqls::count_sql).await
}

/// [`paginate`] with a caller-supplied COUNT derivation, for queries whose
/// default derived COUNT is wasteful or wrong (e.g. an expensive select
/// list that a hand-written count can skip).
pub async fn paginate_with_count_sql<G, F>(
    gateway: &G,
    sql: &str,
    params: &[Value],
    request: PageRequest,
    count_sql: F,
) -> QueryResult<Page<G::Row>>
where
    G: Gateway,
    F: Fn(&str) -> String,
{
    let mut source = UnionSqlInfo::new(sql, params.to_vec());
    if request.index() > 0 {
        source.count = request.total();
    }
    let total = resolve_count(gateway, &mut source, &count_sql).await?;
    if total == 0 || request.offset() >= total {
        return Ok(Page::new(request, total, Vec::new()));
    }
    let ranged = sqls::limit_query(&source.sql, request.offset(), request.size());
    tracing::debug!(sql = %sqls::real_sql(&ranged, &source.params), "page query");
    let rows = gateway.execute(&ranged, &source.params).await?;
    Ok(Page::new(request, total, rows))
}

/// Fetch one page spanning an ordered sequence of union sources.
///
/// Each source's count is resolved first (and recorded on it), the window
/// `offset..offset+size` is then walked source by source: sources entirely
/// before the window only advance the bookkeeping, and the walk stops as
/// soon as the page is full, so no statement is ever issued against a
/// source contributing zero rows.
pub async fn paginate_union<G: Gateway>(
    gateway: &G,
    sources: &mut [UnionSqlInfo],
    request: PageRequest,
) -> QueryResult<Page<G::Row>> {
    let mut total: u64 = 0;
    for source in sources.iter_mut() {
        total += resolve_count(gateway, source, &sqls::count_sql).await?;
    }
    if total == 0 {
        return Ok(Page::new(request, 0, Vec::new()));
    }

    let mut data = Vec::with_capacity(request.size() as usize);
    let mut remaining = request.size();
    let mut cursor = request.offset();
    let mut cumulative: u64 = 0;
    for source in sources.iter() {
        if remaining == 0 {
            break;
        }
        let count = source.count.unwrap_or(0);
        if cumulative + count <= cursor {
            cumulative += count;
            continue;
        }
        // A source can hand back fewer rows than it counted (rows deleted
        // between the two passes), leaving the cursor behind the running
        // count. Clamp instead of trusting the arithmetic.
        let local_start = cursor.saturating_sub(cumulative);
        let take = remaining.min(count.saturating_sub(local_start));
        if take == 0 {
            cumulative += count;
            continue;
        }
        let ranged = sqls::limit_query(&source.sql, local_start, take);
        tracing::debug!(sql = %sqls::real_sql(&ranged, &source.params), "union page query");
        let rows = gateway.execute(&ranged, &source.params).await?;
        let got = rows.len() as u64;
        data.extend(rows);
        remaining = remaining.saturating_sub(got);
        cursor += got;
        cumulative += count;
    }
    Ok(Page::new(request, total, data))
}

/// Resolve a source's row count, deriving and running a COUNT query when it
/// is not already known.
///
/// Stripping a trailing ORDER BY can strip placeholders with it; the bind
/// list is truncated to however many placeholders survived.
async fn resolve_count<G, F>(
    gateway: &G,
    source: &mut UnionSqlInfo,
    count_sql: &F,
) -> QueryResult<u64>
where
    G: Gateway,
    F: Fn(&str) -> String,
{
    if let Some(count) = source.count {
        return Ok(count);
    }
    let count_sql = count_sql(&source.sql);
    let kept = sqls::placeholder_count(&count_sql).min(source.params.len());
    let params = &source.params[..kept];
    tracing::debug!(sql = %sqls::real_sql(&count_sql, params), "union count query");
    let value = gateway.execute_scalar(&count_sql, params).await?;
    let count = value.as_i64().unwrap_or(0).max(0) as u64;
    source.count = Some(count);
    Ok(count)
}
