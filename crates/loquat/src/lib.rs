//! # loquat
//!
//! A lightweight query-building core for SQL backends.
//!
//! ## Features
//!
//! - **SQL templates**: plain SQL text with `${expr}` placeholders and tera
//!   directives, compiled to positional-parameter statements plus a typed,
//!   ordered bind list
//! - **Criteria builder**: a [`Spec`] of named conditions that compiles to a
//!   WHERE fragment with sanitized identifiers
//! - **Union pagination**: one page assembled across an ordered sequence of
//!   union sub-queries, issuing ranged statements only against the sources
//!   that contribute rows
//! - **Static dispatch**: a startup-populated [`QueryRegistry`] mapping
//!   stable identifiers to prepared statements, criteria factories, or
//!   templates, with a fail-fast template self-check
//! - **Backend-agnostic execution**: statements run through the [`Gateway`]
//!   trait; adapters for `tokio_postgres` clients and transactions ship
//!   in the box
//!
//! ## Criteria
//!
//! ```
//! use loquat::Spec;
//!
//! # fn main() -> loquat::QueryResult<()> {
//! let spec = Spec::new()
//!     .eq("status", "active")?
//!     .gte("age", 18)?
//!     .desc("created_at");
//! let compiled = spec.compile_where(None)?;
//! assert_eq!(compiled.sql, "`status` = ? and `age` >= ?");
//! # Ok(())
//! # }
//! ```
//!
//! ## Templates
//!
//! ```
//! use loquat::SqlTemplate;
//!
//! # fn main() -> loquat::QueryResult<()> {
//! let template = SqlTemplate::new(
//!     "user.by_ids",
//!     "select * from user where id in (${join(ids)})",
//! );
//! let values = serde_json::json!({"ids": [1, 2, 3]});
//! let compiled = template.compile(values.as_object().unwrap())?;
//! assert_eq!(compiled.sql, "select * from user where id in (?,?,?)");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod ident;
pub mod page;
pub mod registry;
pub mod spec;
pub mod sqls;
pub mod template;
pub mod union;
pub mod value;

pub use error::{QueryError, QueryResult};
pub use gateway::Gateway;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use registry::{QueryKind, QueryRegistry};
pub use spec::{CompiledWhere, Op, Sort, Spec};
pub use template::{
    CompiledTemplate, SqlTemplate, TemplateRegistry, TemplateValues, UNION_MARKER,
};
pub use union::{UnionSqlInfo, paginate, paginate_union, paginate_with_count_sql};
pub use value::Value;
