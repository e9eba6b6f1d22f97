//! # pgqb
//!
//! A fluent, composable SQL builder for Postgres.
//!
//! ## Features
//!
//! - **Four statement builders**: SELECT, INSERT, UPDATE (including batch), DELETE
//! - **Positional parameters**: every bound value becomes a sequential `$n` placeholder
//! - **Composable**: CTEs and subqueries embed pre-rendered statements with
//!   collision-free placeholder renumbering
//! - **Relational sugar**: explicit joins plus `include()` one-to-many JSON aggregation
//! - **Safe defaults**: UPDATE and DELETE require a WHERE unless explicitly overridden
//! - **Build-only**: emits `{sql, params}`; execution stays with the caller
//!
//! ```ignore
//! use pgqb::qb::{self, Render};
//!
//! let q = qb::from("users")
//!     .select(&["id", "name"])
//!     .filter("status", "=", "active")
//!     .order_by("created_at", "desc")
//!     .limit(10)
//!     .render()?;
//!
//! client.query(&q.sql, &q.params_ref()).await?;
//! ```

pub mod error;
pub mod qb;
pub mod value;

pub use error::{QbError, QbResult};
pub use qb::{BuiltQuery, Render};
pub use value::Value;
