//! Fluent SQL builder core.
//!
//! A statement starts from a root table reference and accumulates clause
//! state through chained calls. The terminal `render()` compiles everything
//! into one immutable `BuiltQuery` and re-arms the builder for reuse.
//!
//! # Usage
//!
//! ```ignore
//! use pgqb::qb;
//!
//! let q = qb::from("users")
//!     .select(&["id", "name"])
//!     .filter("id", "=", 1)
//!     .render()?;
//! assert_eq!(q.sql, "SELECT id, name FROM users AS users WHERE users.id = $1");
//!
//! qb::from("users")
//!     .update()
//!     .set("status", "inactive")
//!     .filter("id", "=", 7)
//!     .render()?;
//! ```

mod clause;
mod cte;
mod delete;
mod insert;
mod join;
mod param;
mod predicate;
mod select;
mod traits;
mod update;


pub use clause::{AggFunc, Direction, OrderBy, WindowExpr, WindowFunc};
pub use cte::CteEntry;
pub use delete::DeleteQb;
pub use insert::{InsertQb, OnConflictQb, OnConflictUpdateQb};
pub use join::{Include, Join, JoinKind};
pub use param::ParamList;
pub use predicate::{CmpOp, ColumnRef, Connective, InStyle, Predicate};
pub use select::SelectQb;
pub use traits::Render;
pub use update::{BatchEntry, UpdateQb};

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// The root table reference for one statement. Fixed once a statement
/// builder is created from it.
#[derive(Clone, Debug)]
pub struct Table {
    pub name: String,
    pub alias: String,
}

impl Table {
    /// `FROM <name> AS <alias>`.
    pub fn render_from(&self) -> String {
        format!("{} AS {}", self.name, self.alias)
    }
}

/// Start a statement on `table`, aliased to its own name.
pub fn from(table: &str) -> Table {
    Table {
        name: table.to_string(),
        alias: table.to_string(),
    }
}

/// Start a statement on `table` with an explicit alias.
pub fn from_as(table: &str, alias: &str) -> Table {
    Table {
        name: table.to_string(),
        alias: alias.to_string(),
    }
}

impl Table {
    /// Begin a SELECT of the given columns.
    pub fn select(self, columns: &[&str]) -> SelectQb {
        SelectQb::new(self).select(columns)
    }

    /// Begin a `SELECT *`.
    pub fn select_all(self) -> SelectQb {
        SelectQb::new(self)
    }

    /// Begin an INSERT of one or more rows.
    pub fn insert(self, rows: Vec<RowValues>) -> InsertQb {
        InsertQb::new(self, rows)
    }

    /// Begin an UPDATE.
    pub fn update(self) -> UpdateQb {
        UpdateQb::new(self)
    }

    /// Begin a DELETE.
    pub fn delete(self) -> DeleteQb {
        DeleteQb::new(self)
    }
}

/// One row of column/value pairs, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct RowValues {
    pub(crate) entries: Vec<(String, Value)>,
}

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.entries.push((column.to_string(), value.into()));
        self
    }

    pub fn columns(&self) -> Vec<&str> {
        self.entries.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The immutable output of a terminal render call.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// Parameter references in the form tokio-postgres expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(feature = "tracing")]
pub(crate) fn trace_render(stmt: &str, built: &BuiltQuery) {
    tracing::debug!(
        target: "pgqb.sql",
        statement = stmt,
        sql = %built.sql,
        params = built.params.len(),
        "rendered"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn trace_render(_stmt: &str, _built: &BuiltQuery) {}
