//! Trailing-clause and SELECT-list fragment compilers.
//!
//! Each function here is stateless per call: it takes the accumulated
//! structured inputs and renders one clause's SQL text.

use crate::error::QbError;
use crate::qb::param::ParamList;
use crate::qb::predicate::{CmpOp, ColumnRef};
use std::str::FromStr;

/// Sort direction for ORDER BY.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(QbError::InvalidDirection(other.to_string())),
        }
    }
}

/// One ORDER BY entry.
#[derive(Clone, Debug)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: Direction,
}

/// Compile ORDER BY entries, qualifying bare columns with the base alias.
pub fn compile_order_by(items: &[OrderBy], alias: &str) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let parts: Vec<String> = items
        .iter()
        .map(|o| format!("{} {}", o.column.qualify(Some(alias)), o.direction.as_sql()))
        .collect();
    Some(parts.join(", "))
}

/// Compile GROUP BY columns, qualifying bare columns with the base alias.
pub fn compile_group_by(columns: &[ColumnRef], alias: &str) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let parts: Vec<String> = columns.iter().map(|c| c.qualify(Some(alias))).collect();
    Some(parts.join(", "))
}

/// Render one HAVING condition, binding its value.
///
/// The expression is taken raw (typically an aggregate like `COUNT(*)`),
/// never auto-qualified.
pub fn render_having(expr: &str, op: CmpOp, params: &mut ParamList, value: crate::value::Value) -> String {
    let idx = params.push(value);
    format!("{expr} {} ${idx}", op.as_sql())
}

/// Aggregate function for a computed SELECT column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    pub fn as_sql(self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Max => "MAX",
            AggFunc::Min => "MIN",
        }
    }
}

/// Render an aggregate SELECT fragment: `FN(alias.col) AS name`.
pub fn render_aggregate(func: AggFunc, column: &ColumnRef, base_alias: &str, name: &str) -> String {
    format!(
        "{}({}) AS {}",
        func.as_sql(),
        column.qualify(Some(base_alias)),
        name
    )
}

/// Window function for a computed SELECT column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowFunc {
    RowNumber,
    Rank,
    DenseRank,
    Ntile,
    Lead,
    Lag,
    FirstValue,
    LastValue,
    NthValue,
    CumeDist,
    PercentRank,
    PercentileCont,
    PercentileDisc,
}

impl WindowFunc {
    pub fn as_sql(self) -> &'static str {
        match self {
            WindowFunc::RowNumber => "ROW_NUMBER",
            WindowFunc::Rank => "RANK",
            WindowFunc::DenseRank => "DENSE_RANK",
            WindowFunc::Ntile => "NTILE",
            WindowFunc::Lead => "LEAD",
            WindowFunc::Lag => "LAG",
            WindowFunc::FirstValue => "FIRST_VALUE",
            WindowFunc::LastValue => "LAST_VALUE",
            WindowFunc::NthValue => "NTH_VALUE",
            WindowFunc::CumeDist => "CUME_DIST",
            WindowFunc::PercentRank => "PERCENT_RANK",
            WindowFunc::PercentileCont => "PERCENTILE_CONT",
            WindowFunc::PercentileDisc => "PERCENTILE_DISC",
        }
    }
}

/// A window-function SELECT fragment.
#[derive(Clone, Debug)]
pub struct WindowExpr {
    pub func: WindowFunc,
    pub column: Option<ColumnRef>,
    pub name: String,
    pub partition_by: Option<ColumnRef>,
    pub order_by: Option<OrderBy>,
}

impl WindowExpr {
    pub fn new(func: WindowFunc, name: &str) -> Self {
        WindowExpr {
            func,
            column: None,
            name: name.to_string(),
            partition_by: None,
            order_by: None,
        }
    }

    /// Pass a column as the function argument (LEAD, LAG, FIRST_VALUE, ...).
    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(ColumnRef::parse(column));
        self
    }

    pub fn partition_by(mut self, column: &str) -> Self {
        self.partition_by = Some(ColumnRef::parse(column));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            column: ColumnRef::parse(column),
            direction,
        });
        self
    }

    /// Render `FN(alias.col) OVER (PARTITION BY .. ORDER BY ..) AS name`.
    ///
    /// Absent sub-fragments are dropped entirely; with neither present the
    /// clause is exactly `OVER ()`.
    pub fn render(&self, base_alias: &str) -> String {
        let args = self
            .column
            .as_ref()
            .map(|c| c.qualify(Some(base_alias)))
            .unwrap_or_default();

        let mut over_parts = Vec::new();
        if let Some(p) = &self.partition_by {
            over_parts.push(format!("PARTITION BY {}", p.qualify(Some(base_alias))));
        }
        if let Some(o) = &self.order_by {
            over_parts.push(format!(
                "ORDER BY {} {}",
                o.column.qualify(Some(base_alias)),
                o.direction.as_sql()
            ));
        }

        format!(
            "{}({}) OVER ({}) AS {}",
            self.func.as_sql(),
            args,
            over_parts.join(" "),
            self.name
        )
    }
}
