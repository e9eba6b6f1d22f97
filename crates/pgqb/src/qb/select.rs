//! SELECT statement assembler.

use crate::error::{QbError, QbResult};
use crate::qb::clause::{
    compile_group_by, compile_order_by, render_aggregate, render_having, AggFunc, Direction,
    OrderBy, WindowExpr,
};
use crate::qb::cte::{prefix_with, CteEntry};
use crate::qb::join::{Include, Join, JoinKind};
use crate::qb::param::ParamList;
use crate::qb::predicate::{CmpOp, ColumnRef, Connective, InStyle, Predicate, WhereClause};
use crate::qb::traits::Render;
use crate::qb::{trace_render, BuiltQuery, Table};
use crate::value::Value;

/// Mutable clause state for one SELECT under construction.
///
/// Taken wholesale at render time so the builder restarts clean.
#[derive(Debug, Default)]
struct SelectDraft {
    error: Option<QbError>,
    distinct: bool,
    columns: Vec<String>,
    computed: Vec<String>,
    joins: Vec<Join>,
    includes: Vec<Include>,
    wheres: WhereClause,
    having: Vec<String>,
    group_by: Vec<ColumnRef>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    ctes: Vec<CteEntry>,
    params: ParamList,
}

/// Fluent SELECT builder.
///
/// WHERE values and subquery parameters are bound eagerly, in call order;
/// embedding a subquery after three predicates gives its placeholders the
/// next slots after those three. Errors raised by a chained call are held
/// and surfaced by `render()`.
#[derive(Debug)]
pub struct SelectQb {
    table: Table,
    draft: SelectDraft,
}

impl SelectQb {
    pub(crate) fn new(table: Table) -> Self {
        SelectQb {
            table,
            draft: SelectDraft::default(),
        }
    }

    fn fail(mut self, err: QbError) -> Self {
        if self.draft.error.is_none() {
            self.draft.error = Some(err);
        }
        self
    }

    /// Add explicit columns to the projection, as written.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.draft
            .columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.draft.distinct = true;
        self
    }

    /// AND predicate: `alias.column <op> $n`.
    pub fn filter(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_predicate(Connective::And, column, op, value.into())
    }

    /// OR predicate, chained after the AND group.
    pub fn or_filter(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_predicate(Connective::Or, column, op, value.into())
    }

    fn push_predicate(mut self, conn: Connective, column: &str, op: &str, value: Value) -> Self {
        let op = match CmpOp::parse(op) {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };
        let column = ColumnRef::parse(column);
        let alias = self.table.alias.clone();
        if let Err(e) = self.draft.wheres.push(
            conn,
            &column,
            Some(&alias),
            op,
            value,
            InStyle::Placeholders,
            &mut self.draft.params,
        ) {
            return self.fail(e);
        }
        self
    }

    /// Aggregate projection: `FN(alias.col) AS name`.
    pub fn aggregate(mut self, func: AggFunc, column: &str, name: &str) -> Self {
        let fragment = render_aggregate(
            func,
            &ColumnRef::parse(column),
            &self.table.alias,
            name,
        );
        self.draft.computed.push(fragment);
        self
    }

    /// Window-function projection.
    pub fn window(mut self, expr: WindowExpr) -> Self {
        let fragment = expr.render(&self.table.alias);
        self.draft.computed.push(fragment);
        self
    }

    /// Explicit join with the foreign table aliased to its own name.
    pub fn join(self, kind: JoinKind, table: &str, local_column: &str, foreign_column: &str) -> Self {
        self.join_as(kind, table, local_column, foreign_column, table, &[])
    }

    /// Explicit join with alias and projected columns.
    pub fn join_as(
        mut self,
        kind: JoinKind,
        table: &str,
        local_column: &str,
        foreign_column: &str,
        alias: &str,
        projection: &[&str],
    ) -> Self {
        self.draft.joins.push(Join {
            kind,
            local_table: self.table.name.clone(),
            local_column: local_column.to_string(),
            foreign_table: table.to_string(),
            foreign_column: foreign_column.to_string(),
            alias: alias.to_string(),
            projection: projection.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// One-to-many expansion aggregating the joined rows wholesale.
    ///
    /// Requires at least one prior explicit `select()` column, since the
    /// grouping list is derived from the base projection.
    pub fn include(self, table: &str, local_column: &str, foreign_column: &str) -> Self {
        self.include_with(table, local_column, foreign_column, &[])
    }

    /// One-to-many expansion projecting specific columns into JSON objects.
    pub fn include_with(
        mut self,
        table: &str,
        local_column: &str,
        foreign_column: &str,
        projection: &[&str],
    ) -> Self {
        if self.draft.columns.is_empty() {
            return self.fail(QbError::IncludeWithoutSelect(table.to_string()));
        }
        self.draft.includes.push(Include {
            foreign_table: table.to_string(),
            foreign_column: foreign_column.to_string(),
            local_column: local_column.to_string(),
            alias: table.to_string(),
            projection: projection.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Embed a pre-rendered subquery into the projection: `(sql) AS alias`.
    ///
    /// The subquery's placeholders are renumbered past the parameters bound
    /// so far, so call order matters.
    pub fn select_subquery(mut self, alias: &str, sub: &BuiltQuery) -> Self {
        let shifted = self.draft.params.embed(&sub.sql, &sub.params);
        self.draft.computed.push(format!("({shifted}) AS {alias}"));
        self
    }

    /// Embed a pre-rendered subquery as a WHERE operand: `alias.col <op> (sql)`.
    pub fn where_subquery(mut self, column: &str, op: &str, sub: &BuiltQuery) -> Self {
        let op = match CmpOp::parse(op) {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };
        let column_sql = ColumnRef::parse(column).qualify(Some(&self.table.alias));
        let shifted = self.draft.params.embed(&sub.sql, &sub.params);
        self.draft
            .wheres
            .push_fragment(format!("{column_sql} {} ({shifted})", op.as_sql()));
        self
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.draft
            .group_by
            .extend(columns.iter().map(|c| ColumnRef::parse(c)));
        self
    }

    /// HAVING over a raw expression, typically an aggregate. The expression
    /// is not auto-qualified.
    pub fn having(mut self, expr: &str, op: &str, value: impl Into<Value>) -> Self {
        let op = match CmpOp::parse(op) {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };
        let value = value.into();
        if let Err(e) = Predicate::check(expr, op, &value) {
            return self.fail(e);
        }
        let fragment = render_having(expr, op, &mut self.draft.params, value);
        self.draft.having.push(fragment);
        self
    }

    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        let direction = match direction.parse::<Direction>() {
            Ok(d) => d,
            Err(e) => return self.fail(e),
        };
        self.draft.order_by.push(OrderBy {
            column: ColumnRef::parse(column),
            direction,
        });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.draft.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.draft.offset = Some(n);
        self
    }

    /// Register a CTE from an already-rendered statement.
    pub fn with(mut self, name: &str, sub: BuiltQuery) -> Self {
        self.draft.ctes.push(CteEntry {
            name: name.to_string(),
            sql: sub.sql,
            params: sub.params,
        });
        self
    }

    /// Grouping list used when includes force a GROUP BY and the caller
    /// gave none: every explicit base column plus every join projection.
    fn implicit_group_by(draft: &SelectDraft, alias: &str) -> String {
        let mut cols: Vec<String> = draft
            .columns
            .iter()
            .map(|c| ColumnRef::parse(c).qualify(Some(alias)))
            .collect();
        for join in &draft.joins {
            cols.extend(join.render_projection());
        }
        cols.join(", ")
    }
}

impl Render for SelectQb {
    fn render(&mut self) -> QbResult<BuiltQuery> {
        let d = std::mem::take(&mut self.draft);
        if let Some(e) = d.error {
            return Err(e);
        }
        let alias = &self.table.alias;

        let mut projection: Vec<String> = d.columns.clone();
        projection.extend(d.computed.iter().cloned());
        for join in &d.joins {
            projection.extend(join.render_projection());
        }
        for inc in &d.includes {
            projection.push(inc.render_projection());
        }
        let list = if projection.is_empty() {
            "*".to_string()
        } else {
            projection.join(", ")
        };

        let mut sql = String::from("SELECT ");
        if d.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&list);
        sql.push_str(" FROM ");
        sql.push_str(&self.table.render_from());

        let cte_names: Vec<String> = d.ctes.iter().map(|c| c.name.clone()).collect();
        for join in &d.joins {
            sql.push(' ');
            sql.push_str(&join.render_join(&cte_names));
        }
        for inc in &d.includes {
            sql.push(' ');
            sql.push_str(&inc.render_join());
        }

        if let Some(body) = d.wheres.compile() {
            sql.push_str(" WHERE ");
            sql.push_str(&body);
        }

        if let Some(cols) = compile_group_by(&d.group_by, alias) {
            sql.push_str(" GROUP BY ");
            sql.push_str(&cols);
        } else if !d.includes.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&Self::implicit_group_by(&d, alias));
        }

        if !d.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&d.having.join(" AND "));
        }

        if let Some(order) = compile_order_by(&d.order_by, alias) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        if let Some(n) = d.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(n) = d.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        let mut params = ParamList::new();
        let sql = prefix_with(&d.ctes, sql, d.params.into_values(), &mut params);

        let built = BuiltQuery {
            sql,
            params: params.into_values(),
        };
        trace_render("select", &built);
        Ok(built)
    }
}
