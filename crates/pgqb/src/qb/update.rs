//! UPDATE statement assembler, single-row and batch modes.
//!
//! SET values always claim the leading placeholder slots, so WHERE
//! predicates are kept structured and rendered only at build time. This is
//! also why the two modes exist on one builder: both defer everything.

use crate::error::{QbError, QbResult};
use crate::qb::param::ParamList;
use crate::qb::predicate::{compile_predicates, CmpOp, ColumnRef, Connective, InStyle, Predicate};
use crate::qb::traits::Render;
use crate::qb::{trace_render, BuiltQuery, Table};
use crate::value::Value;

/// One batch-update row: equality conditions plus the columns to set when
/// they match.
#[derive(Clone, Debug, Default)]
pub struct BatchEntry {
    pub(crate) conds: Vec<(String, Value)>,
    pub(crate) sets: Vec<(String, Value)>,
}

impl BatchEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality condition selecting this row.
    pub fn filter_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conds.push((column.to_string(), value.into()));
        self
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.sets.push((column.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Default)]
struct UpdateDraft {
    error: Option<QbError>,
    sets: Vec<(String, Value)>,
    predicates: Vec<Predicate>,
    batch: Vec<BatchEntry>,
    returning: Vec<String>,
    allow_unsafe: bool,
}

/// Fluent UPDATE builder.
///
/// Single mode (`set` + `filter`) and batch mode (`batch`) are mutually
/// exclusive. `IN` predicates here render as `= ANY($n)`, binding the list
/// as one parameter.
#[derive(Debug)]
pub struct UpdateQb {
    table: Table,
    draft: UpdateDraft,
}

impl UpdateQb {
    pub(crate) fn new(table: Table) -> Self {
        UpdateQb {
            table,
            draft: UpdateDraft::default(),
        }
    }

    fn fail(mut self, err: QbError) -> Self {
        if self.draft.error.is_none() {
            self.draft.error = Some(err);
        }
        self
    }

    /// Assign one column. NULL is a legal assignment value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        if !self.draft.batch.is_empty() {
            return self.fail(QbError::validation(
                "set() cannot be combined with batch()",
            ));
        }
        self.draft.sets.push((column.to_string(), value.into()));
        self
    }

    /// AND predicate. Validated now, rendered at build time after the SET
    /// values have been numbered.
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
        if let Err(e) = Predicate::check(column, op, &value) {
            return self.fail(e);
        }
        self.draft.predicates.push(Predicate {
            conn,
            column: ColumnRef::parse(column),
            op,
            value,
        });
        self
    }

    /// Switch to batch mode. Each entry carries its own conditions, so the
    /// mandatory-WHERE rule does not apply.
    pub fn batch(mut self, entries: Vec<BatchEntry>) -> Self {
        if !self.draft.sets.is_empty() || !self.draft.predicates.is_empty() {
            return self.fail(QbError::validation(
                "batch() cannot be combined with set()/filter()",
            ));
        }
        if entries.is_empty() {
            return self.fail(QbError::NoRows);
        }
        for entry in &entries {
            for (col, val) in &entry.conds {
                if let Err(e) = Predicate::check(col, CmpOp::Eq, val) {
                    return self.fail(e);
                }
            }
        }
        self.draft.batch = entries;
        self
    }

    /// Permit rendering without any WHERE predicate.
    pub fn allow_unsafe_update(mut self) -> Self {
        self.draft.allow_unsafe = true;
        self
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.draft
            .returning
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    fn render_single(&self, d: UpdateDraft) -> QbResult<BuiltQuery> {
        if d.sets.is_empty() {
            return Err(QbError::validation("UPDATE requires at least one SET column"));
        }
        if d.predicates.is_empty() && !d.allow_unsafe {
            return Err(QbError::MissingWhere("update"));
        }

        let mut params = ParamList::new();
        let assignments: Vec<String> = d
            .sets
            .into_iter()
            .map(|(col, val)| {
                let idx = params.push(val);
                format!("{col} = ${idx}")
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table.name,
            assignments.join(", ")
        );
        if let Some(body) = compile_predicates(&d.predicates, None, InStyle::Any, &mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&body);
        }
        if !d.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&d.returning.join(", "));
        }

        Ok(BuiltQuery {
            sql,
            params: params.into_values(),
        })
    }

    /// Render one entry's conditions as an AND chain, binding each value.
    fn row_predicate(entry: &BatchEntry, params: &mut ParamList) -> String {
        let parts: Vec<String> = entry
            .conds
            .iter()
            .map(|(col, val)| {
                let idx = params.push(val.clone());
                format!("{col} = ${idx}")
            })
            .collect();
        parts.join(" AND ")
    }

    fn render_batch(&self, d: UpdateDraft) -> QbResult<BuiltQuery> {
        for entry in &d.batch {
            if entry.conds.is_empty() {
                return Err(QbError::validation("batch entry without conditions"));
            }
            if entry.sets.is_empty() {
                return Err(QbError::validation("batch entry without SET columns"));
            }
        }

        // Distinct set columns, first-seen order.
        let mut columns: Vec<String> = Vec::new();
        for entry in &d.batch {
            for (col, _) in &entry.sets {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut params = ParamList::new();
        let mut assignments = Vec::with_capacity(columns.len());
        for col in &columns {
            let mut arms = Vec::new();
            for entry in &d.batch {
                let Some((_, val)) = entry.sets.iter().find(|(c, _)| c == col) else {
                    continue;
                };
                let pred = Self::row_predicate(entry, &mut params);
                let idx = params.push(val.clone());
                arms.push(format!("WHEN {pred} THEN ${idx}"));
            }
            assignments.push(format!("{col} = CASE {} ELSE {col} END", arms.join(" ")));
        }

        let row_filters: Vec<String> = d
            .batch
            .iter()
            .map(|entry| format!("({})", Self::row_predicate(entry, &mut params)))
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table.name,
            assignments.join(", "),
            row_filters.join(" OR ")
        );
        if !d.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&d.returning.join(", "));
        }

        Ok(BuiltQuery {
            sql,
            params: params.into_values(),
        })
    }
}

impl Render for UpdateQb {
    fn render(&mut self) -> QbResult<BuiltQuery> {
        let d = std::mem::take(&mut self.draft);
        if let Some(e) = d.error {
            return Err(e);
        }
        let built = if d.batch.is_empty() {
            self.render_single(d)?
        } else {
            self.render_batch(d)?
        };
        trace_render("update", &built);
        Ok(built)
    }
}
