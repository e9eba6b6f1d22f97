//! DELETE statement assembler.

use crate::error::{QbError, QbResult};
use crate::qb::param::ParamList;
use crate::qb::predicate::{CmpOp, ColumnRef, Connective, InStyle, WhereClause};
use crate::qb::traits::Render;
use crate::qb::{trace_render, BuiltQuery, Table};
use crate::value::Value;

#[derive(Debug, Default)]
struct DeleteDraft {
    error: Option<QbError>,
    wheres: WhereClause,
    returning: Vec<String>,
    allow_unsafe: bool,
    params: ParamList,
}

/// Fluent DELETE builder. `IN` predicates splat into a placeholder list,
/// matching the SELECT idiom.
#[derive(Debug)]
pub struct DeleteQb {
    table: Table,
    draft: DeleteDraft,
}

impl DeleteQb {
    pub(crate) fn new(table: Table) -> Self {
        DeleteQb {
            table,
            draft: DeleteDraft::default(),
        }
    }

    fn fail(mut self, err: QbError) -> Self {
        if self.draft.error.is_none() {
            self.draft.error = Some(err);
        }
        self
    }

    /// AND predicate: `column <op> $n`.
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
        if let Err(e) = self.draft.wheres.push(
            conn,
            &column,
            None,
            op,
            value,
            InStyle::Placeholders,
            &mut self.draft.params,
        ) {
            return self.fail(e);
        }
        self
    }

    /// Embed a pre-rendered subquery as a WHERE operand.
    pub fn where_subquery(mut self, column: &str, op: &str, sub: &BuiltQuery) -> Self {
        let op = match CmpOp::parse(op) {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };
        let shifted = self.draft.params.embed(&sub.sql, &sub.params);
        self.draft
            .wheres
            .push_fragment(format!("{column} {} ({shifted})", op.as_sql()));
        self
    }

    /// Permit rendering without any WHERE predicate.
    pub fn allow_unsafe_delete(mut self) -> Self {
        self.draft.allow_unsafe = true;
        self
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.draft
            .returning
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }
}

impl Render for DeleteQb {
    fn render(&mut self) -> QbResult<BuiltQuery> {
        let d = std::mem::take(&mut self.draft);
        if let Some(e) = d.error {
            return Err(e);
        }
        if d.wheres.is_empty() && !d.allow_unsafe {
            return Err(QbError::MissingWhere("delete"));
        }

        let mut sql = format!("DELETE FROM {}", self.table.name);
        if let Some(body) = d.wheres.compile() {
            sql.push_str(" WHERE ");
            sql.push_str(&body);
        }
        if !d.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&d.returning.join(", "));
        }

        let built = BuiltQuery {
            sql,
            params: d.params.into_values(),
        };
        trace_render("delete", &built);
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb;

    #[test]
    fn delete_without_where_is_rejected() {
        let err = qb::from("users").delete().render().unwrap_err();
        assert_eq!(err, QbError::MissingWhere("delete"));
    }

    #[test]
    fn unsafe_override_permits_full_delete() {
        let q = qb::from("users")
            .delete()
            .allow_unsafe_delete()
            .render()
            .unwrap();
        assert_eq!(q.sql, "DELETE FROM users");
        assert!(q.params.is_empty());
    }

    #[test]
    fn delete_with_predicates_and_returning() {
        let q = qb::from("users")
            .delete()
            .filter("active", "=", false)
            .or_filter("last_seen", "<", "2020-01-01")
            .returning(&["id"])
            .render()
            .unwrap();
        assert_eq!(
            q.sql,
            "DELETE FROM users WHERE active = $1 AND last_seen < $2 RETURNING id"
        );
    }

    #[test]
    fn in_predicate_splats_placeholders() {
        let q = qb::from("users")
            .delete()
            .filter("id", "in", vec![4, 5])
            .render()
            .unwrap();
        assert_eq!(q.sql, "DELETE FROM users WHERE id IN ($1, $2)");
        assert_eq!(q.params, vec![Value::Int(4), Value::Int(5)]);
    }

    #[test]
    fn subquery_in_where() {
        let sub = qb::from("banned")
            .select(&["user_id"])
            .filter("until", ">", "2026-01-01")
            .render()
            .unwrap();
        let q = qb::from("sessions")
            .delete()
            .filter("stale", "=", true)
            .where_subquery("user_id", "in", &sub)
            .render()
            .unwrap();
        assert_eq!(
            q.sql,
            "DELETE FROM sessions WHERE stale = $1 AND user_id IN \
             (SELECT user_id FROM banned AS banned WHERE banned.until > $2)"
        );
        assert_eq!(q.params, vec![Value::Bool(true), Value::Text("2026-01-01".into())]);
    }
}
