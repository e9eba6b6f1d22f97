//! INSERT statement assembler.

use crate::error::{QbError, QbResult};
use crate::qb::param::ParamList;
use crate::qb::traits::Render;
use crate::qb::{trace_render, BuiltQuery, RowValues, Table};
use crate::value::Value;

#[derive(Clone, Debug)]
enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<String>),
}

#[derive(Clone, Debug)]
struct Conflict {
    target: Vec<String>,
    action: ConflictAction,
}

#[derive(Debug, Default)]
struct InsertDraft {
    error: Option<QbError>,
    rows: Vec<RowValues>,
    returning: Vec<String>,
    conflict: Option<Conflict>,
}

/// Fluent INSERT builder.
///
/// The column list comes from the first row; all rows are assumed to share
/// the same key set and are not cross-checked.
#[derive(Debug)]
pub struct InsertQb {
    table: Table,
    draft: InsertDraft,
}

impl InsertQb {
    pub(crate) fn new(table: Table, rows: Vec<RowValues>) -> Self {
        let error = if rows.is_empty() {
            Some(QbError::NoRows)
        } else {
            None
        };
        InsertQb {
            table,
            draft: InsertDraft {
                error,
                rows,
                ..InsertDraft::default()
            },
        }
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.draft
            .returning
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Start an `ON CONFLICT (columns)` clause.
    pub fn on_conflict(self, columns: &[&str]) -> OnConflictQb {
        OnConflictQb {
            builder: self,
            target: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Conflict target captured; pick the action.
#[derive(Debug)]
pub struct OnConflictQb {
    builder: InsertQb,
    target: Vec<String>,
}

impl OnConflictQb {
    pub fn do_nothing(mut self) -> InsertQb {
        self.builder.draft.conflict = Some(Conflict {
            target: self.target,
            action: ConflictAction::DoNothing,
        });
        self.builder
    }

    pub fn do_update(self) -> OnConflictUpdateQb {
        OnConflictUpdateQb {
            builder: self.builder,
            target: self.target,
            columns: Vec::new(),
        }
    }
}

/// Accumulates `col = EXCLUDED.col` assignments for DO UPDATE.
#[derive(Debug)]
pub struct OnConflictUpdateQb {
    builder: InsertQb,
    target: Vec<String>,
    columns: Vec<String>,
}

impl OnConflictUpdateQb {
    pub fn set_excluded(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    pub fn finish(mut self) -> InsertQb {
        self.builder.draft.conflict = Some(Conflict {
            target: self.target,
            action: ConflictAction::DoUpdate(self.columns),
        });
        self.builder
    }
}

impl Render for InsertQb {
    fn render(&mut self) -> QbResult<BuiltQuery> {
        let d = std::mem::take(&mut self.draft);
        if let Some(e) = d.error {
            return Err(e);
        }

        let columns: Vec<String> = d.rows[0]
            .columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut params = ParamList::new();
        let mut tuples = Vec::with_capacity(d.rows.len());
        for row in d.rows {
            // Rows are read by the first row's keys; a row missing one of
            // them binds NULL rather than failing.
            let values = columns
                .iter()
                .map(|col| {
                    row.entries
                        .iter()
                        .find(|(c, _)| c == col)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Value::Null)
                })
                .collect();
            let placeholders: Vec<String> = params
                .push_many(values)
                .into_iter()
                .map(|idx| format!("${idx}"))
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table.name,
            columns.join(", "),
            tuples.join(", ")
        );

        if let Some(conflict) = d.conflict {
            sql.push_str(&format!(" ON CONFLICT ({})", conflict.target.join(", ")));
            match conflict.action {
                ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
                ConflictAction::DoUpdate(cols) => {
                    let sets: Vec<String> =
                        cols.iter().map(|c| format!("{c} = EXCLUDED.{c}")).collect();
                    sql.push_str(" DO UPDATE SET ");
                    sql.push_str(&sets.join(", "));
                }
            }
        }

        if !d.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&d.returning.join(", "));
        }

        let built = BuiltQuery {
            sql,
            params: params.into_values(),
        };
        trace_render("insert", &built);
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb;
    use crate::value::Value;

    fn user_row(id: i64, name: &str, email: &str) -> RowValues {
        RowValues::new()
            .set("id", id)
            .set("name", name)
            .set("email", email)
    }

    #[test]
    fn empty_row_set_is_rejected() {
        let err = qb::from("users").insert(vec![]).render().unwrap_err();
        assert_eq!(err, QbError::NoRows);
    }

    #[test]
    fn multi_row_insert_with_returning() {
        let q = qb::from("users")
            .insert(vec![user_row(1, "A", "a@x"), user_row(2, "B", "b@x")])
            .returning(&["id"])
            .render()
            .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO users (id, name, email) VALUES ($1, $2, $3), ($4, $5, $6) RETURNING id"
        );
        assert_eq!(q.params.len(), 6);
        assert_eq!(q.params[3], Value::Int(2));
    }

    #[test]
    fn on_conflict_do_nothing() {
        let q = qb::from("users")
            .insert(vec![RowValues::new().set("id", 1)])
            .on_conflict(&["id"])
            .do_nothing()
            .render()
            .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING"
        );
    }

    #[test]
    fn on_conflict_do_update_sets_excluded() {
        let q = qb::from("users")
            .insert(vec![user_row(1, "A", "a@x")])
            .on_conflict(&["id"])
            .do_update()
            .set_excluded("name")
            .set_excluded("email")
            .finish()
            .returning(&["id"])
            .render()
            .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO users (id, name, email) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email \
             RETURNING id"
        );
    }

    #[test]
    fn null_values_bind_as_null() {
        let q = qb::from("users")
            .insert(vec![RowValues::new().set("id", 1).set("bio", Option::<&str>::None)])
            .render()
            .unwrap();
        assert_eq!(q.sql, "INSERT INTO users (id, bio) VALUES ($1, $2)");
        assert_eq!(q.params[1], Value::Null);
    }
}
