//! JOIN and include (JSON-aggregated LEFT JOIN) rendering.

/// Join kind for explicit joins. Includes are always LEFT regardless.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        }
    }
}

/// An explicit JOIN against another table or a registered CTE.
#[derive(Clone, Debug)]
pub struct Join {
    pub kind: JoinKind,
    pub local_table: String,
    pub local_column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    pub alias: String,
    pub projection: Vec<String>,
}

impl Join {
    /// Render the JOIN clause. When the foreign table names a registered
    /// CTE the `AS` aliasing is dropped, since the CTE already carries
    /// that name.
    pub fn render_join(&self, cte_names: &[String]) -> String {
        let target = if cte_names.iter().any(|n| n == &self.foreign_table) {
            self.foreign_table.clone()
        } else {
            format!("{} AS {}", self.foreign_table, self.alias)
        };
        format!(
            "{} JOIN {} ON {}.{} = {}.{}",
            self.kind.as_sql(),
            target,
            self.local_table,
            self.local_column,
            self.alias,
            self.foreign_column
        )
    }

    /// Plain column projections for the SELECT list, `alias.col` each.
    pub fn render_projection(&self) -> Vec<String> {
        self.projection
            .iter()
            .map(|c| format!("{}.{c}", self.alias))
            .collect()
    }
}

/// A one-to-many expansion: LEFT JOIN plus a JSON-array aggregate column.
///
/// The aggregate filter assumes the joined table has an `id` column; tables
/// without one cannot be included.
#[derive(Clone, Debug)]
pub struct Include {
    pub foreign_table: String,
    pub foreign_column: String,
    pub local_column: String,
    pub alias: String,
    pub projection: Vec<String>,
}

impl Include {
    /// The join predicate runs foreign-to-local, with the local side kept
    /// exactly as the caller wrote it.
    pub fn render_join(&self) -> String {
        format!(
            "LEFT JOIN {} AS {} ON {}.{} = {}",
            self.foreign_table, self.alias, self.alias, self.foreign_column, self.local_column
        )
    }

    /// SELECT fragment aggregating matched rows into a JSON array,
    /// `'[]'` when nothing matched.
    pub fn render_projection(&self) -> String {
        let agg = if self.projection.is_empty() {
            format!("json_agg({}.*)", self.alias)
        } else {
            let fields: Vec<String> = self
                .projection
                .iter()
                .map(|c| format!("'{c}', {}.{c}", self.alias))
                .collect();
            format!("json_agg(json_build_object({}))", fields.join(", "))
        };
        format!(
            "COALESCE({agg} FILTER (WHERE {}.id IS NOT NULL), '[]') AS {}",
            self.alias, self.alias
        )
    }
}
