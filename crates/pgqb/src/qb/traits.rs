//! Shared builder traits.

use crate::error::QbResult;
use crate::qb::BuiltQuery;

/// Terminal render contract shared by all statement builders.
///
/// Rendering consumes the accumulated draft: the builder is reset to a
/// fresh state and may be reused for a new statement.
pub trait Render {
    /// Compile the draft into an immutable `{sql, params}` result.
    fn render(&mut self) -> QbResult<BuiltQuery>;

    /// Render and return only the SQL text. Intended for logging and tests.
    fn to_sql(&mut self) -> QbResult<String> {
        Ok(self.render()?.sql)
    }
}
