//! Positional parameter allocation and merging.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// An ordered list of bound parameter values with 1-based positions.
///
/// This is the single authority for placeholder numbering: pushing a value
/// returns the `$n` index to render, and [`ParamList::embed`] merges a
/// pre-rendered child statement by shifting its placeholders past the
/// values already held here.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Add several values in order, returning their 1-based indices.
    pub fn push_many(&mut self, values: Vec<Value>) -> Vec<usize> {
        values.into_iter().map(|v| self.push(v)).collect()
    }

    /// Current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Merge a child statement into this list.
    ///
    /// Every `$<digits>` token in `child_sql` is shifted by the current
    /// length, and `child_params` are appended, so the returned SQL is
    /// collision-free against everything already bound here. Dollar signs
    /// not followed by digits are left untouched.
    pub fn embed(&mut self, child_sql: &str, child_params: &[Value]) -> String {
        let offset = self.params.len();
        self.params.extend_from_slice(child_params);
        shift_placeholders(child_sql, offset)
    }

    /// Consume the list, yielding the values in bind order.
    pub fn into_values(self) -> Vec<Value> {
        self.params
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }
}

/// Shift every `$<digits>` placeholder in `sql` by `offset`.
///
/// With offset 3, `$1 AND $2` becomes `$4 AND $5`. A `$` not followed by
/// digits is copied through verbatim.
fn shift_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }

    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let mut num = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() {
                    num.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            result.push('$');
            match num.parse::<usize>() {
                Ok(idx) => result.push_str(&(idx + offset).to_string()),
                Err(_) => result.push_str(&num),
            }
        } else {
            result.push(ch);
        }
    }

    result
}
