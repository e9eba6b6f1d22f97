//! WHERE predicate model and clause compilation.

use crate::error::{QbError, QbResult};
use crate::qb::param::ParamList;
use crate::value::Value;

/// Comparison operator for a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    In,
}

impl CmpOp {
    /// Parse an operator token as written at the call site.
    pub fn parse(s: &str) -> QbResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" => Ok(CmpOp::Eq),
            "!=" | "<>" => Ok(CmpOp::Ne),
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Lte),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Gte),
            "LIKE" => Ok(CmpOp::Like),
            "IN" => Ok(CmpOp::In),
            other => Err(QbError::Validation(format!(
                "unsupported operator '{other}'"
            ))),
        }
    }

    /// SQL token for this operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Like => "LIKE",
            CmpOp::In => "IN",
        }
    }
}

/// How a predicate chains onto the ones before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// A column reference, tagged at the call site.
///
/// Bare names get qualified with the statement's base alias at render time;
/// names already containing a `.` pass through untouched. Quoted identifiers
/// with literal dots are not supported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnRef {
    Bare(String),
    Qualified(String),
}

impl ColumnRef {
    /// Tag a column string as bare or already-qualified.
    pub fn parse(s: &str) -> Self {
        if s.contains('.') {
            ColumnRef::Qualified(s.to_string())
        } else {
            ColumnRef::Bare(s.to_string())
        }
    }

    /// The raw column name as given.
    pub fn raw(&self) -> &str {
        match self {
            ColumnRef::Bare(s) | ColumnRef::Qualified(s) => s,
        }
    }

    /// Render, prefixing bare names with `alias.` when one is given.
    pub fn qualify(&self, alias: Option<&str>) -> String {
        match self {
            ColumnRef::Qualified(s) => s.clone(),
            ColumnRef::Bare(s) => match alias {
                Some(a) => format!("{a}.{s}"),
                None => s.clone(),
            },
        }
    }
}

/// Rendering idiom for `IN` predicates.
///
/// SELECT and DELETE statements splat the list into explicit placeholders
/// (`IN ($1, $2, $3)`); single-row UPDATE binds the whole list once as
/// `= ANY($n)`. Same semantics, different SQL; both idioms are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InStyle {
    Placeholders,
    Any,
}

/// A structured predicate, held unrendered until the statement is built.
///
/// Used by the UPDATE assembler, where SET values must be numbered before
/// the WHERE values regardless of call order.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub conn: Connective,
    pub column: ColumnRef,
    pub op: CmpOp,
    pub value: Value,
}

impl Predicate {
    /// Validate the value for the operator; this is the call-site check.
    pub fn check(column: &str, op: CmpOp, value: &Value) -> QbResult<()> {
        if op == CmpOp::In {
            match value.as_array() {
                Some([]) => Err(QbError::EmptyInList(column.to_string())),
                Some(_) => Ok(()),
                None => Err(QbError::Validation(format!(
                    "IN predicate on column '{column}' requires a list value"
                ))),
            }
        } else if value.is_null() {
            Err(QbError::NullValue(column.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Render one `column op value` comparison, binding into `params`.
///
/// `column_sql` must already be qualified as the statement requires.
pub fn render_comparison(
    column_sql: &str,
    op: CmpOp,
    value: Value,
    style: InStyle,
    params: &mut ParamList,
) -> String {
    if op == CmpOp::In {
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        match style {
            InStyle::Placeholders => {
                let placeholders: Vec<String> = params
                    .push_many(items)
                    .into_iter()
                    .map(|idx| format!("${idx}"))
                    .collect();
                format!("{column_sql} IN ({})", placeholders.join(", "))
            }
            InStyle::Any => {
                let idx = params.push(Value::Array(items));
                format!("{column_sql} = ANY(${idx})")
            }
        }
    } else {
        let idx = params.push(value);
        format!("{column_sql} {} ${idx}", op.as_sql())
    }
}

/// Accumulated WHERE fragments for an eagerly-bound statement.
///
/// AND fragments join with `AND`. OR fragments trail the AND chain: a single
/// OR fragment is appended as-is, while two or more are joined with `OR` and
/// wrapped in one set of parentheses. The single/multiple asymmetry is
/// long-standing output shape and is pinned by tests; do not "fix" it.
#[derive(Clone, Debug, Default)]
pub struct WhereClause {
    and_parts: Vec<String>,
    or_parts: Vec<String>,
}

impl WhereClause {
    /// Render a predicate immediately and chain it.
    pub fn push(
        &mut self,
        conn: Connective,
        column: &ColumnRef,
        alias: Option<&str>,
        op: CmpOp,
        value: Value,
        style: InStyle,
        params: &mut ParamList,
    ) -> QbResult<()> {
        Predicate::check(column.raw(), op, &value)?;
        let fragment = render_comparison(&column.qualify(alias), op, value, style, params);
        match conn {
            Connective::And => self.and_parts.push(fragment),
            Connective::Or => self.or_parts.push(fragment),
        }
        Ok(())
    }

    /// Chain a pre-rendered fragment (subquery embeds) onto the AND chain.
    pub fn push_fragment(&mut self, fragment: String) {
        self.and_parts.push(fragment);
    }

    /// Whether no predicates have been added.
    pub fn is_empty(&self) -> bool {
        self.and_parts.is_empty() && self.or_parts.is_empty()
    }

    /// Compile the clause body (without the `WHERE` keyword).
    pub fn compile(&self) -> Option<String> {
        let mut parts = self.and_parts.clone();
        match self.or_parts.len() {
            0 => {}
            1 => parts.push(self.or_parts[0].clone()),
            _ => parts.push(format!("({})", self.or_parts.join(" OR "))),
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" AND "))
        }
    }
}

/// Compile a list of structured predicates in order.
///
/// Used at render time by the UPDATE assembler, after SET values have
/// claimed the leading placeholder slots.
pub fn compile_predicates(
    predicates: &[Predicate],
    alias: Option<&str>,
    style: InStyle,
    params: &mut ParamList,
) -> Option<String> {
    let mut clause = WhereClause::default();
    for p in predicates {
        let fragment =
            render_comparison(&p.column.qualify(alias), p.op, p.value.clone(), style, params);
        match p.conn {
            Connective::And => clause.and_parts.push(fragment),
            Connective::Or => clause.or_parts.push(fragment),
        }
    }
    clause.compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_tagging() {
        assert_eq!(ColumnRef::parse("id"), ColumnRef::Bare("id".into()));
        assert_eq!(
            ColumnRef::parse("u.id"),
            ColumnRef::Qualified("u.id".into())
        );
        assert_eq!(ColumnRef::parse("id").qualify(Some("users")), "users.id");
        assert_eq!(ColumnRef::parse("u.id").qualify(Some("users")), "u.id");
        assert_eq!(ColumnRef::parse("id").qualify(None), "id");
    }

    #[test]
    fn null_value_rejected_at_check() {
        let err = Predicate::check("name", CmpOp::Eq, &Value::Null).unwrap_err();
        assert_eq!(err, QbError::NullValue("name".into()));
    }

    #[test]
    fn empty_in_rejected_at_check() {
        let err = Predicate::check("id", CmpOp::In, &Value::Array(vec![])).unwrap_err();
        assert_eq!(err, QbError::EmptyInList("id".into()));
    }

    #[test]
    fn in_renders_placeholder_list() {
        let mut params = ParamList::new();
        let sql = render_comparison(
            "users.id",
            CmpOp::In,
            Value::array([1i64, 2, 3]),
            InStyle::Placeholders,
            &mut params,
        );
        assert_eq!(sql, "users.id IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_renders_any_with_single_bind() {
        let mut params = ParamList::new();
        let sql = render_comparison(
            "id",
            CmpOp::In,
            Value::array([1i64, 2, 3]),
            InStyle::Any,
            &mut params,
        );
        assert_eq!(sql, "id = ANY($1)");
        assert_eq!(params.len(), 1);
        assert_eq!(
            params.into_values(),
            vec![Value::array([1i64, 2, 3])]
        );
    }

    #[test]
    fn single_or_is_not_parenthesized() {
        let mut params = ParamList::new();
        let mut clause = WhereClause::default();
        clause
            .push(
                Connective::And,
                &ColumnRef::parse("status"),
                Some("u"),
                CmpOp::Eq,
                "active".into(),
                InStyle::Placeholders,
                &mut params,
            )
            .unwrap();
        clause
            .push(
                Connective::Or,
                &ColumnRef::parse("role"),
                Some("u"),
                CmpOp::Eq,
                "admin".into(),
                InStyle::Placeholders,
                &mut params,
            )
            .unwrap();
        assert_eq!(
            clause.compile().unwrap(),
            "u.status = $1 AND u.role = $2"
        );
    }

    #[test]
    fn multiple_ors_are_parenthesized() {
        let mut params = ParamList::new();
        let mut clause = WhereClause::default();
        for (conn, col) in [
            (Connective::And, "status"),
            (Connective::Or, "role"),
            (Connective::Or, "level"),
        ] {
            clause
                .push(
                    conn,
                    &ColumnRef::parse(col),
                    Some("u"),
                    CmpOp::Eq,
                    "x".into(),
                    InStyle::Placeholders,
                    &mut params,
                )
                .unwrap();
        }
        assert_eq!(
            clause.compile().unwrap(),
            "u.status = $1 AND (u.role = $2 OR u.level = $3)"
        );
    }

    #[test]
    fn only_or_predicates_compile_without_leading_and() {
        let mut params = ParamList::new();
        let mut clause = WhereClause::default();
        for col in ["a", "b"] {
            clause
                .push(
                    Connective::Or,
                    &ColumnRef::parse(col),
                    None,
                    CmpOp::Eq,
                    1i64.into(),
                    InStyle::Placeholders,
                    &mut params,
                )
                .unwrap();
        }
        assert_eq!(clause.compile().unwrap(), "(a = $1 OR b = $2)");
    }

    #[test]
    fn empty_clause_compiles_to_none() {
        assert_eq!(WhereClause::default().compile(), None);
    }
}
