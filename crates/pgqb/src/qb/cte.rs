//! WITH-clause assembly.
//!
//! CTE bodies are captured fully rendered when registered; at final render
//! their parameters are renumbered first, in declaration order, because the
//! CTE text precedes the rest of the statement.

use crate::qb::param::ParamList;
use crate::value::Value;

/// A named, pre-rendered CTE body.
#[derive(Clone, Debug)]
pub struct CteEntry {
    pub name: String,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Prefix `WITH a AS (..), b AS (..)` onto `body_sql`.
///
/// `params` must be empty on entry; every CTE's parameters land first and
/// the body's placeholders are shifted past them.
pub fn prefix_with(
    ctes: &[CteEntry],
    body_sql: String,
    body_params: Vec<Value>,
    params: &mut ParamList,
) -> String {
    if ctes.is_empty() {
        return params.embed(&body_sql, &body_params);
    }
    let mut clauses = Vec::with_capacity(ctes.len());
    for cte in ctes {
        let shifted = params.embed(&cte.sql, &cte.params);
        clauses.push(format!("{} AS ({shifted})", cte.name));
    }
    let body = params.embed(&body_sql, &body_params);
    format!("WITH {} {body}", clauses.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ctes_passes_body_through() {
        let mut params = ParamList::new();
        let sql = prefix_with(
            &[],
            "SELECT id FROM users AS users WHERE users.id = $1".into(),
            vec![Value::Int(1)],
            &mut params,
        );
        assert_eq!(sql, "SELECT id FROM users AS users WHERE users.id = $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn cte_params_number_before_body_params() {
        let ctes = vec![CteEntry {
            name: "recent".into(),
            sql: "SELECT id FROM posts AS posts WHERE posts.created_at > $1".into(),
            params: vec![Value::Text("2024-01-01".into())],
        }];
        let mut params = ParamList::new();
        let sql = prefix_with(
            &ctes,
            "SELECT id FROM users AS users WHERE users.id = $1".into(),
            vec![Value::Int(7)],
            &mut params,
        );
        assert_eq!(
            sql,
            "WITH recent AS (SELECT id FROM posts AS posts WHERE posts.created_at > $1) \
             SELECT id FROM users AS users WHERE users.id = $2"
        );
        assert_eq!(
            params.into_values(),
            vec![Value::Text("2024-01-01".into()), Value::Int(7)]
        );
    }

    #[test]
    fn multiple_ctes_keep_declaration_order() {
        let ctes = vec![
            CteEntry {
                name: "a".into(),
                sql: "SELECT x FROM t1 WHERE t1.x = $1".into(),
                params: vec![Value::Int(1)],
            },
            CteEntry {
                name: "b".into(),
                sql: "SELECT y FROM t2 WHERE t2.y = $1".into(),
                params: vec![Value::Int(2)],
            },
        ];
        let mut params = ParamList::new();
        let sql = prefix_with(&ctes, "SELECT 1 WHERE $1".into(), vec![Value::Bool(true)], &mut params);
        assert_eq!(
            sql,
            "WITH a AS (SELECT x FROM t1 WHERE t1.x = $1), \
             b AS (SELECT y FROM t2 WHERE t2.y = $2) SELECT 1 WHERE $3"
        );
        assert_eq!(params.len(), 3);
    }
}
