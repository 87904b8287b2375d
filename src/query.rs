//! Query feature builder: translates a query-string parameter map into one
//! composed SELECT, applying stages in a fixed order (filter, sort, field
//! selection, pagination). The builder never executes anything; the record
//! handler runs the composed query exactly once.

use std::collections::HashMap;

use crate::error::AppError;
use crate::schema::{Column, Expand, Schema};

/// Control keys that are never treated as filter fields.
const RESERVED_KEYS: &[&str] = &["page", "sort", "limit", "fields"];

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl FilterOp {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(FilterOp::Gte),
            "gt" => Some(FilterOp::Gt),
            "lte" => Some(FilterOp::Lte),
            "lt" => Some(FilterOp::Lt),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Gt => ">",
            FilterOp::Lte => "<=",
            FilterOp::Lt => "<",
        }
    }
}

#[derive(Debug)]
struct FilterCond {
    column: &'static Column,
    op: FilterOp,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

#[derive(Debug)]
pub struct Sql {
    pub query: String,
    pub params: Vec<String>,
}

#[derive(Debug)]
pub struct QueryFeatures {
    schema: &'static Schema,
    filters: Vec<FilterCond>,
    sort: Vec<(String, Direction)>,
    fields: Option<Vec<String>>,
    page: i64,
    limit: i64,
}

impl QueryFeatures {
    pub fn from_params(
        schema: &'static Schema,
        params: &HashMap<String, String>,
    ) -> Result<Self, AppError> {
        let mut filters = Vec::new();
        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            filters.push(parse_filter(schema, key, value)?);
        }
        // Map iteration order is arbitrary; fix it so composed SQL is stable.
        filters.sort_by(|a, b| (a.column.name, a.op.sql()).cmp(&(b.column.name, b.op.sql())));

        let sort = match params.get("sort") {
            Some(spec) => parse_sort(schema, spec)?,
            None => Vec::new(),
        };

        let fields = match params.get("fields") {
            Some(spec) => Some(parse_fields(schema, spec)?),
            None => None,
        };

        let page = parse_positive(params.get("page"), "page", DEFAULT_PAGE)?;
        let limit = parse_positive(params.get("limit"), "limit", DEFAULT_LIMIT)?;

        Ok(QueryFeatures {
            schema,
            filters,
            sort,
            fields,
            page,
            limit,
        })
    }

    /// Compose the deferred query: one row per record, a single `doc` jsonb
    /// column. Parameters are bound as text and cast per column type.
    pub fn to_sql(&self, expand: Option<&Expand>) -> Sql {
        let mut params = Vec::new();
        let mut query = format!("SELECT {} AS doc FROM \"{}\" t", self.doc_expr(expand), self.schema.table);

        if !self.filters.is_empty() {
            let conds: Vec<String> = self
                .filters
                .iter()
                .map(|f| {
                    params.push(f.value.clone());
                    format!(
                        "t.\"{}\" {} ${}{}",
                        f.column.name,
                        f.op.sql(),
                        params.len(),
                        f.column.ty.cast()
                    )
                })
                .collect();
            query.push_str(" WHERE ");
            query.push_str(&conds.join(" AND "));
        }

        query.push_str(" ORDER BY ");
        if self.sort.is_empty() {
            query.push_str("t.\"created_at\" DESC");
        } else {
            let keys: Vec<String> = self
                .sort
                .iter()
                .map(|(col, dir)| {
                    let dir = match dir {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("t.\"{col}\" {dir}")
                })
                .collect();
            query.push_str(&keys.join(", "));
        }

        // Saturate rather than overflow on absurd page numbers; the result
        // set is empty either way.
        let offset = (self.page - 1).saturating_mul(self.limit);
        query.push_str(&format!(" LIMIT {} OFFSET {}", self.limit, offset));

        Sql { query, params }
    }

    fn doc_expr(&self, expand: Option<&Expand>) -> String {
        let base = match &self.fields {
            Some(fields) => self.schema.projected_doc_expr("t", fields),
            None => self.schema.full_doc_expr("t"),
        };
        match expand {
            Some(expand) => format!("{base} || {}", expand_expr("t", expand)),
            None => base,
        }
    }
}

/// Correlated subquery resolving a reference column to the referenced
/// record's selected attributes, embedded under the relation name.
pub fn expand_expr(qualifier: &str, expand: &Expand) -> String {
    let pairs: Vec<String> = expand
        .fields
        .iter()
        .map(|f| format!("'{f}', r.\"{f}\""))
        .collect();
    format!(
        "jsonb_build_object('{}', (SELECT jsonb_build_object({}) FROM \"{}\" r WHERE r.\"id\" = {}.\"{}\"))",
        expand.rel,
        pairs.join(", "),
        expand.table,
        qualifier,
        expand.fk_column
    )
}

fn parse_filter(
    schema: &'static Schema,
    key: &str,
    value: &str,
) -> Result<FilterCond, AppError> {
    let (field, op) = match (key.find('['), key.ends_with(']')) {
        (Some(open), true) => {
            let suffix = &key[open + 1..key.len() - 1];
            let op = FilterOp::from_suffix(suffix).ok_or_else(|| {
                AppError::BadRequest(format!("Unsupported filter operator '{suffix}'"))
            })?;
            (&key[..open], op)
        }
        _ => (key, FilterOp::Eq),
    };

    let column = schema
        .visible_column(field)
        .ok_or_else(|| AppError::BadRequest(format!("Cannot filter on field '{field}'")))?;

    Ok(FilterCond {
        column,
        op,
        value: value.to_string(),
    })
}

fn parse_sort(schema: &'static Schema, spec: &str) -> Result<Vec<(String, Direction)>, AppError> {
    let mut keys = Vec::new();
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (name, dir) = match token.strip_prefix('-') {
            Some(name) => (name, Direction::Desc),
            None => (token, Direction::Asc),
        };
        let column = schema
            .visible_column(name)
            .ok_or_else(|| AppError::BadRequest(format!("Cannot sort on field '{name}'")))?;
        keys.push((column.name.to_string(), dir));
    }
    Ok(keys)
}

fn parse_fields(schema: &'static Schema, spec: &str) -> Result<Vec<String>, AppError> {
    let mut fields = Vec::new();
    let mut exclude_id = false;
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token == "-id" {
            exclude_id = true;
            continue;
        }
        let column = schema
            .visible_column(token)
            .ok_or_else(|| AppError::BadRequest(format!("Cannot select field '{token}'")))?;
        if !fields.iter().any(|f| f == column.name) {
            fields.push(column.name.to_string());
        }
    }
    // The identifier rides along unless explicitly excluded.
    if !exclude_id && !fields.iter().any(|f| f == "id") {
        fields.insert(0, "id".to_string());
    }
    Ok(fields)
}

fn parse_positive(
    raw: Option<&String>,
    key: &str,
    default: i64,
) -> Result<i64, AppError> {
    match raw {
        None => Ok(default),
        Some(s) => match s.parse::<i64>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(AppError::BadRequest(format!(
                "'{key}' must be a positive integer"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DEPARTMENT_NAME, EMPLOYEE};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_key_is_equality_filter() {
        let features = QueryFeatures::from_params(&EMPLOYEE, &params(&[("name", "Ada")])).unwrap();
        let sql = features.to_sql(None);
        assert!(sql.query.contains("WHERE t.\"name\" = $1"), "{}", sql.query);
        assert_eq!(sql.params, vec!["Ada"]);
    }

    #[test]
    fn bracket_suffix_maps_to_comparison() {
        let features =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("salary[gte]", "3000")])).unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query.contains("t.\"salary\" >= $1::numeric"),
            "{}",
            sql.query
        );
        assert_eq!(sql.params, vec!["3000"]);
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let features = QueryFeatures::from_params(
            &EMPLOYEE,
            &params(&[("page", "2"), ("limit", "5"), ("sort", "name"), ("fields", "name")]),
        )
        .unwrap();
        let sql = features.to_sql(None);
        assert!(!sql.query.contains("WHERE"), "{}", sql.query);
    }

    #[test]
    fn leading_minus_sorts_descending() {
        let features =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("sort", "-salary,name")])).unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query
                .contains("ORDER BY t.\"salary\" DESC, t.\"name\" ASC"),
            "{}",
            sql.query
        );
    }

    #[test]
    fn default_sort_is_creation_time_descending() {
        let features = QueryFeatures::from_params(&EMPLOYEE, &params(&[])).unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query.contains("ORDER BY t.\"created_at\" DESC"),
            "{}",
            sql.query
        );
    }

    #[test]
    fn pagination_computes_offset() {
        let features =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("page", "3"), ("limit", "10")]))
                .unwrap();
        let sql = features.to_sql(None);
        assert!(sql.query.ends_with("LIMIT 10 OFFSET 20"), "{}", sql.query);
    }

    #[test]
    fn huge_page_number_saturates_instead_of_overflowing() {
        let features = QueryFeatures::from_params(
            &EMPLOYEE,
            &params(&[("page", &i64::MAX.to_string()), ("limit", "100")]),
        )
        .unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query.ends_with(&format!("LIMIT 100 OFFSET {}", i64::MAX)),
            "{}",
            sql.query
        );
    }

    #[test]
    fn defaults_page_one_limit_one_hundred() {
        let features = QueryFeatures::from_params(&EMPLOYEE, &params(&[])).unwrap();
        let sql = features.to_sql(None);
        assert!(sql.query.ends_with("LIMIT 100 OFFSET 0"), "{}", sql.query);
    }

    #[test]
    fn field_selection_includes_id_implicitly() {
        let features =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("fields", "name,email")])).unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query.contains(
                "jsonb_build_object('id', t.\"id\", 'name', t.\"name\", 'email', t.\"email\")"
            ),
            "{}",
            sql.query
        );
    }

    #[test]
    fn minus_id_excludes_identifier() {
        let features =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("fields", "name,-id")])).unwrap();
        let sql = features.to_sql(None);
        assert!(
            sql.query.contains("jsonb_build_object('name', t.\"name\")"),
            "{}",
            sql.query
        );
    }

    #[test]
    fn hidden_columns_are_stripped_from_full_docs() {
        let features = QueryFeatures::from_params(&EMPLOYEE, &params(&[])).unwrap();
        let sql = features.to_sql(None);
        assert!(sql.query.contains("- 'password_hash'"), "{}", sql.query);
        assert!(
            sql.query.contains("- 'password_reset_code'"),
            "{}",
            sql.query
        );
    }

    #[test]
    fn hidden_columns_cannot_be_filtered() {
        let err =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("password_hash", "x")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = QueryFeatures::from_params(&EMPLOYEE, &params(&[("bogus", "1")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err =
            QueryFeatures::from_params(&EMPLOYEE, &params(&[("salary[within]", "1")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn expansion_embeds_relation_subquery() {
        let features = QueryFeatures::from_params(&EMPLOYEE, &params(&[])).unwrap();
        let sql = features.to_sql(Some(&DEPARTMENT_NAME));
        assert!(
            sql.query.contains(
                "jsonb_build_object('department', (SELECT jsonb_build_object('name', r.\"name\") FROM \"departments\" r WHERE r.\"id\" = t.\"department_id\"))"
            ),
            "{}",
            sql.query
        );
    }

    #[test]
    fn stages_compose_in_fixed_order() {
        let features = QueryFeatures::from_params(
            &EMPLOYEE,
            &params(&[
                ("salary[gte]", "3000"),
                ("sort", "-salary"),
                ("limit", "2"),
                ("page", "1"),
            ]),
        )
        .unwrap();
        let sql = features.to_sql(None);
        let where_pos = sql.query.find("WHERE").unwrap();
        let order_pos = sql.query.find("ORDER BY").unwrap();
        let limit_pos = sql.query.find("LIMIT").unwrap();
        assert!(where_pos < order_pos && order_pos < limit_pos, "{}", sql.query);
        assert!(sql.query.ends_with("LIMIT 2 OFFSET 0"), "{}", sql.query);
    }
}
