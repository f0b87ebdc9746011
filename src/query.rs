//! Builds the two aggregate statements against the conflicts table.
//!
//! User-controlled values always travel as bound parameters; the only
//! interpolated identifiers are the fixed column names from the closed
//! `Measure` set. Selected expressions are aliased to lowercase names so the
//! result shape does not depend on the store's identifier casing.

use duckdb::types::Value;

use crate::filters::{FilterSet, Measure, VisitType};

pub const TABLE: &str = "conflicts";

/// A complete statement plus its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Grouped breakdown: one row per conflict type, descending by summed
/// measure. Rows with a null conflict type or null measure do not contribute.
pub fn breakdown_query(measure: Measure, filters: &FilterSet) -> SqlQuery {
    let column = measure.code();
    let mut predicates = vec![
        "CONTYPE IS NOT NULL".to_string(),
        format!("{column} IS NOT NULL"),
    ];
    let mut params = Vec::new();
    push_filter_predicates(filters, &mut predicates, &mut params);

    let sql = format!(
        "SELECT CONTYPE AS contype, \
         CAST(SUM({column}) AS DOUBLE) AS total_value, \
         COUNT(*) AS record_count \
         FROM {TABLE} \
         WHERE {} \
         GROUP BY CONTYPE \
         ORDER BY total_value DESC",
        predicates.join(" AND ")
    );
    SqlQuery { sql, params }
}

/// Single-row summary across the filtered set. Always computes all four
/// measure sums regardless of the selected measure, and carries no NOT-NULL
/// base predicate.
pub fn summary_query(filters: &FilterSet) -> SqlQuery {
    let mut predicates = Vec::new();
    let mut params = Vec::new();
    push_filter_predicates(filters, &mut predicates, &mut params);

    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    };
    let sql = format!(
        "SELECT COUNT(*) AS total_records, \
         COUNT(DISTINCT CONTYPE) AS unique_contypes, \
         CAST(COALESCE(SUM(CO_TO), 0) AS DOUBLE) AS total_co_to, \
         CAST(COALESCE(SUM(CO_SP), 0) AS DOUBLE) AS total_co_sp, \
         CAST(COALESCE(SUM(CO_OP), 0) AS DOUBLE) AS total_co_op, \
         CAST(COALESCE(SUM(CO_FP), 0) AS DOUBLE) AS total_co_fp, \
         CAST(MIN(CRDATEUNIQUE) AS VARCHAR) AS earliest_date, \
         CAST(MAX(CRDATEUNIQUE) AS VARCHAR) AS latest_date \
         FROM {TABLE}{where_clause}"
    );
    SqlQuery { sql, params }
}

// Each filter contributes its predicate independently; an absent filter adds
// nothing. Predicate order here fixes parameter order.
fn push_filter_predicates(
    filters: &FilterSet,
    predicates: &mut Vec<String>,
    params: &mut Vec<Value>,
) {
    if let Some(from) = filters.from_date {
        predicates.push("CRDATEUNIQUE >= CAST(? AS DATE)".to_string());
        params.push(Value::Text(from.to_string()));
    }
    if let Some(to) = filters.to_date {
        predicates.push("CRDATEUNIQUE <= CAST(? AS DATE)".to_string());
        params.push(Value::Text(to.to_string()));
    }
    if let Some(status) = filters.status {
        predicates.push("STATUSFLAG = ?".to_string());
        params.push(Value::Text(status.as_sql().to_string()));
    }
    if let Some(cost_type) = filters.cost_type {
        predicates.push("COSTTYPE = ?".to_string());
        params.push(Value::Text(cost_type.as_sql().to_string()));
    }
    if let Some(visit_type) = filters.visit_type {
        predicates.push("VISITTYPE = ?".to_string());
        params.push(Value::Text(visit_type.as_sql().to_string()));
    }
    if let Some(billed) = filters.billed {
        let op = if billed { "=" } else { "<>" };
        predicates.push(format!("VISITTYPE {op} ?"));
        params.push(Value::Text(VisitType::Billed.as_sql().to_string()));
    }
    if let Some(code) = &filters.service_code {
        // CONTYPES carries code lists, so the filter matches by containment.
        predicates.push("CONTYPES LIKE ? ESCAPE '\\'".to_string());
        params.push(Value::Text(format!("%{}%", escape_like(code))));
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
