//! Executes built queries against the DuckDB store.
//!
//! The connection is shared behind an async mutex; statements run on the
//! blocking pool and are raced against the configured timeout. A failed
//! execution never returns partial rows.

use std::sync::Arc;
use std::time::Duration;

use duckdb::{Connection, params_from_iter};
use tokio::sync::Mutex;

use crate::error::DataSourceError;
use crate::filters::{FilterSet, Measure};
use crate::query::{self, SqlQuery};

/// One row of the grouped breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub contype: Option<String>,
    pub total_value: Option<f64>,
    pub record_count: i64,
}

/// The single summary row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub total_records: i64,
    pub unique_contypes: i64,
    pub total_co_to: f64,
    pub total_co_sp: f64,
    pub total_co_op: f64,
    pub total_co_fp: f64,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

#[derive(Clone)]
pub struct ConflictRepository {
    db: Arc<Mutex<Connection>>,
    query_timeout: Duration,
}

impl ConflictRepository {
    pub fn new(db: Arc<Mutex<Connection>>, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    pub async fn chart_breakdown(
        &self,
        measure: Measure,
        filters: &FilterSet,
    ) -> Result<Vec<BreakdownRow>, DataSourceError> {
        let query = query::breakdown_query(measure, filters);
        self.run(query, |row| {
            Ok(BreakdownRow {
                contype: row.get(0)?,
                total_value: row.get(1)?,
                record_count: row.get(2)?,
            })
        })
        .await
    }

    /// Aggregate queries return one row even over an empty set; `None` covers
    /// a store that returns nothing at all.
    pub async fn summary_stats(
        &self,
        filters: &FilterSet,
    ) -> Result<Option<SummaryRow>, DataSourceError> {
        let query = query::summary_query(filters);
        let rows = self
            .run(query, |row| {
                Ok(SummaryRow {
                    total_records: row.get(0)?,
                    unique_contypes: row.get(1)?,
                    total_co_to: row.get(2)?,
                    total_co_sp: row.get(3)?,
                    total_co_op: row.get(4)?,
                    total_co_fp: row.get(5)?,
                    earliest_date: row.get(6)?,
                    latest_date: row.get(7)?,
                })
            })
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Trivial reachability probe; reports `false` instead of raising.
    pub async fn check_connection(&self) -> bool {
        let query = SqlQuery::new("SELECT 1 AS health_check");
        match self.run(query, |row| row.get::<usize, i64>(0)).await {
            Ok(rows) => rows.len() == 1,
            Err(_) => false,
        }
    }

    async fn run<T, F>(&self, query: SqlQuery, map: F) -> Result<Vec<T>, DataSourceError>
    where
        T: Send + 'static,
        F: Fn(&duckdb::Row<'_>) -> duckdb::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let sql = query.sql.clone();
        tracing::debug!(%sql, params = query.params.len(), "executing query");
        let task = tokio::task::spawn_blocking(move || -> duckdb::Result<Vec<T>> {
            let conn = db.blocking_lock();
            let mut stmt = conn.prepare(&query.sql)?;
            let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| map(row))?;
            rows.collect()
        });

        match tokio::time::timeout(self.query_timeout, task).await {
            Err(_) => {
                tracing::error!(%sql, timeout = ?self.query_timeout, "query timed out");
                Err(DataSourceError::Timeout(self.query_timeout))
            }
            Ok(Err(join_error)) => {
                tracing::error!(%sql, error = %join_error, "query worker failed");
                Err(DataSourceError::Worker(join_error.to_string()))
            }
            Ok(Ok(Err(error))) => {
                tracing::error!(%sql, error = %error, "query failed");
                Err(DataSourceError::Query(error))
            }
            Ok(Ok(Ok(rows))) => Ok(rows),
        }
    }
}
