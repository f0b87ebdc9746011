//! Orchestrates measure resolution, repository queries, and result shaping.

use crate::chart::{ChartData, SummaryStats};
use crate::error::DataSourceError;
use crate::filters::{FilterSet, Measure};
use crate::repository::ConflictRepository;

#[derive(Clone)]
pub struct ChartDataService {
    repository: ConflictRepository,
}

impl ChartDataService {
    pub fn new(repository: ConflictRepository) -> Self {
        Self { repository }
    }

    /// Resolve the requested measure code, falling back to the count measure
    /// when the code is absent or outside the closed set.
    pub fn resolve_measure(&self, code: Option<&str>) -> Measure {
        match code {
            None | Some("") => Measure::Count,
            Some(raw) => Measure::parse(raw).unwrap_or_else(|| {
                tracing::warn!(requested = raw, "invalid value type, using default");
                Measure::Count
            }),
        }
    }

    pub async fn chart_data(
        &self,
        measure: Measure,
        filters: &FilterSet,
    ) -> Result<ChartData, DataSourceError> {
        let rows = self.repository.chart_breakdown(measure, filters).await?;
        tracing::info!(
            measure = measure.code(),
            rows = rows.len(),
            "chart breakdown loaded"
        );
        Ok(ChartData::from_rows(&rows, measure))
    }

    pub async fn summary_stats(
        &self,
        filters: &FilterSet,
    ) -> Result<SummaryStats, DataSourceError> {
        let row = self.repository.summary_stats(filters).await?;
        Ok(SummaryStats::from_row(row))
    }

    /// Measure code and display label pairs, in fixed order, for the page.
    pub fn available_measures(&self) -> Vec<(&'static str, &'static str)> {
        Measure::ALL.iter().map(|m| (m.code(), m.label())).collect()
    }

    pub async fn test_connection(&self) -> bool {
        let healthy = self.repository.check_connection().await;
        if !healthy {
            tracing::warn!("database connection test failed");
        }
        healthy
    }
}
