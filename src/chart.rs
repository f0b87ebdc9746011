//! Shapes query rows into the chart payload and summary statistics.

use serde::Serialize;

use crate::filters::Measure;
use crate::repository::{BreakdownRow, SummaryRow};

/// Segment fill palette, cycled by row position.
const BACKGROUND_COLORS: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF",
    "#4BC0C0", "#FF6384",
];

/// Border palette, position-matched to the fills.
const BORDER_COLORS: [&str; 10] = [
    "#E53E5F", "#2D8BC0", "#E6B800", "#3A9A9A", "#7A4DB3", "#E68A00", "#E53E5F", "#A8A9AC",
    "#3A9A9A", "#E53E5F",
];

const BORDER_WIDTH: u8 = 2;

/// Chart.js-shaped pie payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    #[serde(rename = "valueType")]
    pub value_type: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartDataset {
    pub data: Vec<f64>,
    #[serde(rename = "backgroundColor")]
    pub background_color: Vec<&'static str>,
    #[serde(rename = "borderColor")]
    pub border_color: Vec<&'static str>,
    #[serde(rename = "borderWidth")]
    pub border_width: u8,
}

impl ChartData {
    /// Shape breakdown rows, preserving the query's descending order. A
    /// missing conflict type labels as "Unknown"; colors cycle the palettes.
    pub fn from_rows(rows: &[BreakdownRow], measure: Measure) -> Self {
        let labels = rows
            .iter()
            .map(|r| r.contype.clone().unwrap_or_else(|| "Unknown".to_string()))
            .collect();
        let data = rows.iter().map(|r| r.total_value.unwrap_or(0.0)).collect();
        let count = rows.len();

        Self {
            labels,
            datasets: vec![ChartDataset {
                data,
                background_color: cycle(&BACKGROUND_COLORS, count),
                border_color: cycle(&BORDER_COLORS, count),
                border_width: BORDER_WIDTH,
            }],
            value_type: measure.code(),
        }
    }
}

fn cycle(palette: &'static [&'static str; 10], count: usize) -> Vec<&'static str> {
    (0..count).map(|i| palette[i % palette.len()]).collect()
}

/// Overall totals across the filtered set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryStats {
    pub total_records: i64,
    pub unique_contypes: i64,
    pub total_co_to: f64,
    pub total_co_sp: f64,
    pub total_co_op: f64,
    pub total_co_fp: f64,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

impl SummaryStats {
    /// Map the summary row, or fall back to the zero-valued default when the
    /// query produced no row.
    pub fn from_row(row: Option<SummaryRow>) -> Self {
        match row {
            Some(row) => Self {
                total_records: row.total_records,
                unique_contypes: row.unique_contypes,
                total_co_to: row.total_co_to,
                total_co_sp: row.total_co_sp,
                total_co_op: row.total_co_op,
                total_co_fp: row.total_co_fp,
                earliest_date: row.earliest_date,
                latest_date: row.latest_date,
            },
            None => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self {
            total_records: 0,
            unique_contypes: 0,
            total_co_to: 0.0,
            total_co_sp: 0.0,
            total_co_op: 0.0,
            total_co_fp: 0.0,
            earliest_date: None,
            latest_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(contype: Option<&str>, total_value: Option<f64>) -> BreakdownRow {
        BreakdownRow {
            contype: contype.map(str::to_string),
            total_value,
            record_count: 1,
        }
    }

    #[test]
    fn shapes_rows_in_input_order_with_palette_colors() {
        let rows = [row(Some("Type1"), Some(100.0)), row(Some("Type2"), Some(200.0))];
        let chart = ChartData::from_rows(&rows, Measure::Count);

        assert_eq!(chart.labels, vec!["Type1", "Type2"]);
        assert_eq!(chart.value_type, "CO_TO");
        assert_eq!(chart.datasets.len(), 1);
        let dataset = &chart.datasets[0];
        assert_eq!(dataset.data, vec![100.0, 200.0]);
        assert_eq!(dataset.background_color, vec!["#FF6384", "#36A2EB"]);
        assert_eq!(dataset.border_color, vec!["#E53E5F", "#2D8BC0"]);
        assert_eq!(dataset.border_width, 2);
    }

    #[test]
    fn missing_contype_labels_as_unknown() {
        let rows = [row(None, None)];
        let chart = ChartData::from_rows(&rows, Measure::FullPrice);
        assert_eq!(chart.labels, vec!["Unknown"]);
        assert_eq!(chart.datasets[0].data, vec![0.0]);
        assert_eq!(chart.value_type, "CO_FP");
    }

    #[test]
    fn colors_wrap_past_the_palette_length() {
        let rows: Vec<BreakdownRow> = (0..12)
            .map(|i| row(Some(&format!("T{i}")), Some(i as f64)))
            .collect();
        let chart = ChartData::from_rows(&rows, Measure::Count);
        let colors = &chart.datasets[0].background_color;
        assert_eq!(colors.len(), 12);
        assert_eq!(colors[10], colors[0]);
        assert_eq!(colors[11], colors[1]);
    }

    #[test]
    fn empty_rows_shape_to_empty_chart() {
        let chart = ChartData::from_rows(&[], Measure::Count);
        assert!(chart.labels.is_empty());
        assert!(chart.datasets[0].data.is_empty());
        assert!(chart.datasets[0].background_color.is_empty());
    }

    #[test]
    fn chart_serializes_with_chartjs_field_names() {
        let rows = [row(Some("Type1"), Some(1.5))];
        let value = serde_json::to_value(ChartData::from_rows(&rows, Measure::Count)).unwrap();
        let dataset = &value["datasets"][0];
        assert_eq!(dataset["borderWidth"], 2);
        assert_eq!(dataset["backgroundColor"][0], "#FF6384");
        assert_eq!(dataset["borderColor"][0], "#E53E5F");
        assert_eq!(value["valueType"], "CO_TO");
    }

    #[test]
    fn missing_summary_row_yields_zeroed_default() {
        let stats = SummaryStats::from_row(None);
        assert_eq!(stats, SummaryStats::empty());
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.total_co_fp, 0.0);
        assert_eq!(stats.earliest_date, None);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["earliest_date"], serde_json::Value::Null);
        assert_eq!(value["total_records"], 0);
    }

    #[test]
    fn summary_row_maps_field_for_field() {
        let stats = SummaryStats::from_row(Some(SummaryRow {
            total_records: 4,
            unique_contypes: 2,
            total_co_to: 15.0,
            total_co_sp: 49.0,
            total_co_op: 25.0,
            total_co_fp: 97.0,
            earliest_date: Some("2024-01-05".to_string()),
            latest_date: Some("2024-03-01".to_string()),
        }));
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_contypes, 2);
        assert_eq!(stats.latest_date.as_deref(), Some("2024-03-01"));
    }
}
