use serde::Serialize;
use utoipa::ToSchema;

use crate::aggregation::reshape::{MEAN_COLUMN, VARIABLE_COLUMN};
use crate::aggregation::AggregatedResult;
use crate::dataset::schema::{SCENARIO_COLUMN, YEAR_COLUMN};

pub const Y_AXIS_LABEL: &str = "Valor promedio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ChartKind {
    /// Bars grouped side by side per x value
    #[serde(rename = "bar")]
    GroupedBar,
    /// One line per series, with a marker at every point
    #[serde(rename = "line")]
    LineWithMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartPoint {
    pub x: String,
    pub y: Option<f64>,
    /// Color grouping (the scenario)
    pub series: String,
}

/// Renderer-agnostic chart description handed to the UI shell
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_field: String,
    pub y_field: String,
    pub color_field: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

/// Build the chart for an aggregation result
///
/// Total mode plots the melted table as grouped bars (x = variable);
/// per-year mode plots one line per scenario over the years.
pub fn chart_for(station: &str, result: &AggregatedResult) -> ChartSpec {
    match result {
        AggregatedResult::Total(total) => ChartSpec {
            kind: ChartKind::GroupedBar,
            title: format!("Promedio total de variables por escenario en estación {station}"),
            x_field: VARIABLE_COLUMN.to_string(),
            y_field: MEAN_COLUMN.to_string(),
            color_field: SCENARIO_COLUMN.to_string(),
            y_label: Y_AXIS_LABEL.to_string(),
            points: total
                .melt()
                .into_iter()
                .map(|entry| ChartPoint {
                    x: entry.variable,
                    y: entry.mean,
                    series: entry.scenario,
                })
                .collect(),
        },
        AggregatedResult::PerYear(yearly) => ChartSpec {
            kind: ChartKind::LineWithMarkers,
            title: format!(
                "Promedio anual de {} por escenario en estación {station}",
                yearly.variable
            ),
            x_field: YEAR_COLUMN.to_string(),
            y_field: yearly.variable.clone(),
            color_field: SCENARIO_COLUMN.to_string(),
            y_label: Y_AXIS_LABEL.to_string(),
            points: yearly
                .rows
                .iter()
                .map(|row| ChartPoint {
                    x: row.year.to_string(),
                    y: row.mean,
                    series: row.scenario.clone(),
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{ScenarioAverages, TotalAverages, YearlyAverage, YearlyAverages};

    #[test]
    fn test_total_chart_is_grouped_bar_over_melted_rows() {
        let result = AggregatedResult::Total(TotalAverages {
            variables: vec!["Temp".to_string(), "Pp".to_string()],
            rows: vec![ScenarioAverages {
                scenario: "RCP45".to_string(),
                means: vec![Some(15.0), Some(2.0)],
            }],
        });

        let chart = chart_for("A1", &result);
        assert_eq!(chart.kind, ChartKind::GroupedBar);
        assert_eq!(
            chart.title,
            "Promedio total de variables por escenario en estación A1"
        );
        assert_eq!(chart.x_field, "Variable");
        assert_eq!(chart.y_field, "Promedio");
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.points[1].x, "Pp");
        assert_eq!(chart.points[1].series, "RCP45");
    }

    #[test]
    fn test_per_year_chart_is_line() {
        let result = AggregatedResult::PerYear(YearlyAverages {
            variable: "Temp".to_string(),
            rows: vec![YearlyAverage {
                year: 2030,
                scenario: "RCP85".to_string(),
                mean: Some(3.5),
            }],
        });

        let chart = chart_for("A1", &result);
        assert_eq!(chart.kind, ChartKind::LineWithMarkers);
        assert_eq!(chart.x_field, "Año");
        assert_eq!(chart.y_field, "Temp");
        assert_eq!(chart.y_label, "Valor promedio");
        assert_eq!(chart.points[0].x, "2030");
    }

    #[test]
    fn test_chart_kind_wire_names() {
        assert_eq!(serde_json::to_value(ChartKind::GroupedBar).unwrap(), "bar");
        assert_eq!(serde_json::to_value(ChartKind::LineWithMarkers).unwrap(), "line");
    }

    #[test]
    fn test_empty_result_gives_empty_chart() {
        let result = AggregatedResult::PerYear(YearlyAverages {
            variable: "Temp".to_string(),
            rows: vec![],
        });
        assert!(chart_for("Z9", &result).points.is_empty());
    }
}
