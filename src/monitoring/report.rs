use serde::Serialize;

use crate::analysis::projection::ConfidenceLevel;
use crate::pipeline::AnalysisReport;

/// The four numbers shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub current_price: f64,
    pub interval_68: (f64, f64),
    pub interval_95: (f64, f64),
    pub interval_99: (f64, f64),
}

impl SummaryMetrics {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let bounds = |level| {
            let iv = report.projection.interval(level);
            (iv.lower, iv.upper)
        };

        Self {
            current_price: report.projection.current_price,
            interval_68: bounds(ConfidenceLevel::P68),
            interval_95: bounds(ConfidenceLevel::P95),
            interval_99: bounds(ConfidenceLevel::P99),
        }
    }
}

/// Plain-text summary printed by the non-interactive CLI.
pub fn format_summary(report: &AnalysisReport) -> String {
    let projection = &report.projection;

    let mut lines = vec![
        format!(
            "Projection statistics for {} over {} days:",
            report.symbol, projection.horizon_days
        ),
        format!("Current price: ${:.2}", projection.current_price),
        format!(
            "Annualized volatility: {:.2}% (as of {})",
            report.annual_volatility * 100.0,
            report.as_of.format("%Y-%m-%d")
        ),
        String::new(),
        "Confidence intervals:".to_string(),
    ];
    lines.extend(projection.intervals.iter().map(|interval| {
        format!(
            "{}% probability: ${:.2} - ${:.2}",
            interval.level.percent(),
            interval.lower,
            interval.upper
        )
    }));

    lines.join("\n")
}
