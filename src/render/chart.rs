use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::analysis::projection::ConfidenceLevel;
use crate::pipeline::AnalysisReport;

/// Drawing instructions handed to an external renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub hide_y_ticks: bool,
    pub series: Vec<LineSeries>,
    pub fills: Vec<FillRegion>,
    pub marker: VerticalMarker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub label: String,
    pub color: String,
    pub width: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Area between the density curve and zero, restricted to one confidence band.
#[derive(Debug, Clone, Serialize)]
pub struct FillRegion {
    pub label: String,
    pub color: String,
    pub alpha: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerticalMarker {
    pub label: String,
    pub color: String,
    pub dashed: bool,
    pub x: f64,
}

fn band_alpha(level: ConfidenceLevel) -> f64 {
    match level {
        ConfidenceLevel::P68 => 0.3,
        ConfidenceLevel::P95 => 0.2,
        ConfidenceLevel::P99 => 0.1,
    }
}

impl ChartSpec {
    pub fn from_report(report: &AnalysisReport, watermark: Option<String>) -> Self {
        let projection = &report.projection;
        let grid = &projection.price_grid;
        let density = &projection.density;

        let fills = projection
            .intervals
            .iter()
            .map(|interval| {
                let (x, y): (Vec<f64>, Vec<f64>) = grid
                    .iter()
                    .zip(density)
                    .filter(|(price, _)| interval.contains(**price))
                    .map(|(price, d)| (*price, *d))
                    .unzip();

                FillRegion {
                    label: format!(
                        "{}%: ${:.2} - ${:.2}",
                        interval.level.percent(),
                        interval.lower,
                        interval.upper
                    ),
                    color: "blue".to_string(),
                    alpha: band_alpha(interval.level),
                    x,
                    y,
                }
            })
            .collect();

        Self {
            title: format!(
                "Projected price distribution over {} days\n{}",
                projection.horizon_days, report.symbol
            ),
            x_label: "Price".to_string(),
            y_label: "Probability".to_string(),
            hide_y_ticks: true,
            series: vec![LineSeries {
                label: "Price distribution".to_string(),
                color: "blue".to_string(),
                width: 2.0,
                x: grid.clone(),
                y: density.clone(),
            }],
            fills,
            marker: VerticalMarker {
                label: format!("Current price: ${:.2}", projection.current_price),
                color: "red".to_string(),
                dashed: true,
                x: projection.current_price,
            },
            watermark,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize chart")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write chart to {}", path.display()))?;
        info!("Chart written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::projection::{project, GRID_POINTS};
    use crate::data::types::{LookbackPeriod, Symbol};
    use chrono::Utc;

    fn report(price: f64, vol: f64, horizon: u32) -> AnalysisReport {
        AnalysisReport {
            symbol: Symbol::parse("GGAL.BA").unwrap(),
            period: LookbackPeriod::OneYear,
            as_of: Utc::now(),
            observations: 250,
            annual_volatility: vol,
            projection: project(price, vol, horizon).unwrap(),
        }
    }

    #[test]
    fn test_chart_layout() {
        let chart = ChartSpec::from_report(&report(100.0, 0.30, 30), None);

        assert_eq!(chart.title, "Projected price distribution over 30 days\nGGAL.BA");
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].x.len(), GRID_POINTS);
        assert_eq!(chart.fills.len(), 3);
        assert_eq!(chart.marker.x, 100.0);
        assert_eq!(chart.marker.label, "Current price: $100.00");
        assert!(chart.hide_y_ticks);
    }

    #[test]
    fn test_fill_bands_widen() {
        let chart = ChartSpec::from_report(&report(100.0, 0.30, 30), None);
        let sizes: Vec<usize> = chart.fills.iter().map(|f| f.x.len()).collect();

        assert!(sizes[0] > 0);
        assert!(sizes[0] < sizes[1] && sizes[1] < sizes[2]);
        assert!(sizes[2] < GRID_POINTS);
        assert!(chart.fills[0].label.starts_with("68%: $89."));
        assert_eq!(chart.fills.iter().map(|f| f.alpha).collect::<Vec<_>>(), vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_fill_points_lie_inside_band() {
        let r = report(57.3, 0.8, 15);
        let chart = ChartSpec::from_report(&r, None);

        for (fill, interval) in chart.fills.iter().zip(&r.projection.intervals) {
            assert!(fill.x.iter().all(|&x| interval.contains(x)));
            assert_eq!(fill.x.len(), fill.y.len());
        }
    }

    #[test]
    fn test_degenerate_projection_still_renders() {
        let chart = ChartSpec::from_report(&report(100.0, 0.0, 30), None);

        assert_eq!(chart.marker.x, 100.0);
        assert!(chart.fills.iter().all(|f| f.y.iter().all(|&d| d == 0.0)));
        assert_eq!(chart.fills[2].label, "99%: $100.00 - $100.00");
    }

    #[test]
    fn test_watermark_serialization() {
        let plain = ChartSpec::from_report(&report(100.0, 0.3, 30), None).to_json().unwrap();
        assert!(!plain.contains("watermark"));

        let marked = ChartSpec::from_report(&report(100.0, 0.3, 30), Some("research desk".to_string()))
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&marked).unwrap();
        assert_eq!(value["watermark"], "research desk");
        assert_eq!(value["fills"].as_array().unwrap().len(), 3);
    }
}
