//! Normal price projection over a trading-day horizon.
//!
//! Annual volatility is scaled by `sqrt(horizon / 252)` and the terminal price is
//! modelled as `N(p, (p * sigma)^2)`. Intervals are equal-tailed, taken from the
//! exact inverse CDF rather than the 1/2/3-sigma shorthand.

use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::analysis::{AnalysisError, TRADING_DAYS_PER_YEAR};

pub const GRID_POINTS: usize = 200;

/// Half-width of the price grid in horizon sigmas.
const GRID_SIGMAS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfidenceLevel {
    P68,
    P95,
    P99,
}

impl ConfidenceLevel {
    /// Narrowest first.
    pub const ALL: [ConfidenceLevel; 3] =
        [ConfidenceLevel::P68, ConfidenceLevel::P95, ConfidenceLevel::P99];

    pub fn probability(&self) -> f64 {
        match self {
            ConfidenceLevel::P68 => 0.68,
            ConfidenceLevel::P95 => 0.95,
            ConfidenceLevel::P99 => 0.99,
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            ConfidenceLevel::P68 => 68,
            ConfidenceLevel::P95 => 95,
            ConfidenceLevel::P99 => 99,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub level: ConfidenceLevel,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResult {
    pub current_price: f64,
    pub horizon_days: u32,
    /// Volatility scaled to the horizon (fraction of price).
    pub sigma_horizon: f64,
    pub price_grid: Vec<f64>,
    pub density: Vec<f64>,
    /// Ordered as `ConfidenceLevel::ALL`.
    pub intervals: [ConfidenceInterval; 3],
}

impl ProjectionResult {
    pub fn interval(&self, level: ConfidenceLevel) -> &ConfidenceInterval {
        match level {
            ConfidenceLevel::P68 => &self.intervals[0],
            ConfidenceLevel::P95 => &self.intervals[1],
            ConfidenceLevel::P99 => &self.intervals[2],
        }
    }

    /// Zero volatility: the distribution is a point mass at the current price.
    pub fn is_degenerate(&self) -> bool {
        self.sigma_horizon == 0.0
    }

    /// Absolute standard deviation of the projected price.
    pub fn price_std_dev(&self) -> f64 {
        self.current_price * self.sigma_horizon
    }
}

/// `annual_volatility * sqrt(horizon_days / 252)`
pub fn horizon_sigma(annual_volatility: f64, horizon_days: u32) -> f64 {
    annual_volatility * (horizon_days as f64 / TRADING_DAYS_PER_YEAR).sqrt()
}

/// `n` evenly spaced points over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub fn project(
    current_price: f64,
    annual_volatility: f64,
    horizon_days: u32,
) -> Result<ProjectionResult, AnalysisError> {
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "current price must be positive, got {}",
            current_price
        )));
    }
    if !annual_volatility.is_finite() || annual_volatility < 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "annual volatility must be non-negative, got {}",
            annual_volatility
        )));
    }
    if horizon_days == 0 {
        return Err(AnalysisError::InvalidParameter(
            "horizon must be at least one day".to_string(),
        ));
    }

    let sigma = horizon_sigma(annual_volatility, horizon_days);
    let std_dev = current_price * sigma;

    if std_dev == 0.0 {
        return Ok(ProjectionResult {
            current_price,
            horizon_days,
            sigma_horizon: 0.0,
            price_grid: vec![current_price; GRID_POINTS],
            density: vec![0.0; GRID_POINTS],
            intervals: ConfidenceLevel::ALL.map(|level| ConfidenceInterval {
                level,
                lower: current_price,
                upper: current_price,
            }),
        });
    }

    let normal = Normal::new(current_price, std_dev)
        .map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;

    let price_grid = linspace(
        current_price * (1.0 - GRID_SIGMAS * sigma),
        current_price * (1.0 + GRID_SIGMAS * sigma),
        GRID_POINTS,
    );
    let density = price_grid.iter().map(|&x| normal.pdf(x)).collect();

    let intervals = ConfidenceLevel::ALL.map(|level| {
        let tail = (1.0 - level.probability()) / 2.0;
        ConfidenceInterval {
            level,
            lower: normal.inverse_cdf(tail),
            upper: normal.inverse_cdf(1.0 - tail),
        }
    });

    Ok(ProjectionResult {
        current_price,
        horizon_days,
        sigma_horizon: sigma,
        price_grid,
        density,
        intervals,
    })
}
