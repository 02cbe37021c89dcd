use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::projection::{project, ProjectionResult};
use crate::analysis::volatility::rolling_volatility;
use crate::analysis::AnalysisError;
use crate::config::DataConfig;
use crate::data::types::{LookbackPeriod, PriceSeries, Symbol};
use crate::data::yahoo::YahooClient;
use crate::data::DataError;

pub const MIN_HORIZON_DAYS: u32 = 1;
pub const MAX_HORIZON_DAYS: u32 = 90;

/// One user interaction: built fresh, never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub symbol: Symbol,
    pub period: LookbackPeriod,
    pub horizon_days: u32,
    pub window: usize,
}

impl AnalysisRequest {
    pub fn new(
        symbol: &str,
        period: LookbackPeriod,
        horizon_days: u32,
        window: usize,
    ) -> Result<Self, PipelineError> {
        let symbol = Symbol::parse(symbol)?;

        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
            return Err(AnalysisError::InvalidParameter(format!(
                "horizon must be between {} and {} days, got {}",
                MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, horizon_days
            ))
            .into());
        }

        Ok(Self {
            symbol,
            period,
            horizon_days,
            window,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Everything the display layer needs for one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: Symbol,
    pub period: LookbackPeriod,
    pub as_of: DateTime<Utc>,
    pub observations: usize,
    pub annual_volatility: f64,
    pub projection: ProjectionResult,
}

/// Volatility and projection stages over an already-fetched series.
pub fn analyze_series(
    request: &AnalysisRequest,
    prices: &PriceSeries,
) -> Result<AnalysisReport, AnalysisError> {
    let volatility = rolling_volatility(prices, request.window)?;
    let annual_volatility = volatility.latest()?;
    let last = prices.last();

    info!(
        "{}: price={:.2}, annualized volatility={:.2}% ({}-day window)",
        request.symbol,
        last.close,
        annual_volatility * 100.0,
        volatility.window()
    );

    debug!(
        "{} of {} rolling estimates defined",
        volatility.values().iter().flatten().count(),
        volatility.values().len()
    );

    let projection = project(last.close, annual_volatility, request.horizon_days)?;
    if projection.is_degenerate() {
        warn!("{}: zero volatility, projection collapses to the current price", request.symbol);
    } else {
        debug!(
            "{}-day sigma {:.4} (price std dev {:.2})",
            request.horizon_days,
            projection.sigma_horizon,
            projection.price_std_dev()
        );
    }

    Ok(AnalysisReport {
        symbol: request.symbol.clone(),
        period: request.period,
        as_of: last.timestamp,
        observations: prices.len(),
        annual_volatility,
        projection,
    })
}

/// Fetch, estimate, project. Any failure stops the chain before rendering.
pub async fn run(
    client: &YahooClient,
    request: &AnalysisRequest,
) -> Result<AnalysisReport, PipelineError> {
    info!(
        "Analyzing {} over {} with a {}-day horizon",
        request.symbol,
        request.period.label(),
        request.horizon_days
    );

    let prices = client.fetch(&request.symbol, request.period).await?;
    Ok(analyze_series(request, &prices)?)
}

/// `run` with a client built from `config`; client setup failures are data errors too.
pub async fn run_with_config(
    config: &DataConfig,
    request: &AnalysisRequest,
) -> Result<AnalysisReport, PipelineError> {
    let client = YahooClient::new(config)?;
    run(&client, request).await
}
