use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::data::types::{LookbackPeriod, PricePoint, PriceSeries, Symbol};
use crate::data::DataError;

/// Daily-bar client for the Yahoo Finance v8 chart endpoint.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartData>>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

impl YahooClient {
    pub fn new(config: &DataConfig) -> Result<Self, DataError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch daily closes for `symbol` over `period`.
    /// One request per call; nothing is cached.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, DataError> {
        let url = self.build_url(symbol, period);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let series = classify_response(status, &body).map_err(|e| {
            warn!("Provider returned {} for {}: {}", status, symbol, e);
            e
        })?;

        info!(
            "Fetched {} daily closes for {} ({})",
            series.len(),
            symbol,
            period.label()
        );
        Ok(series)
    }

    fn build_url(&self, symbol: &Symbol, period: LookbackPeriod) -> String {
        format!(
            "{}/{}?range={}&interval=1d&includeAdjustedClose=true",
            self.base_url,
            symbol.as_str(),
            period.code()
        )
    }
}

/// Interpret an HTTP status and body together.
/// A failed status whose body is not a chart payload is a transport problem;
/// a chart payload is trusted whatever the status.
pub fn classify_response(status: StatusCode, body: &str) -> Result<PriceSeries, DataError> {
    match serde_json::from_str::<ChartResponse>(body) {
        Ok(response) => series_from_chart(response),
        Err(_) if !status.is_success() => {
            Err(DataError::NetworkFailure(format!("HTTP {}", status)))
        }
        Err(e) => Err(DataError::MalformedResponse(e.to_string())),
    }
}

/// Adjusted closes are used where the provider supplies them, raw closes otherwise.
/// Bars with no usable close (holidays, halts) are skipped.
fn series_from_chart(response: ChartResponse) -> Result<PriceSeries, DataError> {
    if let Some(err) = response.chart.error {
        return Err(if err.code.eq_ignore_ascii_case("Not Found") {
            DataError::NotFound
        } else {
            DataError::MalformedResponse(format!("[{}] {}", err.code, err.description))
        });
    }

    let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(data) => data,
        None => return Err(DataError::NotFound),
    };

    let closes = match data.indicators.quote.into_iter().next() {
        Some(block) => block.close,
        None => return Err(DataError::NotFound),
    };
    let adjusted = data
        .indicators
        .adjclose
        .and_then(|blocks| blocks.into_iter().next())
        .map(|block| block.adjclose);

    let bars = data.timestamp.len();
    if closes.len() != bars {
        return Err(DataError::MalformedResponse(format!(
            "{} timestamps but {} closes",
            bars,
            closes.len()
        )));
    }
    if let Some(adj) = &adjusted {
        if adj.len() != bars {
            return Err(DataError::MalformedResponse(format!(
                "{} timestamps but {} adjusted closes",
                bars,
                adj.len()
            )));
        }
    }

    let mut points = Vec::with_capacity(bars);
    for (i, (ts, close)) in data.timestamp.iter().zip(closes).enumerate() {
        let adj = adjusted.as_ref().and_then(|a| a[i]);
        let Some(close) = adj.or(close) else { continue };
        let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)
            .ok_or_else(|| DataError::MalformedResponse(format!("bad timestamp {}", ts)))?;
        points.push(PricePoint { timestamp, close });
    }

    PriceSeries::new(points)
}
