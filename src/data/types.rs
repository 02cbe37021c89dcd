use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::data::DataError;

const MAX_SYMBOL_LEN: usize = 20;

/// Exchange-qualified ticker, e.g. `GGAL.BA` or `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, DataError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^[A-Z0-9^][A-Z0-9.\-=^]*$").expect("symbol pattern is valid")
        });

        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty()
            || normalized.len() > MAX_SYMBOL_LEN
            || !pattern.is_match(&normalized)
        {
            return Err(DataError::InvalidSymbol(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Historical window requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LookbackPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
}

impl LookbackPeriod {
    pub const ALL: [LookbackPeriod; 6] = [
        LookbackPeriod::OneMonth,
        LookbackPeriod::ThreeMonths,
        LookbackPeriod::SixMonths,
        LookbackPeriod::OneYear,
        LookbackPeriod::TwoYears,
        LookbackPeriod::FiveYears,
    ];

    /// Provider range code.
    pub fn code(&self) -> &'static str {
        match self {
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::FiveYears => "5y",
        }
    }

    /// Human label shown in selectors.
    pub fn label(&self) -> &'static str {
        match self {
            LookbackPeriod::OneMonth => "1 month",
            LookbackPeriod::ThreeMonths => "3 months",
            LookbackPeriod::SixMonths => "6 months",
            LookbackPeriod::OneYear => "1 year",
            LookbackPeriod::TwoYears => "2 years",
            LookbackPeriod::FiveYears => "5 years",
        }
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for LookbackPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.code() == needle || p.label() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown lookback period '{}' (expected one of: 1mo, 3mo, 6mo, 1y, 2y, 5y)",
                    s
                )
            })
    }
}

impl TryFrom<String> for LookbackPeriod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LookbackPeriod> for String {
    fn from(value: LookbackPeriod) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Daily closes in strictly increasing time order, all positive.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DataError> {
        if points.is_empty() {
            return Err(DataError::NotFound);
        }

        if let Some(bad) = points.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(DataError::MalformedResponse(format!(
                "non-positive close {} at {}",
                bad.close, bad.timestamp
            )));
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(DataError::MalformedResponse(format!(
                "timestamps not strictly increasing: {} then {}",
                pair[0].timestamp, pair[1].timestamp
            )));
        }

        Ok(Self { points })
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Most recent bar. A series is never empty.
    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }
}
