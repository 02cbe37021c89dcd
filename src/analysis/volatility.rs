use crate::analysis::{AnalysisError, TRADING_DAYS_PER_YEAR};
use crate::data::types::PriceSeries;

pub const DEFAULT_WINDOW: usize = 30;

/// Rolling annualized volatility, aligned with the simple-return series.
/// Entry `i` covers returns `i+1-window ..= i`; earlier entries are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilitySeries {
    window: usize,
    price_count: usize,
    values: Vec<Option<f64>>,
}

impl VolatilitySeries {
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// The most recent estimate, which is the one projections consume.
    pub fn latest(&self) -> Result<f64, AnalysisError> {
        match self.values.last().copied().flatten() {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(AnalysisError::InsufficientHistory {
                required: self.window + 1,
                available: self.price_count,
            }),
        }
    }
}

/// `r_i = p_i / p_{i-1} - 1`
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

pub fn rolling_volatility(
    prices: &PriceSeries,
    window: usize,
) -> Result<VolatilitySeries, AnalysisError> {
    if window < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "volatility window must be at least 2, got {}",
            window
        )));
    }

    let returns = simple_returns(&prices.closes());
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let values = (0..returns.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(sample_std(&returns[i + 1 - window..=i]) * annualizer)
            }
        })
        .collect();

    Ok(VolatilitySeries {
        window,
        price_count: prices.len(),
        values,
    })
}

/// Standard deviation with the n-1 denominator.
fn sample_std(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::PricePoint;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    timestamp: start + Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
        .unwrap()
    }

    fn random_walk(seed: u64, len: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut price = 100.0;
        (0..len)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.04..0.04);
                price
            })
            .collect()
    }

    #[test]
    fn test_simple_returns() {
        let r = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
        assert!(simple_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_sample_std_known_value() {
        // var = ((1-2.5)^2 + (2-2.5)^2 + (3-2.5)^2 + (4-2.5)^2) / 3 = 5/3
        assert!((sample_std(&[1.0, 2.0, 3.0, 4.0]) - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_and_undefined_prefix() {
        let prices = series(&random_walk(7, 10));
        let vol = rolling_volatility(&prices, 4).unwrap();

        assert_eq!(vol.values().len(), 9);
        assert!(vol.values()[..3].iter().all(Option::is_none));
        assert!(vol.values()[3..].iter().all(Option::is_some));
    }

    #[test]
    fn test_annualized_window_value() {
        let closes = [100.0, 101.0, 99.0, 102.0];
        let prices = series(&closes);
        let vol = rolling_volatility(&prices, 3).unwrap();

        let returns = simple_returns(&closes);
        let expected = sample_std(&returns) * 252f64.sqrt();
        assert!((vol.latest().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_constant_prices_have_zero_volatility() {
        let prices = series(&[100.0; 60]);
        let vol = rolling_volatility(&prices, DEFAULT_WINDOW).unwrap();

        assert_eq!(vol.latest().unwrap(), 0.0);
    }

    #[test]
    fn test_exactly_window_plus_one_prices() {
        let prices = series(&random_walk(3, DEFAULT_WINDOW + 1));
        let vol = rolling_volatility(&prices, DEFAULT_WINDOW).unwrap();

        assert!(vol.latest().unwrap() > 0.0);
    }

    #[test]
    fn test_short_history_is_reported() {
        let prices = series(&random_walk(11, 20));
        let vol = rolling_volatility(&prices, DEFAULT_WINDOW).unwrap();

        assert_eq!(
            vol.latest(),
            Err(AnalysisError::InsufficientHistory { required: 31, available: 20 })
        );
    }

    #[test]
    fn test_single_price_is_reported() {
        let prices = series(&[42.0]);
        let vol = rolling_volatility(&prices, DEFAULT_WINDOW).unwrap();

        assert!(vol.values().is_empty());
        assert!(matches!(vol.latest(), Err(AnalysisError::InsufficientHistory { .. })));
    }

    #[test]
    fn test_window_too_small() {
        let prices = series(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            rolling_volatility(&prices, 1),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_random_walks_give_non_negative_latest() {
        for seed in 0..25 {
            let prices = series(&random_walk(seed, 40 + seed as usize));
            let latest = rolling_volatility(&prices, DEFAULT_WINDOW)
                .unwrap()
                .latest()
                .unwrap();
            assert!(latest.is_finite() && latest >= 0.0, "seed {} gave {}", seed, latest);
        }
    }
}
