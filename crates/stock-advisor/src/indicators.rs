//! Technical Indicator Calculator
//!
//! Pure functions from a chronological bar series to per-bar indicator rows.
//! Windows follow trailing-window semantics: a rolling value exists only once
//! its whole window is populated, otherwise the field is `None`. Exponential
//! averages are recursive (`EMA[0] = close[0]`, no bias adjustment) and are
//! therefore defined from the first bar.
//!
//! The row layout and formulas are the feature contract of the prediction
//! classifier; changing either silently changes model inputs.

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::model::PriceBar;

/// Longest look-back used by any indicator (EMA 26 inside MACD)
pub const LONGEST_LOOKBACK: usize = 26;

const RSI_PERIOD: usize = 14;
const MOMENTUM_PERIOD: usize = 10;
const VOLATILITY_WINDOW: usize = 20;
const BOLLINGER_WINDOW: usize = 20;
const BOLLINGER_STDDEVS: f64 = 2.0;

/// Indicator values for one bar; `None` marks an undefined value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorVector {
    pub returns: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    pub ema_5: Option<f64>,
    pub ema_20: Option<f64>,
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub bb_width: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub momentum: Option<f64>,
    pub roc: Option<f64>,
}

impl IndicatorVector {
    pub const FIELD_NAMES: [&'static str; 14] = [
        "returns",
        "sma_5",
        "sma_10",
        "sma_20",
        "ema_5",
        "ema_20",
        "volatility",
        "rsi",
        "macd",
        "signal_line",
        "bb_width",
        "volume_ratio",
        "momentum",
        "roc",
    ];

    /// Substitute the neutral defaults: RSI 50, volume ratio 1, everything else 0
    pub fn to_features(&self) -> FeatureRow {
        FeatureRow {
            returns: self.returns.unwrap_or(0.0),
            sma_5: self.sma_5.unwrap_or(0.0),
            sma_10: self.sma_10.unwrap_or(0.0),
            sma_20: self.sma_20.unwrap_or(0.0),
            ema_5: self.ema_5.unwrap_or(0.0),
            ema_20: self.ema_20.unwrap_or(0.0),
            volatility: self.volatility.unwrap_or(0.0),
            rsi: self.rsi.unwrap_or(50.0),
            macd: self.macd.unwrap_or(0.0),
            signal_line: self.signal_line.unwrap_or(0.0),
            bb_width: self.bb_width.unwrap_or(0.0),
            volume_ratio: self.volume_ratio.unwrap_or(1.0),
            momentum: self.momentum.unwrap_or(0.0),
            roc: self.roc.unwrap_or(0.0),
        }
    }
}

/// Fully populated indicator row consumed by the classifier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub returns: f64,
    pub sma_5: f64,
    pub sma_10: f64,
    pub sma_20: f64,
    pub ema_5: f64,
    pub ema_20: f64,
    pub volatility: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub bb_width: f64,
    pub volume_ratio: f64,
    pub momentum: f64,
    pub roc: f64,
}

impl FeatureRow {
    pub fn to_array(&self) -> [f64; 14] {
        [
            self.returns,
            self.sma_5,
            self.sma_10,
            self.sma_20,
            self.ema_5,
            self.ema_20,
            self.volatility,
            self.rsi,
            self.macd,
            self.signal_line,
            self.bb_width,
            self.volume_ratio,
            self.momentum,
            self.roc,
        ]
    }
}

/// Compute one indicator row per bar.
pub fn calculate(bars: &[PriceBar]) -> Result<Vec<IndicatorVector>> {
    if bars.is_empty() {
        return Err(AdvisorError::DataInsufficient(
            "indicator calculation needs at least one price bar".into(),
        ));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let n = closes.len();

    let returns: Vec<Option<f64>> = (0..n)
        .map(|t| {
            if t == 0 {
                return None;
            }
            ratio(closes[t], closes[t - 1]).map(|r| r - 1.0)
        })
        .collect();

    let close_opt: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    let sma_5 = rolling_mean(&close_opt, 5);
    let sma_10 = rolling_mean(&close_opt, 10);
    let sma_20 = rolling_mean(&close_opt, BOLLINGER_WINDOW);
    let close_std_20 = rolling_std(&close_opt, BOLLINGER_WINDOW);

    let ema_5 = ema(&closes, 5);
    let ema_12 = ema(&closes, 12);
    let ema_20 = ema(&closes, 20);
    let ema_26 = ema(&closes, LONGEST_LOOKBACK);
    let macd: Vec<f64> = ema_12.iter().zip(&ema_26).map(|(a, b)| a - b).collect();
    let signal = ema(&macd, 9);

    let volatility = rolling_std(&returns, VOLATILITY_WINDOW);
    let rsi = rsi(&closes, RSI_PERIOD);

    let volume_opt: Vec<Option<f64>> = volumes.iter().copied().map(Some).collect();
    let volume_sma = rolling_mean(&volume_opt, VOLATILITY_WINDOW);

    let rows = (0..n)
        .map(|t| {
            let bb_width = match (sma_20[t], close_std_20[t]) {
                (Some(middle), Some(std)) => {
                    let upper = middle + std * BOLLINGER_STDDEVS;
                    let lower = middle - std * BOLLINGER_STDDEVS;
                    ratio(upper - lower, middle)
                }
                _ => None,
            };
            let lagged = t.checked_sub(MOMENTUM_PERIOD).map(|i| closes[i]);

            IndicatorVector {
                returns: returns[t],
                sma_5: sma_5[t],
                sma_10: sma_10[t],
                sma_20: sma_20[t],
                ema_5: Some(ema_5[t]),
                ema_20: Some(ema_20[t]),
                volatility: volatility[t],
                rsi: rsi[t],
                macd: Some(macd[t]),
                signal_line: Some(signal[t]),
                bb_width,
                volume_ratio: volume_sma[t].and_then(|avg| ratio(volumes[t], avg)),
                momentum: lagged.map(|prev| closes[t] - prev),
                roc: lagged.and_then(|prev| ratio(closes[t] - prev, prev)).map(|r| r * 100.0),
            }
        })
        .collect();

    Ok(rows)
}

/// Indicator row for the most recent bar.
pub fn latest(bars: &[PriceBar]) -> Result<IndicatorVector> {
    calculate(bars)?
        .pop()
        .ok_or_else(|| AdvisorError::DataInsufficient("no indicator rows".into()))
}

/// Division that yields `None` instead of an infinite or NaN result
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Recursive EMA with `alpha = 2 / (span + 1)`, seeded with the first value
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        let next = match prev {
            Some(p) => alpha * value + (1.0 - alpha) * p,
            None => value,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

fn full_window(values: &[Option<f64>], end: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || end + 1 < window {
        return None;
    }
    values[end + 1 - window..=end].iter().copied().collect()
}

/// Trailing mean; `None` until the window holds `window` defined values
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            full_window(values, t, window).map(|w| w.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Trailing sample standard deviation (ddof = 1)
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| full_window(values, t, window).and_then(|w| sample_std(&w)))
        .collect()
}

/// Sample standard deviation; `None` for fewer than two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    let std = var.sqrt();
    std.is_finite().then_some(std)
}

/// RSI from simple-average gains and losses.
///
/// The first bar has no prior close; its change counts as zero so the first
/// value appears at index `period - 1`. A window without losses has no
/// defined relative strength and yields `None`.
fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let deltas: Vec<f64> = (0..closes.len())
        .map(|t| if t == 0 { 0.0 } else { closes[t] - closes[t - 1] })
        .collect();
    let gains: Vec<Option<f64>> = deltas.iter().map(|d| Some(d.max(0.0))).collect();
    let losses: Vec<Option<f64>> = deltas.iter().map(|d| Some((-d).max(0.0))).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| {
            let rs = ratio(gain?, loss?)?;
            Some(100.0 - 100.0 / (1.0 + rs))
        })
        .collect()
}
