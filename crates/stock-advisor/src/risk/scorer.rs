//! Risk Scorer
//!
//! Composite 1-99 score from annualized volatility, beta and the user's
//! salary relative to a benchmark income.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::indicators::sample_std;
use crate::model::RiskLevel;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const VOLATILITY_WEIGHT: f64 = 0.6;
const BETA_WEIGHT: f64 = 0.3;
const SALARY_WEIGHT: f64 = 25.0;
const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 99.0;

/// Standard deviation of daily returns scaled to a year.
///
/// Returns 0.0 when fewer than two returns exist or the result is not finite.
pub fn annualized_volatility(closes: &[f64]) -> f64 {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect();

    sample_std(&returns)
        .map(|std| std * TRADING_DAYS_PER_YEAR.sqrt())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
}

#[derive(Clone, Debug)]
pub struct RiskScorer {
    salary_benchmark: Decimal,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(Decimal::from(300_000))
    }
}

impl RiskScorer {
    pub fn new(salary_benchmark: Decimal) -> Self {
        Self { salary_benchmark }
    }

    /// 1 at zero income, falling linearly to 0 at the benchmark and above
    pub fn salary_factor(&self, salary: Decimal) -> f64 {
        if self.salary_benchmark <= Decimal::ZERO {
            return 0.0;
        }
        let capped = salary.min(self.salary_benchmark);
        let share = (capped / self.salary_benchmark).to_f64().unwrap_or(1.0);
        (1.0 - share).clamp(0.0, 1.0)
    }

    pub fn score(&self, volatility: f64, beta: f64, salary: Decimal) -> Result<RiskAssessment> {
        if salary <= Decimal::ZERO {
            return Err(AdvisorError::InvalidInput(format!(
                "salary must be positive, got {}",
                salary
            )));
        }

        let volatility = if volatility.is_finite() { volatility.max(0.0) } else { 0.0 };
        let beta = if beta.is_finite() { beta } else { 1.0 };

        let raw = volatility * 100.0 * VOLATILITY_WEIGHT
            + beta * 10.0 * BETA_WEIGHT
            + self.salary_factor(salary) * SALARY_WEIGHT;
        let score = raw.clamp(MIN_SCORE, MAX_SCORE);

        Ok(RiskAssessment {
            score,
            level: RiskLevel::from_score(score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_annualized_volatility() {
        assert_eq!(annualized_volatility(&[]), 0.0);
        assert_eq!(annualized_volatility(&[100.0, 101.0]), 0.0);
        assert_eq!(annualized_volatility(&[100.0, 100.0, 100.0]), 0.0);

        // returns +10% and -10%: sample std = 0.1 * sqrt(2)
        let vol = annualized_volatility(&[100.0, 110.0, 99.0]);
        let expected = 0.1 * 2.0_f64.sqrt() * 252.0_f64.sqrt();
        assert!((vol - expected).abs() < 1e-12);
    }

    #[test]
    fn test_score_formula() {
        let scorer = RiskScorer::default();
        // 0.25*100*0.6 + 1.2*10*0.3 + 0.5*25 = 15 + 3.6 + 12.5
        let assessment = scorer.score(0.25, 1.2, dec!(150000)).unwrap();
        assert!((assessment.score - 31.1).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_score_bounds() {
        let scorer = RiskScorer::default();
        let high = scorer.score(5.0, 4.0, dec!(1)).unwrap();
        assert_eq!(high.score, 99.0);
        assert_eq!(high.level, RiskLevel::VeryHigh);

        let low = scorer.score(0.0, -2.0, dec!(1000000)).unwrap();
        assert_eq!(low.score, 1.0);
    }

    #[test]
    fn test_score_monotonic() {
        let scorer = RiskScorer::default();
        let base = scorer.score(0.3, 1.0, dec!(80000)).unwrap().score;

        assert!(scorer.score(0.4, 1.0, dec!(80000)).unwrap().score >= base);
        assert!(scorer.score(0.3, 1.5, dec!(80000)).unwrap().score >= base);
        assert!(scorer.score(0.3, 1.0, dec!(120000)).unwrap().score <= base);
        // salary above the benchmark no longer matters
        assert_eq!(
            scorer.score(0.3, 1.0, dec!(300000)).unwrap().score,
            scorer.score(0.3, 1.0, dec!(900000)).unwrap().score
        );
    }

    #[test]
    fn test_invalid_salary() {
        let scorer = RiskScorer::default();
        assert!(matches!(
            scorer.score(0.3, 1.0, Decimal::ZERO),
            Err(AdvisorError::InvalidInput(_))
        ));
        assert!(scorer.score(0.3, 1.0, dec!(-5)).is_err());
    }
}
