//! Risk Profiling
//!
//! Volatility-based risk scoring, alternative-stock sampling and the
//! per-user profile assembly that ties them together.

pub mod profile;
pub mod scorer;
pub mod suggestions;

pub use profile::RiskProfiler;
pub use scorer::{RiskAssessment, RiskScorer, annualized_volatility};
pub use suggestions::SuggestionSampler;
