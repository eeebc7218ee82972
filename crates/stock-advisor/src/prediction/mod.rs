//! Price Direction Prediction
//!
//! Classifier loading and inference plus the engine that combines
//! indicators, news sentiment and model output into a recommendation.

pub mod classifier;
pub mod engine;

pub use classifier::{
    Classifier, ClassifierHandle, FEATURE_NAMES, FeatureVector, ProbabilityModel, feature_vector,
};
pub use engine::{PredictionEngine, recommend_action};
