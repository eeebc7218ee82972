//! Direction Classifier
//!
//! Loads a serialized classifier bundle (feature contract, standard scaler
//! and either a logistic or a gradient-boosted tree model) and turns a
//! feature vector into `[p_down, p_up]`.
//!
//! ```json
//! { "features": ["returns", "...", "sentiment"],
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "model": { "kind": "logistic", "coefficients": [...], "intercept": 0.1 } }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{AdvisorError, Result};
use crate::indicators::{FeatureRow, IndicatorVector};

pub const FEATURE_COUNT: usize = 15;

/// Feature contract: indicator fields in order, then the sentiment score
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    IndicatorVector::FIELD_NAMES[0],
    IndicatorVector::FIELD_NAMES[1],
    IndicatorVector::FIELD_NAMES[2],
    IndicatorVector::FIELD_NAMES[3],
    IndicatorVector::FIELD_NAMES[4],
    IndicatorVector::FIELD_NAMES[5],
    IndicatorVector::FIELD_NAMES[6],
    IndicatorVector::FIELD_NAMES[7],
    IndicatorVector::FIELD_NAMES[8],
    IndicatorVector::FIELD_NAMES[9],
    IndicatorVector::FIELD_NAMES[10],
    IndicatorVector::FIELD_NAMES[11],
    IndicatorVector::FIELD_NAMES[12],
    IndicatorVector::FIELD_NAMES[13],
    "sentiment",
];

pub type FeatureVector = [f64; FEATURE_COUNT];

pub fn feature_vector(row: &FeatureRow, sentiment: f64) -> FeatureVector {
    let mut features = [0.0; FEATURE_COUNT];
    features[..14].copy_from_slice(&row.to_array());
    features[14] = sentiment;
    features
}

/// Binary classifier over the feature contract
pub trait ProbabilityModel: Send + Sync {
    /// `[p_down, p_up]`, summing to 1
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2]>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (i, value) in features.iter().enumerate() {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            scaled[i] = (value - self.mean[i]) / scale;
        }
        scaled
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk from the root; `x <= threshold` goes left
    fn evaluate(&self, x: &FeatureVector) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Children must point forward so evaluation always terminates
    fn validate(&self, tree_index: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_index));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("tree {} node {} has a non-finite value", tree_index, i));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("tree {} node {} splits on feature {}", tree_index, i, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {} node {} has a non-finite threshold", tree_index, i));
                    }
                    let in_range = |child: usize| child > i && child < self.nodes.len();
                    if !in_range(*left) || !in_range(*right) {
                        return Err(format!("tree {} node {} has an invalid child index", tree_index, i));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    GradientBoosting {
        learning_rate: f64,
        init: f64,
        trees: Vec<RegressionTree>,
    },
}

/// Deserialized classifier bundle
#[derive(Debug, Clone, Deserialize)]
pub struct Classifier {
    pub features: Vec<String>,
    pub scaler: StandardScaler,
    pub model: ModelSpec,
}

impl Classifier {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AdvisorError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let classifier: Classifier = serde_json::from_str(raw)
            .map_err(|e| AdvisorError::ModelUnavailable(format!("malformed artifact: {}", e)))?;
        classifier.validate().map_err(AdvisorError::ModelUnavailable)?;
        Ok(classifier)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.features.len() != FEATURE_COUNT
            || self.features.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            return Err(format!(
                "feature contract mismatch: expected {:?}, found {:?}",
                FEATURE_NAMES, self.features
            ));
        }

        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());
        if self.scaler.mean.len() != FEATURE_COUNT || self.scaler.scale.len() != FEATURE_COUNT {
            return Err("scaler dimensions do not match the feature contract".into());
        }
        if !finite(&self.scaler.mean) || !finite(&self.scaler.scale) {
            return Err("scaler contains non-finite values".into());
        }

        match &self.model {
            ModelSpec::Logistic { coefficients, intercept } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(format!("expected {} coefficients, found {}", FEATURE_COUNT, coefficients.len()));
                }
                if !finite(coefficients) || !intercept.is_finite() {
                    return Err("logistic model contains non-finite values".into());
                }
            }
            ModelSpec::GradientBoosting { learning_rate, init, trees } => {
                if !learning_rate.is_finite() || !init.is_finite() {
                    return Err("boosting parameters must be finite".into());
                }
                if trees.is_empty() {
                    return Err("gradient boosting model has no trees".into());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i)?;
                }
            }
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ProbabilityModel for Classifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2]> {
        let x = self.scaler.transform(features);

        let raw = match &self.model {
            ModelSpec::Logistic { coefficients, intercept } => {
                intercept + coefficients.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>()
            }
            ModelSpec::GradientBoosting { learning_rate, init, trees } => {
                init + learning_rate * trees.iter().map(|t| t.evaluate(&x)).sum::<f64>()
            }
        };

        let p_up = sigmoid(raw);
        if !p_up.is_finite() {
            return Err(AdvisorError::DataInsufficient(
                "features produced a non-finite probability".into(),
            ));
        }
        Ok([1.0 - p_up, p_up])
    }
}

type LoadOutcome = std::result::Result<Arc<dyn ProbabilityModel>, String>;

/// Lazily loaded, process-wide classifier.
///
/// The first caller loads the artifact on the blocking pool; every later
/// caller sees the same outcome, including a failed load.
pub struct ClassifierHandle {
    path: PathBuf,
    cell: OnceCell<LoadOutcome>,
}

impl ClassifierHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Wrap an already built model
    pub fn with_model(model: Arc<dyn ProbabilityModel>) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::from(Ok(model)),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn ProbabilityModel>> {
        let outcome = self.cell.get_or_init(|| self.load()).await;
        outcome.clone().map_err(AdvisorError::ModelUnavailable)
    }

    async fn load(&self) -> LoadOutcome {
        let path = self.path.clone();
        let joined = tokio::task::spawn_blocking(move || Classifier::load(&path)).await;

        match joined {
            Ok(Ok(classifier)) => {
                info!("Loaded classifier from {}", self.path.display());
                Ok(Arc::new(classifier) as Arc<dyn ProbabilityModel>)
            }
            Ok(Err(e)) => {
                error!("Classifier unavailable: {}", e);
                Err(e.to_string())
            }
            Err(e) => {
                error!("Classifier load task failed: {}", e);
                Err(format!("load task failed: {}", e))
            }
        }
    }
}
