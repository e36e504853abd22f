use crate::{
    error::{inference_error, AppError},
    types::FeatureVector,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

/// A trained regressor that scores one feature vector.
pub trait Predictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, AppError>;
}

/// Linear regression: `intercept + Σ coefficients[i] * x[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Predictor for LinearRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        if self.coefficients.len() != features.len() {
            return Err(inference_error(format!(
                "X has {} features, but model is expecting {} features as input",
                features.len(),
                self.coefficients.len()
            )));
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum();
        Ok(self.intercept + dot)
    }
}

/// A node in a regression tree. Samples with `x[feature] <= threshold`
/// go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn evaluate(&self, x: &[f64]) -> Result<f64, AppError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        inference_error(format!(
                            "split on feature {} but input has {} features",
                            feature,
                            x.len()
                        ))
                    })?;
                    node = if value <= threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Bagged trees; the prediction is the mean tree output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub trees: Vec<TreeNode>,
}

impl Predictor for RandomForestRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        if self.trees.is_empty() {
            return Err(inference_error("random forest has no trees"));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features.as_slice())?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

/// Boosted trees: `base_score + learning_rate * Σ tree outputs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub base_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<TreeNode>,
}

impl Predictor for GradientBoostingRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features.as_slice())?;
        }
        Ok(self.base_score + self.learning_rate * total)
    }
}

/// On-disk model artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Model {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let model: Model = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!(
            "Loaded {} model from {} (max tree depth {})",
            model.kind(),
            path.display(),
            model.max_depth()
        );
        Ok(model)
    }

    /// Depth of the deepest tree; 0 for linear models.
    pub fn max_depth(&self) -> usize {
        let trees: &[TreeNode] = match self {
            Model::Linear(_) => &[],
            Model::RandomForest(m) => m.trees.as_slice(),
            Model::GradientBoosting(m) => m.trees.as_slice(),
        };
        trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Model::Linear(_) => "linear",
            Model::RandomForest(_) => "random_forest",
            Model::GradientBoosting(_) => "gradient_boosting",
        }
    }
}

impl Predictor for Model {
    fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        let prediction = match self {
            Model::Linear(m) => m.predict(features),
            Model::RandomForest(m) => m.predict(features),
            Model::GradientBoosting(m) => m.predict(features),
        }?;

        if !prediction.is_finite() {
            return Err(inference_error(format!(
                "model produced a non-finite prediction ({})",
                prediction
            )));
        }
        Ok(prediction)
    }
}
