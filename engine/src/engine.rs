use crate::{
    encoders::EncoderSet,
    error::{validation_error, AppError},
    features::Featurizer,
    models::{Model, Predictor},
    types::{FeatureMap, FeatureValue, PredictionResult},
};
use std::path::Path;
use tracing::{debug, info};

/// Loaded artifacts for a single prediction.
pub struct PriceEngine {
    model: Box<dyn Predictor>,
    encoders: EncoderSet,
}

impl PriceEngine {
    pub fn new(model: Box<dyn Predictor>, encoders: EncoderSet) -> Self {
        Self { model, encoders }
    }

    /// Loads the model, then the encoders. Either failing is fatal.
    pub fn load(model_path: &Path, encoder_path: &Path) -> Result<Self, AppError> {
        let model = Model::load_from_file(model_path)
            .map_err(|e| AppError::ModelLoad(format!("{:#}", e)))?;
        let encoders = EncoderSet::load_from_file(encoder_path)
            .map_err(|e| AppError::EncoderLoad(format!("{:#}", e)))?;
        if encoders.is_empty() {
            debug!("No encoders configured, static fallback tables apply");
        }

        info!(
            "Loaded {} model and {} encoders",
            model.kind(),
            encoders.len()
        );
        Ok(Self::new(Box::new(model), encoders))
    }

    pub fn predict(&self, raw_input: &str) -> Result<f64, AppError> {
        let features = parse_features(raw_input)?;
        let vector = Featurizer::new(&self.encoders).prepare(&features);

        let prediction = self.model.predict(&vector)?;
        debug!("Raw model prediction: {}", prediction);

        // Prices are never negative; NaN also lands on zero
        let price = if prediction > 0.0 { prediction } else { 0.0 };
        info!("Predicted price {}", price);
        Ok(price)
    }
}

/// Parses the stdin payload into a feature map. Anything but a JSON object
/// is rejected.
pub fn parse_features(raw_input: &str) -> Result<FeatureMap, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw_input)?;
    match value {
        serde_json::Value::Object(object) => Ok(object
            .into_iter()
            .map(|(key, value)| (key, FeatureValue::from(value)))
            .collect()),
        _ => Err(validation_error("expected a JSON object of features")),
    }
}

/// Runs one prediction end to end. Every failure, including artifact load
/// errors, comes back as a failed PredictionResult.
pub fn run(model_path: &Path, encoder_path: &Path, raw_input: &str) -> PredictionResult {
    match PriceEngine::load(model_path, encoder_path).and_then(|engine| engine.predict(raw_input)) {
        Ok(price) => PredictionResult::success(price),
        Err(e) => e.into_result(),
    }
}
