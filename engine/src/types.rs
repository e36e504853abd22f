use serde::Serialize;
use std::{
    collections::HashMap,
    ops::{Index, IndexMut},
};

/// Number of entries in a feature vector. The trained model is fitted
/// against exactly this many inputs.
pub const FEATURE_COUNT: usize = 8;

/// A loosely-typed feature value as it arrives on standard input.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl FeatureValue {
    /// Finite numeric reading of the value, if it has one.
    pub fn as_finite_f64(&self) -> Option<f64> {
        let value = match self {
            FeatureValue::Number(n) => *n,
            FeatureValue::Bool(b) => f64::from(u8::from(*b)),
            FeatureValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FeatureValue::Null => return None,
        };
        value.is_finite().then_some(value)
    }

    /// String form used for categorical encoder lookup. Booleans and null
    /// use the spellings the encoders were fitted with.
    pub fn label(&self) -> String {
        match self {
            FeatureValue::Number(n) => n.to_string(),
            FeatureValue::Bool(true) => "True".to_string(),
            FeatureValue::Bool(false) => "False".to_string(),
            FeatureValue::Text(s) => s.clone(),
            FeatureValue::Null => "None".to_string(),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FeatureValue::Number(_))
    }
}

impl From<serde_json::Value> for FeatureValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FeatureValue::Number)
                .unwrap_or(FeatureValue::Null),
            serde_json::Value::String(s) => FeatureValue::Text(s),
            serde_json::Value::Bool(b) => FeatureValue::Bool(b),
            // Arrays and objects have no numeric or label reading
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => FeatureValue::Null,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// Raw ride features keyed by name. Unknown keys are carried but never read.
pub type FeatureMap = HashMap<String, FeatureValue>;

/// Output of the normalizer. Same keys as the input map, with categorical
/// labels replaced by their numeric codes.
pub type NormalizedFeatures = FeatureMap;

/// The fields the model was trained on, in model input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureField {
    DistanceKm,
    Hour,
    DayOfWeek,
    Demand,
    AvailableTaxis,
    WeatherEncoded,
    BrandLoyaltyScore,
    CarTypeEncoded,
}

impl FeatureField {
    /// Canonical model input order. Changing this requires re-training.
    pub const ORDER: [FeatureField; FEATURE_COUNT] = [
        FeatureField::DistanceKm,
        FeatureField::Hour,
        FeatureField::DayOfWeek,
        FeatureField::Demand,
        FeatureField::AvailableTaxis,
        FeatureField::WeatherEncoded,
        FeatureField::BrandLoyaltyScore,
        FeatureField::CarTypeEncoded,
    ];

    /// Position of the field in [`FeatureField::ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureField::DistanceKm => "distance_km",
            FeatureField::Hour => "hour",
            FeatureField::DayOfWeek => "day_of_week",
            FeatureField::Demand => "demand",
            FeatureField::AvailableTaxis => "available_taxis",
            FeatureField::WeatherEncoded => "weather_encoded",
            FeatureField::BrandLoyaltyScore => "brand_loyalty_score",
            FeatureField::CarTypeEncoded => "car_type_encoded",
        }
    }

    /// Value used when the field is missing or not coercible to a number.
    /// The categorical fallback tables use the same defaults for unmapped labels.
    pub fn default_value(self) -> f64 {
        match self {
            FeatureField::DistanceKm => 0.0,
            FeatureField::Hour => 12.0,       // noon
            FeatureField::DayOfWeek => 1.0,   // Monday
            FeatureField::Demand => 0.0,
            FeatureField::AvailableTaxis => 10.0,
            FeatureField::WeatherEncoded => 0.0, // Clear
            FeatureField::BrandLoyaltyScore => 5.0,
            FeatureField::CarTypeEncoded => 1.0, // Sedan
        }
    }
}

/// Fixed-order numeric model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn defaults() -> Self {
        Self::new(FeatureField::ORDER.map(FeatureField::default_value))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Index<FeatureField> for FeatureVector {
    type Output = f64;

    fn index(&self, field: FeatureField) -> &f64 {
        &self.0[field.index()]
    }
}

impl IndexMut<FeatureField> for FeatureVector {
    fn index_mut(&mut self, field: FeatureField) -> &mut f64 {
        &mut self.0[field.index()]
    }
}

/// Terminal output of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub price: Option<f64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    pub fn success(price: f64) -> Self {
        Self {
            price: Some(price),
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            price: None,
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn to_json_line(&self) -> String {
        // Only f64/bool/String fields; serialization cannot fail for finite prices
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"price":null,"success":false,"error":"failed to serialize result"}"#.to_string()
        })
    }
}
