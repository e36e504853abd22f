use crate::types::{FeatureField, FeatureValue};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fmt, fs, path::Path};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("y contains previously unseen label: {0:?}")]
    UnseenLabel(String),
}

/// A fitted label → code mapping.
pub trait CategoricalEncoder: Send + Sync {
    fn transform(&self, label: &str) -> Result<i64, EncodeError>;
}

/// Encoder fitted over an ordered list of classes; a label's code is its
/// position in that list.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct LabelEncoderSpec {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code as i64).is_some() {
                return Err(anyhow!("duplicate class {:?}", class));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn transform(&self, label: &str) -> Result<i64, EncodeError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| EncodeError::UnseenLabel(label.to_string()))
    }
}

/// Named categorical encoders, keyed by encoder key (`car_type`, `weather`).
#[derive(Default)]
pub struct EncoderSet {
    encoders: HashMap<String, Box<dyn CategoricalEncoder>>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let specs: HashMap<String, LabelEncoderSpec> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let mut set = Self::new();
        for (key, spec) in specs {
            let encoder = LabelEncoder::new(spec.classes)
                .with_context(|| format!("invalid encoder {:?}", key))?;
            debug!("Loaded encoder {} with {} classes", key, encoder.classes().len());
            set.insert(key, encoder);
        }
        Ok(set)
    }

    pub fn insert(&mut self, key: impl Into<String>, encoder: impl CategoricalEncoder + 'static) {
        self.encoders.insert(key.into(), Box::new(encoder));
    }

    pub fn get(&self, key: &str) -> Option<&dyn CategoricalEncoder> {
        self.encoders.get(key).map(|e| &**e)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl fmt::Debug for EncoderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.encoders.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("EncoderSet").field("encoders", &keys).finish()
    }
}

/// The categorical inputs of the model and how their labels are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalField {
    CarType,
    Weather,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 2] = [CategoricalField::CarType, CategoricalField::Weather];

    /// Key of the encoder in the EncoderSet.
    pub fn encoder_key(self) -> &'static str {
        match self {
            CategoricalField::CarType => "car_type",
            CategoricalField::Weather => "weather",
        }
    }

    /// Feature the encoded code is stored under.
    pub fn feature(self) -> FeatureField {
        match self {
            CategoricalField::CarType => FeatureField::CarTypeEncoded,
            CategoricalField::Weather => FeatureField::WeatherEncoded,
        }
    }

    /// Applies the casing convention used when the encoders were fitted.
    /// Only car types are recased; weather labels are used as given.
    pub fn normalize_label(self, raw: &str) -> String {
        match self {
            CategoricalField::CarType => capitalize(raw),
            CategoricalField::Weather => raw.to_string(),
        }
    }

    /// Static label → code table used when no encoder can produce a code.
    pub fn fallback_code(self, label: &str) -> i64 {
        let mapped = match self {
            CategoricalField::CarType => match label {
                "Mini" => Some(0),
                "Sedan" => Some(1),
                "Suv" | "SUV" => Some(2),
                _ => None,
            },
            CategoricalField::Weather => match label {
                "Clear" => Some(0),
                "Cloudy" => Some(1),
                "Rainy" => Some(2),
                "Snowy" => Some(3),
                "Windy" => Some(4),
                "Fog" => Some(5),
                "Stormy" => Some(6),
                _ => None,
            },
        };
        mapped.unwrap_or(self.feature().default_value() as i64)
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Encodes one categorical value. Never fails: a missing encoder or a
/// rejected label falls back to the static table.
pub fn encode(field: CategoricalField, raw: &FeatureValue, encoders: &EncoderSet) -> i64 {
    let label = field.normalize_label(&raw.label());

    match encoders.get(field.encoder_key()) {
        Some(encoder) => match encoder.transform(&label) {
            Ok(code) => code,
            Err(e) => {
                let code = field.fallback_code(&label);
                warn!(
                    "Failed to encode {}: {}; using default code {}",
                    field.encoder_key(),
                    e,
                    code
                );
                code
            }
        },
        None => {
            let code = field.fallback_code(&label);
            debug!(
                "No encoder for {}, mapped {:?} to default code {}",
                field.encoder_key(),
                label,
                code
            );
            code
        }
    }
}
