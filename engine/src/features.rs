use crate::{
    encoders::{self, CategoricalField, EncoderSet},
    types::{FeatureField, FeatureMap, FeatureValue, FeatureVector, NormalizedFeatures},
};
use tracing::debug;

/// Turns a raw feature map into the model's input vector.
pub struct Featurizer<'a> {
    encoders: &'a EncoderSet,
}

impl<'a> Featurizer<'a> {
    pub fn new(encoders: &'a EncoderSet) -> Self {
        Self { encoders }
    }

    /// Replaces raw categorical labels with their codes. Values that are
    /// already numeric, and every other field, are left as they are.
    pub fn normalize(&self, features: &FeatureMap) -> NormalizedFeatures {
        let mut normalized = features.clone();

        for field in CategoricalField::ALL {
            let name = field.feature().name();
            if let Some(value) = normalized.get_mut(name) {
                if !value.is_number() {
                    let code = encoders::encode(field, value, self.encoders);
                    *value = FeatureValue::Number(code as f64);
                }
            }
        }

        normalized
    }

    /// Assembles the vector in canonical order, substituting the field
    /// default for anything missing or non-numeric.
    pub fn vectorize(&self, normalized: &NormalizedFeatures) -> FeatureVector {
        let mut vector = FeatureVector::defaults();

        for field in FeatureField::ORDER {
            let Some(value) = normalized.get(field.name()) else {
                continue;
            };
            match value.as_finite_f64() {
                Some(number) => vector[field] = number,
                None => debug!(
                    "Feature {} is not numeric ({:?}), using default {}",
                    field.name(),
                    value,
                    vector[field]
                ),
            }
        }

        vector
    }

    pub fn prepare(&self, features: &FeatureMap) -> FeatureVector {
        let vector = self.vectorize(&self.normalize(features));
        debug!("Prepared feature vector: {:?}", vector.as_slice());
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::LabelEncoder;
    use pretty_assertions::assert_eq;

    fn map(pairs: &[(&str, FeatureValue)]) -> FeatureMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_map_yields_defaults() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);
        assert_eq!(
            featurizer.prepare(&FeatureMap::new()).as_slice(),
            &[0.0, 12.0, 1.0, 0.0, 10.0, 0.0, 5.0, 1.0]
        );
    }

    #[test]
    fn test_full_ride() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);
        let features = map(&[
            ("distance_km", FeatureValue::Number(5.0)),
            ("hour", FeatureValue::Number(18.0)),
            ("day_of_week", FeatureValue::Number(3.0)),
            ("demand", FeatureValue::Number(50.0)),
            ("available_taxis", FeatureValue::Number(8.0)),
            ("weather_encoded", "Clear".into()),
            ("brand_loyalty_score", FeatureValue::Number(7.5)),
            ("car_type_encoded", "sedan".into()),
        ]);
        assert_eq!(
            featurizer.prepare(&features).as_slice(),
            &[5.0, 18.0, 3.0, 50.0, 8.0, 0.0, 7.5, 1.0]
        );
    }

    #[test]
    fn test_malformed_values_default() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);
        let features = map(&[
            ("distance_km", "twelve".into()),
            ("hour", FeatureValue::Null),
            ("demand", "75".into()),
            ("available_taxis", f64::NAN.into()),
        ]);
        let vector = featurizer.prepare(&features);
        assert_eq!(vector[FeatureField::DistanceKm], 0.0);
        assert_eq!(vector[FeatureField::Hour], 12.0);
        assert_eq!(vector[FeatureField::Demand], 75.0);
        assert_eq!(vector[FeatureField::AvailableTaxis], 10.0);
    }

    #[test]
    fn test_boolean_and_null_values() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);
        let features = map(&[
            ("car_type_encoded", FeatureValue::Bool(false)),
            ("weather_encoded", FeatureValue::Null),
            ("demand", FeatureValue::Bool(true)),
            ("hour", FeatureValue::Bool(false)),
        ]);
        let vector = featurizer.prepare(&features);
        // Booleans are not fitted categories, but they do read as numbers
        assert_eq!(vector[FeatureField::CarTypeEncoded], 1.0);
        assert_eq!(vector[FeatureField::WeatherEncoded], 0.0);
        assert_eq!(vector[FeatureField::Demand], 1.0);
        assert_eq!(vector[FeatureField::Hour], 0.0);
    }

    #[test]
    fn test_numeric_categorical_passes_through() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);
        let features = map(&[
            ("car_type_encoded", FeatureValue::Number(2.0)),
            ("weather_encoded", FeatureValue::Number(4.0)),
            ("hour", FeatureValue::Number(9.0)),
        ]);

        let normalized = featurizer.normalize(&features);
        assert_eq!(normalized, features);
        assert_eq!(featurizer.normalize(&normalized), normalized);
    }

    #[test]
    fn test_normalize_encodes_labels_only() {
        let mut encoders = EncoderSet::new();
        encoders.insert(
            "weather",
            LabelEncoder::new(vec!["Clear".into(), "Fog".into(), "Rainy".into()]).unwrap(),
        );
        let featurizer = Featurizer::new(&encoders);
        let features = map(&[
            ("weather_encoded", "Rainy".into()),
            ("car_type_encoded", "suv".into()),
            ("hour", "7".into()),
        ]);

        let normalized = featurizer.normalize(&features);
        assert_eq!(normalized["weather_encoded"], FeatureValue::Number(2.0));
        assert_eq!(normalized["car_type_encoded"], FeatureValue::Number(2.0));
        assert_eq!(normalized["hour"], FeatureValue::from("7"));
        assert!(!normalized.contains_key("distance_km"));
    }

    #[test]
    fn test_vector_length_is_fixed() {
        let encoders = EncoderSet::new();
        let featurizer = Featurizer::new(&encoders);

        let mut features = map(&[
            ("distance_km", FeatureValue::Number(1.0)),
            ("hour", FeatureValue::Number(2.0)),
            ("day_of_week", FeatureValue::Number(3.0)),
            ("demand", FeatureValue::Number(4.0)),
            ("available_taxis", FeatureValue::Number(5.0)),
            ("weather_encoded", FeatureValue::Number(6.0)),
            ("brand_loyalty_score", FeatureValue::Number(7.0)),
            ("car_type_encoded", FeatureValue::Number(0.0)),
        ]);
        assert_eq!(featurizer.prepare(&features).len(), 8);

        for i in 0..20 {
            features.insert(format!("extra_{}", i), FeatureValue::Number(i as f64));
        }
        let vector = featurizer.prepare(&features);
        assert_eq!(vector.len(), 8);
        assert_eq!(vector.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 0.0]);
    }
}
