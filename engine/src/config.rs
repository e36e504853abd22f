use crate::error::AppError;
use serde::Deserialize;

const ENV_PREFIX: &str = "PREDICT";
const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_MAX_INPUT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// tracing filter directive, used when RUST_LOG is unset
    pub log_filter: String,
    /// upper bound on the stdin payload
    pub max_input_bytes: u64,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self, AppError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .set_default("max_input_bytes", DEFAULT_MAX_INPUT_BYTES)?
            .add_source(source)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}
