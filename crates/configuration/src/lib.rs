use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    CalendarSettings, DataSettings, LoggingSettings, RankingWeights, RebalanceSettings,
    ScreeningParams, Settings,
};
pub use telemetry::init_tracing;

/// Environment variables with this prefix override file values, using `__` between
/// path segments (e.g. `RESONANCE__REBALANCE__TOP_N=20`).
pub const ENV_PREFIX: &str = "RESONANCE";

/// Loads the application configuration from `config.toml` in the working directory.
///
/// A missing file is not an error: every setting has a default.
pub fn load_config() -> Result<Settings, ConfigError> {
    build(config::File::with_name("config.toml").required(false))
}

/// Loads the application configuration from an explicit file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    build(config::File::from(path).required(true))
}

fn build<S>(file: S) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
