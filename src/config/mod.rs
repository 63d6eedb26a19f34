mod settings;

use config::{Config, Environment, File};

use crate::utils::RelayError;
use settings::PartialSettings;

pub use settings::{BrokerSettings, CloudSettings, LogSettings, RelaySettings, Settings};

/// Default location of the optional settings file, without extension.
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Environment variables look like `EDGERELAY_BROKER__HOST`.
pub const ENV_PREFIX: &str = "EDGERELAY";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, RelayError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Loads the configuration from `path` (optional, any format `config` knows)
/// and the environment, then merges it over `Settings::default()`.
///
/// A `.env` file in the working directory is loaded first when present.
pub fn load_config_from(path: &str) -> Result<Settings, RelayError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("relay.topics")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
