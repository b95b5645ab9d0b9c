#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod composition_config;

use app_config::AppConfig;
pub use app_config::{
    get_config_dir,
    get_data_dir,
};
pub use args::{
    version,
    ConfigArgs,
};
use color_eyre::Result;
pub use composition_config::{
    EncoderPreset,
    ProviderConfig,
};
use eyre::bail;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::Path;

/// Settings for reacting to stage publish events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    /// The one stage whose events are acted on.
    #[serde(default)]
    pub stage_arn: String,
    /// The channel the composition is streamed to.
    #[serde(default)]
    pub channel_arn: String,
    pub destination_name: String,
    pub featured_participant_attribute: String,
    pub max_encoder_configurations: u32,
    pub encoder: EncoderPreset,
    pub provider: ProviderConfig,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

const ENV_PREFIX: &str = "STAGE_COMPOSER";

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: ConfigArgs) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(stage_arn = %cfg.stage_arn, endpoint = %cfg.provider.endpoint, "loaded configuration");

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &Path {
        &self.app_config.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    /// Checks the settings that have no usable default.
    ///
    /// # Errors
    /// Returns an error if the stage or channel ARN is missing or malformed, or
    /// if the encoder preset cannot be sent to the provider.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("stage_arn", &self.stage_arn), ("channel_arn", &self.channel_arn)] {
            if value.trim().is_empty() {
                bail!("{name} must be set (config file, STAGE_COMPOSER_{} or --{})", name.to_uppercase(), name.replace('_', "-"));
            }
            if !value.starts_with("arn:") {
                bail!("{name} is not an ARN: {value}");
            }
        }
        if self.max_encoder_configurations == 0 {
            bail!("max_encoder_configurations must be at least 1");
        }
        self.encoder.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configured() -> Config {
        Config {
            stage_arn: "arn:aws:ivs:us-west-2:123:stage/abc".to_string(),
            channel_arn: "arn:aws:ivs:us-west-2:123:channel/def".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn default_config_parses() {
        let config = Config::default();
        assert_eq!(config.encoder, EncoderPreset::default());
        assert_eq!(config.max_encoder_configurations, 100);
        assert_eq!(config.featured_participant_attribute, "isFeature");
        assert_eq!(config.provider.region, "us-west-2");
        assert!(config.stage_arn.is_empty());
    }

    #[test]
    fn defaults_need_arns() {
        assert!(Config::default().validate().is_err());
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn rejects_non_arn_stage() {
        let config = Config {
            stage_arn: "stage/abc".to_string(),
            ..configured()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not an ARN"), "{err}");
    }

    #[test]
    fn environment_overrides_use_single_underscore_prefix() {
        // Point the config dir somewhere empty so a local config.yaml cannot interfere.
        std::env::set_var(
            "STAGE_COMPOSER_CONFIG",
            std::env::temp_dir().join("stage-composer-env-override-test"),
        );
        std::env::set_var("STAGE_COMPOSER_STAGE_ARN", "arn:aws:ivs:us-west-2:123:stage/env");
        std::env::set_var("STAGE_COMPOSER_PROVIDER__REGION", "eu-central-1");

        let config = Config::new(ConfigArgs::default()).unwrap();
        assert_eq!(config.stage_arn, "arn:aws:ivs:us-west-2:123:stage/env");
        assert_eq!(config.provider.region, "eu-central-1");

        let config = Config::new(ConfigArgs {
            stage_arn: Some("arn:aws:ivs:us-west-2:123:stage/arg".to_string()),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.stage_arn, "arn:aws:ivs:us-west-2:123:stage/arg");
    }

    #[test]
    fn rejects_zero_page_size() {
        let config = Config {
            max_encoder_configurations: 0,
            ..configured()
        };
        assert!(config.validate().is_err());
    }
}
