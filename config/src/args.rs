use clap::Args;

/// Overrides applied on top of the defaults, the config file and the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// ARN of the stage whose publish events start a composition.
    #[arg(long, value_name = "ARN", env = "STAGE_ARN", global = true)]
    pub stage_arn: Option<String>,

    /// ARN of the channel the composition is sent to.
    #[arg(long, value_name = "ARN", env = "CHANNEL_ARN", global = true)]
    pub channel_arn: Option<String>,

    /// Base URL of the composition API.
    #[arg(long, value_name = "URL", global = true)]
    pub endpoint: Option<String>,

    /// Region the composition API lives in.
    #[arg(long, value_name = "REGION", global = true)]
    pub region: Option<String>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for ConfigArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(stage_arn) = &self.stage_arn {
                cache.insert("stage_arn".to_string(), stage_arn.clone().into());
            }
            if let Some(channel_arn) = &self.channel_arn {
                cache.insert("channel_arn".to_string(), channel_arn.clone().into());
            }
            if let Some(endpoint) = &self.endpoint {
                cache.insert("provider.endpoint".to_string(), endpoint.clone().into());
            }
            if let Some(region) = &self.region {
                cache.insert("provider.region".to_string(), region.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "\
{version}
Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        version = env!("CARGO_PKG_VERSION"),
    )
}
