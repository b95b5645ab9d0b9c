#[macro_use]
extern crate tracing;

use clap::{
    Parser,
    Subcommand,
};
use color_eyre::Result;
use eyre::WrapErr as _;
use stage_composer_config::{
    version,
    Config,
    ConfigArgs,
};
use stage_composition::{
    CompositionTrigger,
    HttpCompositionProvider,
    StageNotification,
    TriggerOutcome,
    TriggerSettings,
};
use std::{
    io::Read as _,
    path::{
        Path,
        PathBuf,
    },
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Starts a server-side composition of a stage when a participant publishes.
#[derive(Parser, Debug)]
#[command(author, version = version(), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Handle one stage event document.
    Trigger {
        /// Path to the event JSON, or `-` to read it from stdin.
        #[arg(long, value_name = "PATH")]
        event: PathBuf,
    },
    /// Print the effective configuration.
    Config,
}

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::new(cli.config).wrap_err("failed to load configuration")?;

    match cli.command {
        Command::Config => {
            print!("{}", serde_yml::to_string(&config)?);
            Ok(())
        }
        Command::Trigger { event } => {
            config.validate()?;
            let event = read_event(&event)?;
            trigger(&config, &event).await
        }
    }
}

#[instrument(level = "debug", skip_all)]
async fn trigger(config: &Config, event: &StageNotification) -> Result<()> {
    let provider = HttpCompositionProvider::new(&config.provider).wrap_err("failed to create composition client")?;
    let trigger = CompositionTrigger::new(TriggerSettings::from(config), provider);

    match trigger.handle(event).await.wrap_err("failed to start composition")? {
        TriggerOutcome::Skipped(reason) => info!(%reason, "Nothing to do"),
        TriggerOutcome::Started(started) => {
            let composition = started.response.composition.as_ref().map(|c| c.arn.as_str());
            info!(
                composition,
                encoder_configuration = %started.encoder_configuration_arn,
                "Composition started"
            );
        }
    }
    Ok(())
}

/// Reads an event document from `path`, where `-` means stdin.
pub fn read_event(path: &Path) -> Result<StageNotification> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .wrap_err("failed to read event from stdin")?;
        raw
    } else {
        std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read event from {}", path.display()))?
    };
    parse_event(&raw)
}

pub fn parse_event(raw: &str) -> Result<StageNotification> {
    serde_json::from_str(raw).wrap_err("event is not a stage notification")
}
