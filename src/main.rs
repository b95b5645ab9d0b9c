use clap::Parser;
use color_eyre::Result;
use stage_composer::{
    init_errors,
    init_logging,
    run,
    Cli,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    init_logging()?;
    run(Cli::parse()).await
}
