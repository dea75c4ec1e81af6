use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rocket::routes;

mod bot;
use bot::ClaBot;

mod config;
use config::ClabotConfig;

mod context;
mod error;
mod github;

mod webhooks;
use webhooks::github_webhook;

#[derive(Parser)]
#[command(version = "0.1")]
struct Opts {
    /// Configuration file for the CLA bot
    #[arg(short, long)]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: ClabotConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;

    let bot = ClaBot::new(&config).context("failed to create CLA bot")?;

    let rocket = rocket::build()
        .mount("/", routes![github_webhook])
        .manage(bot);
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err))
}
