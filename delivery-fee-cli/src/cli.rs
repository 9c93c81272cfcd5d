use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use delivery_fee_core::{
    Config, FeeResponse, FeeService, IlmateenistusFeed, ImportTask, Importer, InMemoryStore,
    api::{self, FeeRequest},
};
use inquire::{Confirm, CustomType, Text};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::logging;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "delivery-fee", version, about = "Weather-aware courier delivery fee calculator")]
pub struct Cli {
    /// Config file to use instead of the one in the platform config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import current weather once and print the delivery fee as JSON.
    Fee {
        /// City: Tallinn, Tartu or Pärnu.
        #[arg(long)]
        city: String,

        /// Vehicle: Car, Scooter or Bike.
        #[arg(long)]
        vehicle: String,

        /// Feed timestamp to price against, as epoch seconds or RFC 3339.
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Option<i64>,
    },

    /// Run a single weather import and print the stored observations.
    Import,

    /// Import weather periodically and answer JSON fee requests read line by line from stdin.
    Serve,

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file location.
    Path,
    /// Interactively write a configuration file.
    Init,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;
        logging::init(&self.log_level(&config));

        match &self.command {
            Command::Fee { city, vehicle, timestamp } => {
                let (importer, service) = wire(&config)?;
                if let Err(err) = importer.run_import_cycle().await {
                    warn!(error = %err, "Pricing against an empty store");
                }
                let request =
                    FeeRequest { city: city.clone(), vehicle: vehicle.clone(), timestamp: *timestamp };
                let response = api::handle(&service, request);
                println!("{}", serde_json::to_string(&response)?);
            }
            Command::Import => {
                let (importer, _service) = wire(&config)?;
                let report = importer.run_import_cycle().await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Command::Serve => serve(&config).await?,
            Command::Config { action } => match action {
                ConfigAction::Show => {
                    print!("{}", config.to_toml()?);
                }
                ConfigAction::Path => {
                    println!("{}", self.config_path()?.display());
                }
                ConfigAction::Init => {
                    let path = self.config_path()?;
                    let updated = prompt_config(config)?;
                    updated.validate()?;
                    updated.save_to(&path)?;
                    println!("Configuration saved to {}", path.display());
                }
            },
        }

        Ok(())
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::config_file_path(),
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    fn log_level(&self, config: &Config) -> String {
        if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "warn".to_string()
        } else {
            config.log_level.clone()
        }
    }
}

/// Build the store, importer and fee service from configuration.
fn wire(config: &Config) -> Result<(Arc<Importer>, FeeService)> {
    let store = Arc::new(InMemoryStore::new());
    let feed = IlmateenistusFeed::new(config.feed_url.clone(), config.http_timeout())
        .context("Failed to build HTTP client for the weather feed")?;
    debug!(url = feed.url(), "Weather feed configured");
    let importer = Arc::new(Importer::new(Box::new(feed), store.clone()));
    Ok((importer, FeeService::new(store)))
}

async fn serve(config: &Config) -> Result<()> {
    let (importer, service) = wire(config)?;
    let task = ImportTask::spawn(importer, config.schedule());

    info!("Reading fee requests from stdin, one JSON object per line");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    let response: FeeResponse = api::handle_json(&service, &line);
                    match serde_json::to_string(&response) {
                        Ok(json) => println!("{json}"),
                        Err(err) => break Err(err.into()),
                    }
                }
                Ok(None) => break Ok(()),
                Err(err) => break Err(anyhow::Error::new(err).context("Failed to read stdin")),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break Ok(());
            }
        }
    };

    task.stop().await;
    result
}

fn prompt_config(current: Config) -> Result<Config> {
    let feed_url = Text::new("Weather feed URL:").with_default(&current.feed_url).prompt()?;
    let interval_secs = CustomType::<u64>::new("Import interval in seconds:")
        .with_default(current.import.interval_secs)
        .prompt()?;
    let run_on_start = Confirm::new("Import immediately on start?")
        .with_default(current.import.run_on_start)
        .prompt()?;

    let mut config = current;
    config.feed_url = feed_url;
    config.import.interval_secs = interval_secs;
    config.import.run_on_start = run_on_start;
    Ok(config)
}

/// Accept either epoch seconds or an RFC 3339 date-time.
fn parse_timestamp(value: &str) -> Result<i64, String> {
    if let Ok(secs) = value.trim().parse::<i64>() {
        return Ok(secs);
    }
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.timestamp())
        .map_err(|err| format!("expected epoch seconds or RFC 3339 date-time: {err}"))
}
