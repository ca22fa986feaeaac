mod config;
mod listener;
mod logging;
mod notifier;
mod notify;
mod predict;
mod tracker;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::config::Config;
use crate::listener::Listener;
use crate::notifier::{EngineSettings, NotifierEngine, Runner};
use crate::predict::TawhiriPredictor;

#[derive(Parser)]
#[command(name = "sonde-notifier")]
#[command(about = "Radiosonde range ring notifications for AutoRX stations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Run the notifier
    Run {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config } => run(&config).await,
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Both were checked while loading.
    let (Ok(station), Ok(registry)) = (config.station(), config.range_ring_registry()) else {
        eprintln!("Config error: invalid station or range rings");
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!(
        "Station: {} ({}, {})",
        config.station.name.as_deref().unwrap_or("unnamed"),
        station.latitude_deg,
        station.longitude_deg
    );
    println!("Range rings ({}):", registry.len());
    for ring in registry.rings() {
        println!(
            "  {}: {} <= {:.1}km, <= {:.0}m{}",
            ring.id,
            ring.name,
            ring.range_m / 1000.0,
            ring.max_altitude_m,
            if ring.only_descending {
                ", descending only"
            } else {
                ""
            }
        );
    }
    let sinks = config.enabled_sinks();
    if sinks.is_empty() {
        println!("Notification services: none");
    } else {
        println!("Notification services: {}", sinks.join(", "));
    }
    if config.prediction.enabled {
        println!(
            "Predictions: every {} check(s) via {}",
            config.prediction.cycles, config.prediction.api_url
        );
    }
    ExitCode::SUCCESS
}

async fn run(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);

    let runner = match build_runner(&config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match runner.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Notifier stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_runner(config: &Config) -> Result<Runner, String> {
    let station = config.station().map_err(|e| e.to_string())?;
    let registry = config.range_ring_registry().map_err(|e| e.to_string())?;
    let settings = EngineSettings::from_config(config).map_err(|e| e.to_string())?;
    let predictor = TawhiriPredictor::new(&config.prediction)
        .map_err(|e| format!("Failed to set up prediction client: {}", e))?;
    let sinks = notify::build_sinks(config)
        .map_err(|e| format!("Failed to set up notification services: {}", e))?;

    if sinks.is_empty() {
        log::warn!("No notification service enabled");
    }

    let engine = NotifierEngine::new(station, registry, settings, Box::new(predictor), sinks);

    Ok(Runner {
        engine,
        listener: Listener::new(config.listener.host.clone(), config.listener.port),
        check_interval: config.notifier.check_interval,
    })
}
