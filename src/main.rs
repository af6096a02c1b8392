mod cli;

use agrisure::config::Config;
use agrisure::datasources::{
    ForecastProvider, NominatimClient, OpenMeteoClient, WeatherApiClient,
};
use agrisure::logic::{DistrictAliases, RecommendationService, WeatherRiskAssessor};
use agrisure::models::GeoPoint;
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init => init(cli.config.as_ref()),
        Commands::Check => check(cli.config).await,
        Commands::Recommend { crop, lat, lon } => {
            let config = load_config(cli.config)?;
            let point = GeoPoint::new(lat, lon)?;
            let service = RecommendationService::from_config(&config)?;
            let response = service.recommend(&crop, point).await?;
            print_json(&response)
        }
        Commands::Rank { district } => {
            let config = load_config(cli.config)?;
            let service = RecommendationService::from_config(&config)?;
            let ranking = service.rank_district(&district).await?;
            print_json(&ranking)
        }
        Commands::WeatherRisk {
            lat,
            lon,
            language,
        } => {
            let config = load_config(cli.config)?;
            let point = GeoPoint::new(lat, lon)?;
            let client = OpenMeteoClient::new(config.open_meteo.clone())?;
            let forecast = client.daily_forecast(point).await?;
            let assessment = WeatherRiskAssessor::new().assess(&forecast, language)?;
            print_json(&assessment)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "agrisure=debug,info",
        _ => "agrisure=trace,debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load(path).context("Please copy config/config.yaml.example to config/config.yaml")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init(config_override: Option<&PathBuf>) -> anyhow::Result<()> {
    if Config::exists(config_override) {
        let overwrite = dialoguer::Confirm::new()
            .with_prompt("A config file already exists. Overwrite it?")
            .default(false)
            .interact()?;
        if !overwrite {
            return Ok(());
        }
    }

    let (_, path) = Config::setup_interactive()?;
    println!("Run `agrisure check` to verify {}", path.display());
    Ok(())
}

async fn check(config_override: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_override)?;
    println!("Config: OK");

    let service = RecommendationService::from_config(&config)?;
    let store = service.store();
    println!(
        "Yield table: {} crops across {} districts",
        store.yields.crops().len(),
        store.yields.district_count()
    );
    println!("Soil table: {} districts", store.soil.district_count());

    let aliases = match &config.data.district_aliases {
        Some(path) => DistrictAliases::from_path(path)?,
        None => DistrictAliases::builtin()?,
    };
    println!(
        "District aliases: {} entries (version {})",
        aliases.len(),
        aliases.version()
    );

    let nominatim = NominatimClient::new(&config.geocoder)?;
    report("Nominatim", nominatim.test_connection().await);

    match config.active_weather() {
        Some(weather) => {
            let client = WeatherApiClient::new(weather.clone())?;
            report("WeatherAPI", client.test_connection().await);
        }
        None => println!("WeatherAPI: not configured"),
    }

    let open_meteo = OpenMeteoClient::new(config.open_meteo.clone())?;
    report("Open-Meteo", open_meteo.test_connection().await);

    Ok(())
}

fn report(name: &str, result: agrisure::Result<bool>) {
    match result {
        Ok(true) => println!("{}: OK", name),
        Ok(false) => println!("{}: OFFLINE", name),
        Err(e) => println!("{}: OFFLINE ({})", name, e),
    }
}
