use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agrisure",
    version,
    about = "Crop recommendations from district yield history, soil health and weather"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend crops for a coordinate, printing the full JSON report
    Recommend {
        /// Crop to analyse, e.g. RICE
        #[arg(long)]
        crop: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Rank every crop for a district by name (no geocoding)
    Rank {
        #[arg(long)]
        district: String,
    },
    /// Assess the 16-day weather trend for an insurance claim
    WeatherRisk {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Language tag echoed back with the assessment
        #[arg(long)]
        language: Option<String>,
    },
    /// Validate config, load tables and test connections
    Check,
    /// Re-run interactive setup
    Init,
}
