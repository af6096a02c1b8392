//! AgriSure: location-based crop recommendations from district yield
//! history, soil health and weather.

pub mod config;
pub mod datasources;
pub mod error;
pub mod logic;
pub mod models;

pub use config::Config;
pub use error::{AgriSureError, Result};
