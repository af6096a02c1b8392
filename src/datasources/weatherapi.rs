use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::{AgriSureError, Result};
use crate::models::{CurrentWeather, GeoPoint};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Current conditions from weatherapi.com
pub struct WeatherApiClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

// WeatherAPI response structures
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: WapiCurrent,
}

#[derive(Debug, Deserialize)]
struct WapiCurrent {
    temp_c: f64,
    humidity: f64,
    condition: WapiCondition,
    wind_kph: f64,
}

#[derive(Debug, Deserialize)]
struct WapiCondition {
    text: String,
}

impl WeatherApiClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn current_url(&self, point: GeoPoint) -> String {
        format!(
            "{}/current.json?key={}&q={},{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key,
            point.lat,
            point.lon
        )
    }

    /// Test connection to WeatherAPI
    pub async fn test_connection(&self) -> Result<bool> {
        let probe = GeoPoint { lat: 0.0, lon: 0.0 };
        let response = self
            .client
            .get(self.current_url(probe))
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("WeatherAPI: {}", e)))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current(&self, point: GeoPoint) -> Result<CurrentWeather> {
        let response = self
            .client
            .get(self.current_url(point))
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("WeatherAPI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgriSureError::DataSourceUnavailable(format!(
                "WeatherAPI returned {}: {}",
                status, body
            )));
        }

        let parsed: CurrentResponse = response.json().await.map_err(|e| {
            AgriSureError::DataSourceUnavailable(format!(
                "Failed to parse WeatherAPI response: {}",
                e
            ))
        })?;

        Ok(convert_current(parsed))
    }
}

fn convert_current(response: CurrentResponse) -> CurrentWeather {
    CurrentWeather {
        temp_c: response.current.temp_c,
        humidity: response.current.humidity,
        condition: response.current.condition.text,
        wind_kph: response.current.wind_kph,
    }
}
