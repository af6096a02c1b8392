use crate::config::OpenMeteoConfig;
use crate::error::{AgriSureError, Result};
use crate::models::{DailyForecast, GeoPoint, WeatherForecast};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::ForecastProvider;

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_mean,precipitation_sum,relative_humidity_2m_mean,wind_speed_10m_mean";

/// Daily forecasts from the free Open-Meteo API (no key required)
pub struct OpenMeteoClient {
    client: reqwest::Client,
    config: OpenMeteoConfig,
}

// Open-Meteo returns column arrays, one entry per day
#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_mean: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    relative_humidity_2m_mean: Vec<Option<f64>>,
    wind_speed_10m_mean: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(config: OpenMeteoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn forecast_url(&self, point: GeoPoint) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&daily={}&forecast_days={}&timezone=auto",
            self.config.base_url.trim_end_matches('/'),
            point.lat,
            point.lon,
            DAILY_FIELDS,
            self.config.forecast_days
        )
    }

    /// Test connection to Open-Meteo
    pub async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.forecast_url(GeoPoint { lat: 0.0, lon: 0.0 }))
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("Open-Meteo: {}", e)))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn daily_forecast(&self, point: GeoPoint) -> Result<WeatherForecast> {
        let response = self
            .client
            .get(self.forecast_url(point))
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("Open-Meteo: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgriSureError::DataSourceUnavailable(format!(
                "Open-Meteo returned {}: {}",
                status, body
            )));
        }

        let parsed: OmResponse = response.json().await.map_err(|e| {
            AgriSureError::DataSourceUnavailable(format!(
                "Failed to parse Open-Meteo response: {}",
                e
            ))
        })?;

        Ok(convert_response(parsed))
    }
}

fn convert_response(response: OmResponse) -> WeatherForecast {
    let d = response.daily;
    let mut days = Vec::with_capacity(d.time.len());

    for (i, date) in d.time.iter().enumerate() {
        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };

        // days with gaps are left out of the aggregates
        let (
            Some(temp_max_c),
            Some(temp_mean_c),
            Some(precipitation_mm),
            Some(humidity_percent),
            Some(wind_speed_kmh),
        ) = (
            at(&d.temperature_2m_max, i),
            at(&d.temperature_2m_mean, i),
            at(&d.precipitation_sum, i),
            at(&d.relative_humidity_2m_mean, i),
            at(&d.wind_speed_10m_mean, i),
        )
        else {
            tracing::debug!("Open-Meteo day {} has missing values, skipping", date);
            continue;
        };

        days.push(DailyForecast {
            date,
            temp_max_c,
            temp_mean_c,
            precipitation_mm,
            humidity_percent,
            wind_speed_kmh,
        });
    }

    WeatherForecast {
        fetched_at: Utc::now(),
        source: "open-meteo".to_string(),
        days,
    }
}

fn at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_columns_to_days() {
        let body = serde_json::json!({
            "latitude": 23.25,
            "longitude": 87.875,
            "daily": {
                "time": ["2026-07-01", "2026-07-02", "2026-07-03"],
                "temperature_2m_max": [34.1, 33.0, null],
                "temperature_2m_mean": [29.5, 28.7, 28.0],
                "precipitation_sum": [0.0, 14.2, 3.1],
                "relative_humidity_2m_mean": [78, 85, 90],
                "wind_speed_10m_mean": [9.4, 12.0, 11.1]
            }
        });
        let parsed: OmResponse = serde_json::from_value(body).unwrap();
        let forecast = convert_response(parsed);

        assert_eq!(forecast.days.len(), 2);
        assert_eq!(forecast.days[1].precipitation_mm, 14.2);
        assert_eq!(forecast.days[0].humidity_percent, 78.0);
        assert_eq!(forecast.source, "open-meteo");
    }

    #[test]
    fn builds_forecast_url() {
        let client = OpenMeteoClient::new(OpenMeteoConfig::default()).unwrap();
        let url = client.forecast_url(GeoPoint {
            lat: 22.5,
            lon: 88.25,
        });
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=22.5&longitude=88.25"));
        assert!(url.ends_with("&forecast_days=16&timezone=auto"));
    }
}
