//! Nominatim / OpenStreetMap reverse geocoder.
//!
//! The public instance allows at most one request per second and requires an
//! identifying User-Agent. See <https://nominatim.org/release-docs/develop/api/Reverse/>

use super::ReverseGeocoder;
use crate::config::GeocoderConfig;
use crate::error::{AgriSureError, Result};
use crate::models::{AddressFields, GeoPoint};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<AddressFields>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Test connection to the geocoder
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/status", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("Nominatim: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn reverse_url(&self, point: GeoPoint) -> String {
        format!(
            "{}/reverse?lat={}&lon={}&format=jsonv2&accept-language=en&zoom=10&addressdetails=1",
            self.base_url, point.lat, point.lon
        )
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, point: GeoPoint) -> Result<Option<AddressFields>> {
        let url = self.reverse_url(point);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgriSureError::DataSourceUnavailable(format!("Nominatim: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgriSureError::DataSourceUnavailable(format!(
                "Nominatim returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AgriSureError::DataSourceUnavailable(format!(
                "Failed to parse Nominatim response: {}",
                e
            ))
        })?;

        parse_reverse(body)
    }
}

fn parse_reverse(body: serde_json::Value) -> Result<Option<AddressFields>> {
    let parsed: ReverseResponse = serde_json::from_value(body)?;

    if let Some(error) = parsed.error {
        tracing::debug!("Nominatim found nothing: {}", error);
        return Ok(None);
    }

    Ok(parsed.address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_address_fields() {
        let body = serde_json::json!({
            "display_name": "Kalna, Purba Bardhaman, West Bengal, India",
            "address": {
                "town": "Kalna",
                "state_district": "Purba Bardhaman",
                "state": "West Bengal",
                "country": "India"
            }
        });
        let fields = parse_reverse(body).unwrap().unwrap();
        assert_eq!(fields.district, None);
        assert_eq!(fields.state_district.as_deref(), Some("Purba Bardhaman"));
        assert_eq!(fields.district_like(), Some("Purba Bardhaman"));
    }

    #[test]
    fn unable_to_geocode_is_none() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(parse_reverse(body).unwrap().is_none());
    }

    #[test]
    fn client_creation() {
        let client = NominatimClient::new(&GeocoderConfig {
            base_url: "http://localhost:8080/".into(),
            user_agent: "agrisure-test".into(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn reverse_url_carries_coordinates() {
        let client = NominatimClient::new(&GeocoderConfig {
            base_url: "https://nominatim.example.org/".into(),
            user_agent: "agrisure-test".into(),
            timeout_secs: 1,
        })
        .unwrap();
        let point = GeoPoint::new(23.2324, 87.8615).unwrap();

        assert_eq!(
            client.reverse_url(point),
            "https://nominatim.example.org/reverse?lat=23.2324&lon=87.8615\
             &format=jsonv2&accept-language=en&zoom=10&addressdetails=1"
        );
    }
}
