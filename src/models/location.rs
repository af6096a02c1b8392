use crate::error::{AgriSureError, Result};
use serde::{Deserialize, Serialize};

/// A validated WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(AgriSureError::InvalidInput(
                "Invalid latitude or longitude values".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AgriSureError::InvalidInput(
                "Invalid latitude or longitude values".into(),
            ));
        }
        Ok(Self { lat, lon })
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// District-like fields of a reverse-geocoded address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state_district: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

impl AddressFields {
    /// First non-blank field in district, state_district, county order.
    pub fn district_like(&self) -> Option<&str> {
        [&self.district, &self.state_district, &self.county]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .map(str::trim)
            .find(|f| !f.is_empty())
    }
}

/// Output of district resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDistrict {
    /// Field exactly as the geocoder returned it
    pub detected: String,
    /// Normalized name before alias rewriting, for display
    pub display_name: String,
    /// Join key into the historical tables
    pub canonical: String,
}
