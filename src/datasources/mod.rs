pub mod historical;
pub mod nominatim;
pub mod open_meteo;
pub mod weatherapi;

pub use historical::{CropColumn, DistrictYields, HistoricalDataStore, SoilTable, YieldTable};
pub use nominatim::NominatimClient;
pub use open_meteo::OpenMeteoClient;
pub use weatherapi::WeatherApiClient;

use crate::error::Result;
use crate::models::{AddressFields, CurrentWeather, GeoPoint, WeatherForecast};
use async_trait::async_trait;

/// Coordinate to address lookup. `Ok(None)` means the service answered but
/// found nothing at that point.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, point: GeoPoint) -> Result<Option<AddressFields>>;
}

/// Current weather at a point
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, point: GeoPoint) -> Result<CurrentWeather>;
}

/// Multi-day daily forecast at a point
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn daily_forecast(&self, point: GeoPoint) -> Result<WeatherForecast>;
}
