use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temp_c: f64,
    pub humidity: f64,
    pub condition: String,
    pub wind_kph: f64,
}

/// Weather attached to a recommendation. A failed lookup degrades into an
/// error object instead of failing the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherReport {
    Available(CurrentWeather),
    Unavailable { error: String, details: String },
}

impl WeatherReport {
    pub fn unavailable(details: impl Into<String>) -> Self {
        WeatherReport::Unavailable {
            error: "Weather fetch failed".to_string(),
            details: details.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WeatherReport::Available(_))
    }
}

/// Daily forecast values, metric units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_max_c: f64,
    pub temp_mean_c: f64,
    pub precipitation_mm: f64,
    pub humidity_percent: f64,
    pub wind_speed_kmh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    pub days: Vec<DailyForecast>,
}

impl WeatherForecast {
    pub fn total_precipitation_mm(&self) -> f64 {
        self.days.iter().map(|d| d.precipitation_mm).sum()
    }

    pub fn mean_temp_c(&self) -> Option<f64> {
        mean(self.days.iter().map(|d| d.temp_mean_c))
    }

    pub fn max_temp_c(&self) -> Option<f64> {
        self.days
            .iter()
            .map(|d| d.temp_max_c)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn mean_humidity(&self) -> Option<f64> {
        mean(self.days.iter().map(|d| d.humidity_percent))
    }

    pub fn mean_wind_kmh(&self) -> Option<f64> {
        mean(self.days.iter().map(|d| d.wind_speed_kmh))
    }

    /// Days with under 1mm of rain
    pub fn dry_days(&self) -> usize {
        self.days
            .iter()
            .filter(|d| d.precipitation_mm < 1.0)
            .count()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherRiskFlag {
    UnusualRainfall,
    HeatStress,
    HighHumidity,
    HighWind,
}

impl WeatherRiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherRiskFlag::UnusualRainfall => "Unusual rainfall",
            WeatherRiskFlag::HeatStress => "Heat stress",
            WeatherRiskFlag::HighHumidity => "High humidity",
            WeatherRiskFlag::HighWind => "High wind",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeatherRiskFlag::UnusualRainfall => "Rainfall is unusually high or low",
            WeatherRiskFlag::HeatStress => "High temperatures may cause crop stress",
            WeatherRiskFlag::HighHumidity => "High humidity may cause fungal diseases",
            WeatherRiskFlag::HighWind => "Strong winds may damage crops",
        }
    }
}

impl std::fmt::Display for WeatherRiskFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub avg_temp_c: f64,
    pub max_temp_c: f64,
    pub total_rainfall_mm: f64,
    pub dry_days: usize,
    pub avg_humidity_percent: f64,
    pub avg_wind_speed_kmph: f64,
    pub forecast_days_used: usize,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFlagEntry {
    pub flag: WeatherRiskFlag,
    pub label: String,
    pub description: String,
}

impl From<WeatherRiskFlag> for RiskFlagEntry {
    fn from(flag: WeatherRiskFlag) -> Self {
        Self {
            flag,
            label: flag.as_str().to_string(),
            description: flag.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecommendation {
    pub should_claim: bool,
    pub weather_trend_risk_score: f64,
    pub forecast_summary: ForecastSummary,
    pub risk_flags: Vec<RiskFlagEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, rain: f64, temp: f64) -> DailyForecast {
        DailyForecast {
            date: NaiveDate::from_ymd_opt(2026, 7, d).unwrap(),
            temp_max_c: temp + 5.0,
            temp_mean_c: temp,
            precipitation_mm: rain,
            humidity_percent: 70.0,
            wind_speed_kmh: 10.0,
        }
    }

    #[test]
    fn forecast_aggregates() {
        let forecast = WeatherForecast {
            fetched_at: Utc::now(),
            source: "open-meteo".into(),
            days: vec![day(1, 0.5, 30.0), day(2, 12.0, 28.0), day(3, 0.0, 32.0)],
        };
        assert_eq!(forecast.total_precipitation_mm(), 12.5);
        assert_eq!(forecast.dry_days(), 2);
        assert_eq!(forecast.mean_temp_c(), Some(30.0));
        assert_eq!(forecast.max_temp_c(), Some(37.0));
    }

    #[test]
    fn empty_forecast_has_no_means() {
        let forecast = WeatherForecast {
            fetched_at: Utc::now(),
            source: "open-meteo".into(),
            days: vec![],
        };
        assert_eq!(forecast.mean_humidity(), None);
        assert_eq!(forecast.max_temp_c(), None);
    }

    #[test]
    fn unavailable_report_serializes_as_error_object() {
        let json = serde_json::to_value(WeatherReport::unavailable("timed out")).unwrap();
        assert_eq!(json["error"], "Weather fetch failed");
        assert_eq!(json["details"], "timed out");
    }
}
