use crate::error::{AgriSureError, Result};
use crate::models::{
    round2, ClaimRecommendation, ForecastSummary, RiskFlagEntry, WeatherForecast,
    WeatherRiskFlag,
};

/// Weighted score at or above which an insurance claim is suggested
pub const CLAIM_THRESHOLD: f64 = 0.5;
/// Per-factor risk above which a flag is raised
pub const FLAG_THRESHOLD: f64 = 0.3;

/// Distance outside `[ideal_min, ideal_max]`, relative to the nearest bound
/// and capped at 1. A zero bound has no scale, so any excursion past it is
/// full risk.
pub fn normalized_risk(actual: f64, ideal_min: f64, ideal_max: f64) -> f64 {
    if (ideal_min..=ideal_max).contains(&actual) {
        return 0.0;
    }
    let bound = if actual < ideal_min { ideal_min } else { ideal_max };
    if bound == 0.0 {
        return 1.0;
    }
    ((actual - bound).abs() / bound.abs()).min(1.0)
}

/// One weather dimension contributing to the trend risk score
pub trait RiskFactor: Send + Sync {
    fn flag(&self) -> WeatherRiskFlag;

    fn weight(&self) -> f64;

    /// The forecast statistic compared against the ideal range
    fn observe(&self, summary: &ForecastSummary) -> f64;

    fn ideal_range(&self) -> (f64, f64);

    fn risk(&self, summary: &ForecastSummary) -> f64 {
        let (min, max) = self.ideal_range();
        normalized_risk(self.observe(summary), min, max)
    }
}

/// Total rainfall over the forecast window
pub struct RainfallRisk;

impl RiskFactor for RainfallRisk {
    fn flag(&self) -> WeatherRiskFlag {
        WeatherRiskFlag::UnusualRainfall
    }

    fn weight(&self) -> f64 {
        0.4
    }

    fn observe(&self, summary: &ForecastSummary) -> f64 {
        summary.total_rainfall_mm
    }

    fn ideal_range(&self) -> (f64, f64) {
        (10.0, 100.0)
    }
}

/// Mean daily temperature, not the peak
pub struct HeatRisk;

impl RiskFactor for HeatRisk {
    fn flag(&self) -> WeatherRiskFlag {
        WeatherRiskFlag::HeatStress
    }

    fn weight(&self) -> f64 {
        0.3
    }

    fn observe(&self, summary: &ForecastSummary) -> f64 {
        summary.avg_temp_c
    }

    fn ideal_range(&self) -> (f64, f64) {
        (20.0, 35.0)
    }
}

pub struct HumidityRisk;

impl RiskFactor for HumidityRisk {
    fn flag(&self) -> WeatherRiskFlag {
        WeatherRiskFlag::HighHumidity
    }

    fn weight(&self) -> f64 {
        0.2
    }

    fn observe(&self, summary: &ForecastSummary) -> f64 {
        summary.avg_humidity_percent
    }

    fn ideal_range(&self) -> (f64, f64) {
        (40.0, 80.0)
    }
}

pub struct WindRisk;

impl RiskFactor for WindRisk {
    fn flag(&self) -> WeatherRiskFlag {
        WeatherRiskFlag::HighWind
    }

    fn weight(&self) -> f64 {
        0.1
    }

    fn observe(&self, summary: &ForecastSummary) -> f64 {
        summary.avg_wind_speed_kmph
    }

    fn ideal_range(&self) -> (f64, f64) {
        (0.0, 20.0)
    }
}

pub struct WeatherRiskAssessor {
    factors: Vec<Box<dyn RiskFactor>>,
}

impl WeatherRiskAssessor {
    pub fn new() -> Self {
        let factors: Vec<Box<dyn RiskFactor>> = vec![
            Box::new(RainfallRisk),
            Box::new(HeatRisk),
            Box::new(HumidityRisk),
            Box::new(WindRisk),
        ];

        Self { factors }
    }

    pub fn summarize(forecast: &WeatherForecast) -> Result<ForecastSummary> {
        let (Some(avg_temp), Some(max_temp), Some(avg_humidity), Some(avg_wind)) = (
            forecast.mean_temp_c(),
            forecast.max_temp_c(),
            forecast.mean_humidity(),
            forecast.mean_wind_kmh(),
        ) else {
            return Err(AgriSureError::InvalidData(format!(
                "{} forecast has no complete days",
                forecast.source
            )));
        };

        Ok(ForecastSummary {
            avg_temp_c: round2(avg_temp),
            max_temp_c: round2(max_temp),
            total_rainfall_mm: round2(forecast.total_precipitation_mm()),
            dry_days: forecast.dry_days(),
            avg_humidity_percent: round2(avg_humidity),
            avg_wind_speed_kmph: round2(avg_wind),
            forecast_days_used: forecast.days.len(),
            source: forecast.source.clone(),
        })
    }

    /// Score a forecast window and decide whether a claim is warranted.
    ///
    /// `language` is echoed back for callers that localize the flags.
    pub fn assess(
        &self,
        forecast: &WeatherForecast,
        language: Option<String>,
    ) -> Result<ClaimRecommendation> {
        let summary = Self::summarize(forecast)?;

        let mut score = 0.0;
        let mut risk_flags = Vec::new();
        for factor in &self.factors {
            let risk = factor.risk(&summary);
            score += risk * factor.weight();
            if risk > FLAG_THRESHOLD {
                risk_flags.push(RiskFlagEntry::from(factor.flag()));
            }
        }

        tracing::debug!(
            "Weather trend risk {:.3} over {} days ({} flags)",
            score,
            summary.forecast_days_used,
            risk_flags.len()
        );

        Ok(ClaimRecommendation {
            should_claim: score >= CLAIM_THRESHOLD,
            weather_trend_risk_score: round2(score),
            forecast_summary: summary,
            risk_flags,
            language,
        })
    }
}

impl Default for WeatherRiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyForecast;
    use chrono::{NaiveDate, Utc};

    fn forecast(days: usize, rain: f64, temp: f64, humidity: f64, wind: f64) -> WeatherForecast {
        WeatherForecast {
            fetched_at: Utc::now(),
            source: "open-meteo".to_string(),
            days: (0..days)
                .map(|i| DailyForecast {
                    date: NaiveDate::from_ymd_opt(2026, 7, 1 + i as u32).unwrap(),
                    temp_max_c: temp + 4.0,
                    temp_mean_c: temp,
                    precipitation_mm: rain,
                    humidity_percent: humidity,
                    wind_speed_kmh: wind,
                })
                .collect(),
        }
    }

    #[test]
    fn risk_is_zero_inside_range() {
        assert_eq!(normalized_risk(50.0, 10.0, 100.0), 0.0);
        assert_eq!(normalized_risk(10.0, 10.0, 100.0), 0.0);
        assert_eq!(normalized_risk(100.0, 10.0, 100.0), 0.0);
    }

    #[test]
    fn risk_scales_from_nearest_bound() {
        assert_eq!(normalized_risk(5.0, 10.0, 100.0), 0.5);
        assert_eq!(normalized_risk(150.0, 10.0, 100.0), 0.5);
        assert_eq!(normalized_risk(400.0, 10.0, 100.0), 1.0);
        assert_eq!(normalized_risk(0.0, 10.0, 100.0), 1.0);
        assert_eq!(normalized_risk(-1.0, 0.0, 20.0), 1.0);
    }

    #[test]
    fn mild_window_needs_no_claim() {
        // 16 days, 3 mm/day = 48 mm total
        let result = WeatherRiskAssessor::new()
            .assess(&forecast(16, 3.0, 28.0, 65.0, 10.0), None)
            .unwrap();

        assert!(!result.should_claim);
        assert_eq!(result.weather_trend_risk_score, 0.0);
        assert!(result.risk_flags.is_empty());
        assert_eq!(result.forecast_summary.total_rainfall_mm, 48.0);
        assert_eq!(result.forecast_summary.dry_days, 0);
        assert_eq!(result.forecast_summary.forecast_days_used, 16);
        assert_eq!(result.forecast_summary.max_temp_c, 32.0);
    }

    #[test]
    fn dry_hot_window_is_flagged() {
        // no rain, 45 °C mean, 20 % humidity
        let result = WeatherRiskAssessor::new()
            .assess(&forecast(16, 0.0, 45.0, 20.0, 5.0), Some("Bengali".into()))
            .unwrap();

        // rain 1.0*0.4 + heat (10/35)*0.3 + humidity 0.5*0.2
        let expected = 0.4 + (10.0 / 35.0) * 0.3 + 0.5 * 0.2;
        assert!(result.should_claim);
        assert_eq!(result.weather_trend_risk_score, round2(expected));
        assert_eq!(result.forecast_summary.dry_days, 16);
        assert_eq!(result.language.as_deref(), Some("Bengali"));

        let flags: Vec<WeatherRiskFlag> = result.risk_flags.iter().map(|f| f.flag).collect();
        assert_eq!(
            flags,
            vec![WeatherRiskFlag::UnusualRainfall, WeatherRiskFlag::HighHumidity]
        );
        assert_eq!(result.risk_flags[0].label, "Unusual rainfall");
    }

    #[test]
    fn empty_forecast_is_rejected() {
        let err = WeatherRiskAssessor::new()
            .assess(&forecast(0, 0.0, 0.0, 0.0, 0.0), None)
            .unwrap_err();
        assert!(matches!(err, AgriSureError::InvalidData(_)));
    }
}
