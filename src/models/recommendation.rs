use super::location::GeoPoint;
use super::soil::SoilHealth;
use super::weather::WeatherReport;
use super::yield_series::YieldAmount;
use super::ForecastStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum YieldCategory {
    VeryPoor,
    Poor,
    Good,
    HighlyRecommended,
}

impl YieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldCategory::VeryPoor => "Very Poor",
            YieldCategory::Poor => "Poor",
            YieldCategory::Good => "Good",
            YieldCategory::HighlyRecommended => "Highly Recommended",
        }
    }

    /// Label used in API responses, e.g. "Good Crop"
    pub fn label(&self) -> String {
        format!("{} Crop", self.as_str())
    }
}

impl std::fmt::Display for YieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One crop from the ranking pass, scored against the district's soil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropScoreEntry {
    pub crop: String,
    pub predicted_yield: YieldAmount,
    pub yield_category: String,
    pub climate_score: f64,
}

/// Accuracy metric, or a marker when the backtest had nothing to compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Value(f64),
    Unavailable(String),
}

impl Metric {
    pub const NOT_ENOUGH_DATA: &'static str = "Not enough data";

    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) => Metric::Value(super::round2(v)),
            None => Metric::Unavailable(Self::NOT_ENOUGH_DATA.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionAccuracy {
    pub mae: Metric,
    pub mape_percent: Metric,
    pub accuracy_score: Metric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputCropAnalysis {
    pub crop: String,
    pub predicted_yield: YieldAmount,
    pub yield_category: String,
    pub prediction_accuracy: PredictionAccuracy,
    pub forecast: ForecastStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    pub input_coordinates: GeoPoint,
    pub place_name: String,
    pub detected_district: String,
    pub canonical_district: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestCrop {
    pub name: Option<String>,
    pub predicted_yield: Option<YieldAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub location: LocationInfo,
    pub input_crop_analysis: InputCropAnalysis,
    pub soil_health: SoilHealth,
    pub climate_score: f64,
    pub weather_now: WeatherReport,
    pub best_crop: BestCrop,
    pub crop_priority_list: Vec<CropScoreEntry>,
}

/// Offline priority list for a named district.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictRanking {
    pub district: String,
    pub soil_health: SoilHealth,
    pub best_crop: BestCrop,
    pub crop_priority_list: Vec<CropScoreEntry>,
}
