use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilRecord {
    pub district: String,
    pub soil_health_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SoilCategory {
    NoData,
    VeryPoor,
    Poor,
    Good,
    Excellent,
    VeryExcellent,
}

impl SoilCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilCategory::NoData => "No Data",
            SoilCategory::VeryPoor => "Very Poor",
            SoilCategory::Poor => "Poor",
            SoilCategory::Good => "Good",
            SoilCategory::Excellent => "Excellent",
            SoilCategory::VeryExcellent => "Very Excellent",
        }
    }

    /// Label used in API responses, e.g. "Good Soil Health"
    pub fn label(&self) -> String {
        match self {
            SoilCategory::NoData => "No Soil Health Data".to_string(),
            other => format!("{} Soil Health", other.as_str()),
        }
    }
}

impl std::fmt::Display for SoilCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilHealth {
    pub score: f64,
    pub category: String,
}
