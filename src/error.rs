use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgriSureError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("'{0}' not found in crop list.")]
    UnknownCrop(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Data for district '{0}' not found.")]
    DistrictDataMissing(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures turning a coordinate into a district join key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Reverse geocoding unavailable: {0}")]
    GeocodeUnavailable(String),

    #[error("District not found in address data.")]
    DistrictNotFound,
}

/// Failures inside the yield model fit. Never surfaced to callers directly;
/// the forecaster turns these into a degraded result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("series is empty")]
    EmptySeries,

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("normal equations are singular")]
    Singular,

    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

impl AgriSureError {
    /// Caller mistakes that should be reported back verbatim.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AgriSureError::InvalidInput(_) | AgriSureError::UnknownCrop(_)
        )
    }

    /// Historical tables have no rows for the resolved district.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, AgriSureError::DistrictDataMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, AgriSureError>;
