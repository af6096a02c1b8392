use serde::{Deserialize, Serialize};

/// Backtest accuracy of a fitted yield model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub mae: f64,
    pub mape_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DegradedReason {
    /// Not enough positive observations to fit a model
    InsufficientHistory { valid_points: usize, required: usize },
    /// The model fit itself failed
    FitFailed { message: String },
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradedReason::InsufficientHistory {
                valid_points,
                required,
            } => write!(
                f,
                "only {} valid years of history, {} required",
                valid_points, required
            ),
            DegradedReason::FitFailed { message } => write!(f, "model fit failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastStatus {
    Fitted,
    Degraded(DegradedReason),
}

/// Next-season yield estimate for one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// kg per hectare, never negative
    pub predicted_yield: f64,
    pub accuracy: Option<Accuracy>,
    pub status: ForecastStatus,
}

impl ForecastResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, ForecastStatus::Degraded(_))
    }

    pub fn mae(&self) -> Option<f64> {
        self.accuracy.map(|a| a.mae)
    }

    pub fn mape_percent(&self) -> Option<f64> {
        self.accuracy.map(|a| a.mape_percent)
    }

    /// `100 - MAPE`, only when MAPE is known
    pub fn accuracy_score(&self) -> Option<f64> {
        self.mape_percent().map(|mape| 100.0 - mape)
    }
}
