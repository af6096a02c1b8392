pub mod district;
pub mod forecaster;
pub mod orchestrator;
pub mod ranking;
pub mod scoring;
pub mod weather_risk;

pub use district::{DistrictAliases, DistrictCanonicalizer, DistrictResolver};
pub use forecaster::YieldForecaster;
pub use orchestrator::RecommendationService;
pub use ranking::{CropPriorityRanker, RankedCrop};
pub use weather_risk::WeatherRiskAssessor;
