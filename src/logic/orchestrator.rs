use super::district::{DistrictAliases, DistrictCanonicalizer, DistrictResolver};
use super::forecaster::YieldForecaster;
use super::ranking::{CropPriorityRanker, RankedCrop};
use super::scoring::{categorize_soil, categorize_yield, climate_score};
use crate::config::Config;
use crate::datasources::{HistoricalDataStore, NominatimClient, WeatherApiClient, WeatherProvider};
use crate::error::{AgriSureError, Result};
use crate::models::{
    BestCrop, CropScoreEntry, DistrictRanking, ForecastResult, ForecastStatus, GeoPoint,
    InputCropAnalysis, LocationInfo, Metric, PredictionAccuracy, RecommendationResponse,
    SoilHealth, WeatherReport, YieldAmount,
};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

/// Location-to-recommendation pipeline over shared, read-only tables.
pub struct RecommendationService {
    store: Arc<HistoricalDataStore>,
    resolver: DistrictResolver,
    weather: Option<Arc<dyn WeatherProvider>>,
    weather_timeout: Duration,
    forecaster: YieldForecaster,
    ranker: CropPriorityRanker,
}

impl RecommendationService {
    pub fn new(store: Arc<HistoricalDataStore>, resolver: DistrictResolver) -> Self {
        Self {
            store,
            resolver,
            weather: None,
            weather_timeout: DEFAULT_WEATHER_TIMEOUT,
            forecaster: YieldForecaster::default(),
            ranker: CropPriorityRanker::default(),
        }
    }

    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>, timeout: Duration) -> Self {
        self.weather = Some(provider);
        self.weather_timeout = timeout;
        self
    }

    pub fn with_forecaster(mut self, forecaster: YieldForecaster) -> Self {
        self.forecaster = forecaster;
        self
    }

    pub fn with_ranker(mut self, ranker: CropPriorityRanker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Wire up the service from configuration: load both tables, the alias
    /// table, and the geocoder and weather clients.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = HistoricalDataStore::load(&config.data.yield_csv, &config.data.soil_csv)?;

        let aliases = match &config.data.district_aliases {
            Some(path) => DistrictAliases::from_path(path)?,
            None => DistrictAliases::builtin()?,
        };
        let canonicalizer = DistrictCanonicalizer::new(aliases)?;

        let geocoder = NominatimClient::new(&config.geocoder)?;
        let resolver = DistrictResolver::new(
            Arc::new(geocoder),
            canonicalizer,
            Duration::from_secs(config.geocoder.timeout_secs),
        );

        let mut service = Self::new(Arc::new(store), resolver)
            .with_forecaster(YieldForecaster::new(config.forecast.min_points))
            .with_ranker(CropPriorityRanker::new(
                config.forecast.ranking_min_points,
                config.forecast.max_parallel_fits,
            ));

        if let Some(weather) = config.active_weather() {
            let timeout = Duration::from_secs(weather.timeout_secs);
            let client = WeatherApiClient::new(weather.clone())?;
            service = service.with_weather(Arc::new(client), timeout);
        } else {
            tracing::info!("Weather provider not configured; responses will omit current weather");
        }

        Ok(service)
    }

    pub fn store(&self) -> &HistoricalDataStore {
        &self.store
    }

    pub async fn recommend(&self, crop: &str, point: GeoPoint) -> Result<RecommendationResponse> {
        let crop = crop.trim().to_uppercase();
        let crop_index = self
            .store
            .yields
            .crop_index(&crop)
            .ok_or_else(|| AgriSureError::UnknownCrop(crop.clone()))?;

        let resolved = self.resolver.resolve(point).await?;
        let district = &resolved.canonical;

        let (Some(yields), Some(soil)) = (
            self.store.yields.district(district),
            self.store.soil.get(district),
        ) else {
            return Err(AgriSureError::DistrictDataMissing(district.clone()));
        };

        let series = yields.series(crop_index);
        let forecaster = self.forecaster.clone();
        let requested = async {
            let permit = self.ranker.fit_slot().await?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                forecaster.forecast(&series)
            })
            .await
            .map_err(|e| AgriSureError::Internal(format!("forecast task failed: {}", e)))
        };

        let (forecast, ranked, weather_now) = tokio::join!(
            requested,
            self.ranker.rank(yields),
            self.current_weather(point)
        );
        let forecast = forecast?;
        let ranked = ranked?;

        if let ForecastStatus::Degraded(reason) = &forecast.status {
            tracing::info!("{} forecast for {} degraded: {}", crop, district, reason);
        }

        let soil_score = soil.soil_health_score;
        let crop_priority_list = score_entries(&ranked, soil_score);

        Ok(RecommendationResponse {
            location: LocationInfo {
                input_coordinates: point,
                place_name: resolved.display_name.clone(),
                detected_district: resolved.detected.clone(),
                canonical_district: resolved.canonical.clone(),
            },
            climate_score: climate_score(forecast.predicted_yield, soil_score),
            input_crop_analysis: input_analysis(crop, &forecast),
            soil_health: soil_health(soil_score),
            weather_now,
            best_crop: best_crop(&ranked),
            crop_priority_list,
        })
    }

    /// Priority list for a district by name, without geocoding or weather.
    pub async fn rank_district(&self, name: &str) -> Result<DistrictRanking> {
        let district = self.resolver.canonicalizer().canonicalize(name);

        let (Some(yields), Some(soil)) = (
            self.store.yields.district(&district),
            self.store.soil.get(&district),
        ) else {
            return Err(AgriSureError::DistrictDataMissing(district));
        };

        let ranked = self.ranker.rank(yields).await?;
        Ok(DistrictRanking {
            soil_health: soil_health(soil.soil_health_score),
            best_crop: best_crop(&ranked),
            crop_priority_list: score_entries(&ranked, soil.soil_health_score),
            district,
        })
    }

    async fn current_weather(&self, point: GeoPoint) -> WeatherReport {
        let Some(provider) = &self.weather else {
            return WeatherReport::unavailable("No weather provider configured");
        };

        match tokio::time::timeout(self.weather_timeout, provider.current(point)).await {
            Ok(Ok(current)) => WeatherReport::Available(current),
            Ok(Err(e)) => {
                tracing::warn!("Weather lookup for {} failed: {}", point, e);
                WeatherReport::unavailable(e.to_string())
            }
            Err(_) => {
                tracing::warn!("Weather lookup for {} timed out", point);
                WeatherReport::unavailable(format!("Timed out after {:?}", self.weather_timeout))
            }
        }
    }
}

fn input_analysis(crop: String, forecast: &ForecastResult) -> InputCropAnalysis {
    InputCropAnalysis {
        crop,
        predicted_yield: YieldAmount::from_kg_per_ha(forecast.predicted_yield),
        yield_category: categorize_yield(forecast.predicted_yield).label(),
        prediction_accuracy: PredictionAccuracy {
            mae: Metric::from_option(forecast.mae()),
            mape_percent: Metric::from_option(forecast.mape_percent()),
            accuracy_score: Metric::from_option(forecast.accuracy_score()),
        },
        forecast: forecast.status.clone(),
    }
}

fn soil_health(score: f64) -> SoilHealth {
    SoilHealth {
        score,
        category: categorize_soil(score).label(),
    }
}

fn score_entries(ranked: &[RankedCrop], soil_score: f64) -> Vec<CropScoreEntry> {
    ranked
        .iter()
        .map(|r| CropScoreEntry {
            crop: r.crop.clone(),
            predicted_yield: YieldAmount::from_kg_per_ha(r.predicted_yield),
            yield_category: categorize_yield(r.predicted_yield).label(),
            climate_score: climate_score(r.predicted_yield, soil_score),
        })
        .collect()
}

fn best_crop(ranked: &[RankedCrop]) -> BestCrop {
    match ranked.first() {
        Some(top) => BestCrop {
            name: Some(top.crop.clone()),
            predicted_yield: Some(YieldAmount::from_kg_per_ha(top.predicted_yield)),
        },
        None => BestCrop {
            name: None,
            predicted_yield: None,
        },
    }
}
