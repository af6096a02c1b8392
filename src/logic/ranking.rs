use super::forecaster::predict_next;
use crate::datasources::DistrictYields;
use crate::error::{AgriSureError, Result};
use crate::models::YieldSeries;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// Observations (zeros included) a crop needs before it is ranked
pub const DEFAULT_RANKING_MIN_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCrop {
    pub crop: String,
    /// kg per hectare
    pub predicted_yield: f64,
}

/// Forecasts every crop in a district and orders them by predicted yield.
///
/// Unlike the single-crop forecaster there is no mean fallback here: crops
/// with too little history or a failed fit are left out of the ranking.
#[derive(Debug, Clone)]
pub struct CropPriorityRanker {
    min_points: usize,
    fit_slots: Arc<Semaphore>,
}

impl CropPriorityRanker {
    pub fn new(min_points: usize, max_parallel_fits: usize) -> Self {
        Self {
            min_points,
            fit_slots: Arc::new(Semaphore::new(max_parallel_fits.max(1))),
        }
    }

    /// Wait for a free model-fit slot. Held for the duration of one fit.
    pub async fn fit_slot(&self) -> Result<OwnedSemaphorePermit> {
        self.fit_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AgriSureError::Internal(format!("fit pool closed: {}", e)))
    }

    pub async fn rank(&self, district: DistrictYields<'_>) -> Result<Vec<RankedCrop>> {
        let histories = district
            .crops()
            .iter()
            .enumerate()
            .map(|(index, crop)| (crop.name.clone(), district.series(index)))
            .collect();

        self.rank_histories(histories).await
    }

    /// Rank `(crop, series)` pairs. Ties keep input order.
    pub async fn rank_histories(
        &self,
        histories: Vec<(String, YieldSeries)>,
    ) -> Result<Vec<RankedCrop>> {
        let mut tasks = JoinSet::new();

        for (index, (crop, series)) in histories.into_iter().enumerate() {
            if series.len() < self.min_points {
                tracing::debug!(
                    "Skipping {} in ranking: {} points, {} required",
                    crop,
                    series.len(),
                    self.min_points
                );
                continue;
            }

            let permit = self.fit_slot().await?;

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let outcome = predict_next(&series);
                (index, crop, outcome)
            });
        }

        let mut fitted = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, crop, outcome) = joined
                .map_err(|e| AgriSureError::Internal(format!("crop fit task failed: {}", e)))?;
            match outcome {
                Ok(predicted_yield) => fitted.push((
                    index,
                    RankedCrop {
                        crop,
                        predicted_yield,
                    },
                )),
                Err(e) => tracing::warn!("Leaving {} out of ranking: {}", crop, e),
            }
        }

        // completion order is arbitrary; restore column order before the stable sort
        fitted.sort_by_key(|(index, _)| *index);
        let mut ranked: Vec<RankedCrop> = fitted.into_iter().map(|(_, crop)| crop).collect();
        ranked.sort_by(|a, b| b.predicted_yield.total_cmp(&a.predicted_yield));

        Ok(ranked)
    }
}

impl Default for CropPriorityRanker {
    fn default() -> Self {
        Self::new(DEFAULT_RANKING_MIN_POINTS, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YieldPoint;

    fn flat(value: f64, years: usize) -> YieldSeries {
        YieldSeries::new((0..years).map(|i| YieldPoint {
            year: 2000 + i as i32,
            value,
        }))
    }

    #[tokio::test]
    async fn orders_by_predicted_yield_descending() {
        let ranker = CropPriorityRanker::default();
        let ranked = ranker
            .rank_histories(vec![
                ("WHEAT".to_string(), flat(900.0, 10)),
                ("RICE".to_string(), flat(2400.0, 10)),
                ("MAIZE".to_string(), flat(1600.0, 10)),
            ])
            .await
            .unwrap();

        let names: Vec<&str> = ranked.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(names, vec!["RICE", "MAIZE", "WHEAT"]);
        assert!(ranked.iter().all(|r| r.predicted_yield >= 0.0));
    }

    #[tokio::test]
    async fn skips_crops_with_short_history() {
        let ranker = CropPriorityRanker::new(5, 2);
        let ranked = ranker
            .rank_histories(vec![
                ("RICE".to_string(), flat(2400.0, 4)),
                ("JUTE".to_string(), flat(1800.0, 5)),
                ("SESAMUM".to_string(), YieldSeries::default()),
            ])
            .await
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].crop, "JUTE");
    }

    #[tokio::test]
    async fn zero_years_count_toward_ranking_history() {
        let ranker = CropPriorityRanker::default();
        let ranked = ranker
            .rank_histories(vec![("GRAM".to_string(), flat(0.0, 6))])
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].predicted_yield, 0.0);
    }

    #[tokio::test]
    async fn ties_keep_column_order_and_repeat() {
        let ranker = CropPriorityRanker::new(5, 3);
        let histories: Vec<(String, YieldSeries)> = ["BARLEY", "GRAM", "LINSEED", "MUSTARD"]
            .iter()
            .map(|name| (name.to_string(), flat(750.0, 8)))
            .collect();

        let first = ranker.rank_histories(histories.clone()).await.unwrap();
        let second = ranker.rank_histories(histories).await.unwrap();

        let names: Vec<&str> = first.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(names, vec!["BARLEY", "GRAM", "LINSEED", "MUSTARD"]);
        assert_eq!(first, second);
    }
}
