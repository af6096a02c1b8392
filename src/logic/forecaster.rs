//! Annual yield forecasting.
//!
//! The model is a flat-growth additive fit: a constant level plus a yearly
//! Fourier seasonality, solved as a MAP estimate with Gaussian priors on
//! every coefficient (ridge regression). Each observation is dated 1 January
//! of its year and the forecast target is 1 January of the following year.

use crate::error::ForecastError;
use crate::models::{
    Accuracy, DegradedReason, ForecastResult, ForecastStatus, YieldPoint, YieldSeries,
};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Positive observations needed before a model is fitted
pub const DEFAULT_MIN_POINTS: usize = 6;

const YEARLY_PERIOD_DAYS: f64 = 365.25;
const FOURIER_ORDER: usize = 10;
const LEVEL_PRIOR_SCALE: f64 = 5.0;
const SEASONALITY_PRIOR_SCALE: f64 = 10.0;
const PIVOT_EPSILON: f64 = 1e-12;

/// Fitted coefficients of the additive model, in scaled units.
#[derive(Debug, Clone)]
pub struct AdditiveYieldModel {
    coefficients: Vec<f64>,
    scale: f64,
}

impl AdditiveYieldModel {
    pub fn fit(points: &[YieldPoint]) -> Result<Self, ForecastError> {
        if points.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        if points.iter().any(|p| !p.value.is_finite()) {
            return Err(ForecastError::NonFinite);
        }

        let max_abs = points.iter().map(|p| p.value.abs()).fold(0.0, f64::max);
        let scale = if max_abs > 0.0 { max_abs } else { 1.0 };

        let width = feature_count();
        let mut normal = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];

        for point in points {
            let x = features(point.year)?;
            let y = point.value / scale;
            for i in 0..width {
                rhs[i] += x[i] * y;
                for j in 0..width {
                    normal[i][j] += x[i] * x[j];
                }
            }
        }

        // Gaussian priors become a diagonal penalty
        normal[0][0] += 1.0 / (LEVEL_PRIOR_SCALE * LEVEL_PRIOR_SCALE);
        for (i, row) in normal.iter_mut().enumerate().skip(1) {
            row[i] += 1.0 / (SEASONALITY_PRIOR_SCALE * SEASONALITY_PRIOR_SCALE);
        }

        let coefficients = solve(normal, rhs)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::NonFinite);
        }

        Ok(Self {
            coefficients,
            scale,
        })
    }

    /// Model value on 1 January of `year`, in kg/ha. Not clamped.
    pub fn predict_year(&self, year: i32) -> Result<f64, ForecastError> {
        let x = features(year)?;
        let scaled: f64 = x
            .iter()
            .zip(&self.coefficients)
            .map(|(xi, ci)| xi * ci)
            .sum();
        Ok(scaled * self.scale)
    }

    /// In-sample MAE and MAPE over the years before the last observation.
    pub fn backtest(&self, points: &[YieldPoint]) -> Option<Accuracy> {
        let last_year = points.iter().map(|p| p.year).max()?;

        let mut abs_errors = Vec::new();
        let mut pct_errors = Vec::new();
        for point in points.iter().filter(|p| p.year < last_year) {
            let fitted = self.predict_year(point.year).ok()?;
            let err = (point.value - fitted).abs();
            abs_errors.push(err);
            pct_errors.push(err / point.value.abs());
        }

        if abs_errors.is_empty() {
            return None;
        }

        let mae = abs_errors.iter().sum::<f64>() / abs_errors.len() as f64;
        let mape = pct_errors.iter().sum::<f64>() / pct_errors.len() as f64 * 100.0;
        (mae.is_finite() && mape.is_finite()).then_some(Accuracy {
            mae,
            mape_percent: mape,
        })
    }
}

fn feature_count() -> usize {
    1 + 2 * FOURIER_ORDER
}

/// `[1, sin(2πt/P), cos(2πt/P), ..., sin(2πNt/P), cos(2πNt/P)]` with t in days
fn features(year: i32) -> Result<Vec<f64>, ForecastError> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ForecastError::YearOutOfRange(year))?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or(ForecastError::YearOutOfRange(1970))?;
    let t = (date.num_days_from_ce() - epoch.num_days_from_ce()) as f64;

    let mut x = Vec::with_capacity(feature_count());
    x.push(1.0);
    for n in 1..=FOURIER_ORDER {
        let angle = 2.0 * PI * n as f64 * t / YEARLY_PERIOD_DAYS;
        x.push(angle.sin());
        x.push(angle.cos());
    }
    Ok(x)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ForecastError> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .ok_or(ForecastError::Singular)?;
        if !a[pivot][col].is_finite() || a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(ForecastError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Fit and forecast the year after the last observation, clamped at zero.
///
/// No filtering or minimum length is applied here; callers decide which
/// observations count.
pub fn predict_next(series: &YieldSeries) -> Result<f64, ForecastError> {
    let last_year = series.last_year().ok_or(ForecastError::EmptySeries)?;
    let model = AdditiveYieldModel::fit(series.points())?;
    Ok(model.predict_year(last_year + 1)?.max(0.0))
}

#[derive(Debug, Clone)]
pub struct YieldForecaster {
    min_points: usize,
}

impl YieldForecaster {
    pub fn new(min_points: usize) -> Self {
        Self { min_points }
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Next-season forecast for one crop. Always produces a value; short or
    /// unfittable histories fall back to the mean of the positive years.
    pub fn forecast(&self, series: &YieldSeries) -> ForecastResult {
        let valid = series.positive();
        let mean = valid.mean().unwrap_or(0.0);

        if valid.len() < self.min_points {
            return ForecastResult {
                predicted_yield: mean,
                accuracy: None,
                status: ForecastStatus::Degraded(DegradedReason::InsufficientHistory {
                    valid_points: valid.len(),
                    required: self.min_points,
                }),
            };
        }

        match self.fit(&valid) {
            Ok((predicted_yield, accuracy)) => ForecastResult {
                predicted_yield,
                accuracy,
                status: ForecastStatus::Fitted,
            },
            Err(e) => {
                tracing::warn!("Yield model fit failed, using historical mean: {}", e);
                ForecastResult {
                    predicted_yield: mean,
                    accuracy: None,
                    status: ForecastStatus::Degraded(DegradedReason::FitFailed {
                        message: e.to_string(),
                    }),
                }
            }
        }
    }

    fn fit(&self, valid: &YieldSeries) -> Result<(f64, Option<Accuracy>), ForecastError> {
        let last_year = valid.last_year().ok_or(ForecastError::EmptySeries)?;
        let model = AdditiveYieldModel::fit(valid.points())?;
        let predicted = model.predict_year(last_year + 1)?.max(0.0);
        Ok((predicted, model.backtest(valid.points())))
    }
}

impl Default for YieldForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(values: &[(i32, f64)]) -> YieldSeries {
        YieldSeries::new(
            values
                .iter()
                .map(|&(year, value)| YieldPoint { year, value }),
        )
    }

    fn yearly(start: i32, values: &[f64]) -> YieldSeries {
        YieldSeries::new(values.iter().enumerate().map(|(i, &value)| YieldPoint {
            year: start + i as i32,
            value,
        }))
    }

    #[test]
    fn constant_history_forecasts_the_constant() {
        let s = yearly(1990, &[1500.0; 12]);
        let result = YieldForecaster::default().forecast(&s);

        assert_eq!(result.status, ForecastStatus::Fitted);
        assert!((result.predicted_yield - 1500.0).abs() < 15.0);
        let accuracy = result.accuracy.unwrap();
        assert!(accuracy.mae < 15.0);
        assert!(accuracy.mape_percent < 1.0);
    }

    #[test]
    fn fitted_forecast_is_non_negative_with_accuracy() {
        let s = yearly(
            1995,
            &[1210.0, 1340.0, 980.0, 1500.0, 1420.0, 1100.0, 1630.0, 1290.0],
        );
        let result = YieldForecaster::default().forecast(&s);

        assert!(!result.is_degraded());
        assert!(result.predicted_yield >= 0.0);
        let accuracy = result.accuracy.unwrap();
        assert!(accuracy.mae >= 0.0);
        assert!(accuracy.mape_percent >= 0.0);
        assert!(result.accuracy_score().is_some());
    }

    #[test]
    fn short_history_uses_exact_mean() {
        let s = series(&[(2001, 100.0), (2002, 0.0), (2003, 200.0), (2004, 600.0)]);
        let result = YieldForecaster::default().forecast(&s);

        assert_eq!(result.predicted_yield, 300.0);
        assert!(result.accuracy.is_none());
        assert_eq!(
            result.status,
            ForecastStatus::Degraded(DegradedReason::InsufficientHistory {
                valid_points: 3,
                required: 6,
            })
        );
    }

    #[test]
    fn zeros_do_not_count_toward_history() {
        // 6 points, but only 5 positive
        let s = yearly(2000, &[0.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0]);
        let result = YieldForecaster::default().forecast(&s);
        assert!(result.is_degraded());
        assert_eq!(result.predicted_yield, 1000.0);
    }

    #[test]
    fn empty_history_predicts_zero() {
        let result = YieldForecaster::default().forecast(&YieldSeries::default());
        assert_eq!(result.predicted_yield, 0.0);
        assert!(result.accuracy.is_none());
        assert!(result.is_degraded());
    }

    #[test]
    fn single_point_has_no_backtest_overlap() {
        let model = AdditiveYieldModel::fit(&[YieldPoint {
            year: 2010,
            value: 700.0,
        }])
        .unwrap();
        assert!(model
            .backtest(&[YieldPoint {
                year: 2010,
                value: 700.0
            }])
            .is_none());
    }

    #[test]
    fn non_finite_values_fail_the_fit() {
        let points = [
            YieldPoint {
                year: 2000,
                value: 10.0,
            },
            YieldPoint {
                year: 2001,
                value: f64::NAN,
            },
        ];
        assert_eq!(
            AdditiveYieldModel::fit(&points).unwrap_err(),
            ForecastError::NonFinite
        );
        assert_eq!(
            AdditiveYieldModel::fit(&[]).unwrap_err(),
            ForecastError::EmptySeries
        );
    }

    #[test]
    fn predict_next_includes_zero_years() {
        let s = yearly(2000, &[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(predict_next(&s).unwrap(), 0.0);
        assert_eq!(
            predict_next(&YieldSeries::default()).unwrap_err(),
            ForecastError::EmptySeries
        );
    }

    #[test]
    fn solver_handles_pivoting() {
        let a = vec![vec![0.0, 2.0], vec![3.0, 1.0]];
        let b = vec![4.0, 5.0];
        let x = solve(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);

        let singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(
            solve(singular, vec![1.0, 2.0]).unwrap_err(),
            ForecastError::Singular
        );
    }

    proptest! {
        #[test]
        fn forecast_is_never_negative(
            start in 1960i32..2010,
            values in prop::collection::vec(0.0f64..10_000.0, 0..30),
        ) {
            let s = yearly(start, &values);
            let result = YieldForecaster::default().forecast(&s);
            prop_assert!(result.predicted_yield >= 0.0);
            prop_assert!(result.predicted_yield.is_finite());
            if let Some(accuracy) = result.accuracy {
                prop_assert!(accuracy.mae >= 0.0);
                prop_assert!(accuracy.mape_percent >= 0.0);
            }
        }

        #[test]
        fn short_histories_report_the_mean(
            values in prop::collection::vec(1.0f64..5_000.0, 0..6),
        ) {
            let s = yearly(2000, &values);
            let result = YieldForecaster::default().forecast(&s);
            prop_assert!(result.accuracy.is_none());
            let expected = s.positive().mean().unwrap_or(0.0);
            prop_assert_eq!(result.predicted_yield, expected);
        }
    }
}
