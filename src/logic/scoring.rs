use crate::models::{round2, SoilCategory, YieldCategory};

/// Yield (kg/ha) treated as the top of the scale
pub const DEFAULT_MAX_YIELD: f64 = 8000.0;
/// Soil health score treated as the top of the scale
pub const DEFAULT_MAX_SOIL: f64 = 5.0;

const YIELD_EXPONENT: f64 = 0.8;
const SOIL_EXPONENT: f64 = 1.2;
const YIELD_WEIGHT: f64 = 0.6;
const SOIL_WEIGHT: f64 = 0.4;

/// Band a soil health score.
///
/// Exactly zero means the district has no soil survey, not a very poor one.
/// Lower edges are inclusive.
pub fn categorize_soil(score: f64) -> SoilCategory {
    if !score.is_finite() || score <= 0.0 {
        SoilCategory::NoData
    } else if score >= 4.5 {
        SoilCategory::VeryExcellent
    } else if score >= 4.0 {
        SoilCategory::Excellent
    } else if score >= 3.0 {
        SoilCategory::Good
    } else if score >= 2.0 {
        SoilCategory::Poor
    } else {
        SoilCategory::VeryPoor
    }
}

/// Band a predicted yield (kg/ha). Upper bands are exclusive on the lower edge.
pub fn categorize_yield(predicted_yield: f64) -> YieldCategory {
    if predicted_yield > 1000.0 {
        YieldCategory::HighlyRecommended
    } else if predicted_yield > 500.0 {
        YieldCategory::Good
    } else if predicted_yield > 200.0 {
        YieldCategory::Poor
    } else {
        YieldCategory::VeryPoor
    }
}

/// Fuse yield and soil health into one score, nominally 0-100.
///
/// Yield is normalized sub-linearly and soil super-linearly before a 60/40
/// blend. Inputs above the maxima push the score past 100; it is not clamped.
pub fn climate_score_with(
    predicted_yield: f64,
    soil_score: f64,
    max_yield: f64,
    max_soil: f64,
) -> f64 {
    let norm_yield = (predicted_yield.max(0.0) / max_yield).powf(YIELD_EXPONENT);
    let norm_soil = (soil_score.max(0.0) / max_soil).powf(SOIL_EXPONENT);
    round2((YIELD_WEIGHT * norm_yield + SOIL_WEIGHT * norm_soil) * 100.0)
}

pub fn climate_score(predicted_yield: f64, soil_score: f64) -> f64 {
    climate_score_with(predicted_yield, soil_score, DEFAULT_MAX_YIELD, DEFAULT_MAX_SOIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn soil_band_boundaries() {
        assert_eq!(categorize_soil(0.0), SoilCategory::NoData);
        assert_eq!(categorize_soil(0.01), SoilCategory::VeryPoor);
        assert_eq!(categorize_soil(1.99), SoilCategory::VeryPoor);
        assert_eq!(categorize_soil(2.0), SoilCategory::Poor);
        assert_eq!(categorize_soil(3.0), SoilCategory::Good);
        assert_eq!(categorize_soil(4.0), SoilCategory::Excellent);
        assert_eq!(categorize_soil(4.49), SoilCategory::Excellent);
        assert_eq!(categorize_soil(4.5), SoilCategory::VeryExcellent);
        assert_eq!(categorize_soil(4.7), SoilCategory::VeryExcellent);
        assert_eq!(categorize_soil(12.0), SoilCategory::VeryExcellent);
    }

    #[test]
    fn soil_category_labels() {
        assert_eq!(categorize_soil(0.0).label(), "No Soil Health Data");
        assert_eq!(categorize_soil(3.2).label(), "Good Soil Health");
    }

    #[test]
    fn yield_band_boundaries() {
        assert_eq!(categorize_yield(1000.01), YieldCategory::HighlyRecommended);
        assert_eq!(categorize_yield(1000.0), YieldCategory::Good);
        assert_eq!(categorize_yield(500.0), YieldCategory::Poor);
        assert_eq!(categorize_yield(200.0), YieldCategory::VeryPoor);
        assert_eq!(categorize_yield(0.0), YieldCategory::VeryPoor);
    }

    #[test]
    fn climate_score_reference_case() {
        let expected = round2(
            0.6 * (1200.0f64 / 8000.0).powf(0.8) * 100.0 + 0.4 * (4.7f64 / 5.0).powf(1.2) * 100.0,
        );
        assert_eq!(climate_score(1200.0, 4.7), expected);
        assert_eq!(categorize_yield(1200.0), YieldCategory::HighlyRecommended);
    }

    #[test]
    fn climate_score_extremes() {
        assert_eq!(climate_score(0.0, 0.0), 0.0);
        assert_eq!(climate_score(8000.0, 5.0), 100.0);
        assert!(climate_score(16000.0, 5.0) > 100.0);
    }

    proptest! {
        #[test]
        fn soil_categorize_is_total(score in -10.0f64..20.0) {
            let category = categorize_soil(score);
            if score <= 0.0 {
                prop_assert_eq!(category, SoilCategory::NoData);
            } else {
                prop_assert_ne!(category, SoilCategory::NoData);
            }
        }

        #[test]
        fn soil_category_is_monotone(a in 0.0f64..10.0, b in 0.0f64..10.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assume!(lo > 0.0);
            prop_assert!(categorize_soil(lo) <= categorize_soil(hi));
        }

        #[test]
        fn climate_score_monotone_in_yield(y in 0.0f64..20000.0, dy in 0.0f64..5000.0, s in 0.0f64..6.0) {
            prop_assert!(climate_score(y, s) <= climate_score(y + dy, s));
        }

        #[test]
        fn climate_score_monotone_in_soil(y in 0.0f64..20000.0, s in 0.0f64..6.0, ds in 0.0f64..3.0) {
            prop_assert!(climate_score(y, s) <= climate_score(y, s + ds));
        }
    }
}
