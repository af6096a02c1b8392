use serde::{Deserialize, Serialize};

/// Hectares per acre, used for kg/ha to kg/acre conversion
pub const HECTARES_PER_ACRE_FACTOR: f64 = 2.47105;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldPoint {
    pub year: i32,
    /// kg per hectare
    pub value: f64,
}

/// Annual yield observations for one (district, crop) pair, ordered by year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldSeries {
    points: Vec<YieldPoint>,
}

impl YieldSeries {
    /// Builds a series from unordered points. Negative or non-finite values are
    /// dropped, and for a repeated year only the first occurrence is kept.
    pub fn new(points: impl IntoIterator<Item = YieldPoint>) -> Self {
        let mut points: Vec<YieldPoint> = points
            .into_iter()
            .filter(|p| p.value.is_finite() && p.value >= 0.0)
            .collect();

        // stable, so the first occurrence of a year stays first
        points.sort_by_key(|p| p.year);
        points.dedup_by_key(|p| p.year);

        Self { points }
    }

    pub fn points(&self) -> &[YieldPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observations with a strictly positive yield. Zero means nothing was
    /// planted or nothing was recorded that year.
    pub fn positive(&self) -> YieldSeries {
        Self {
            points: self
                .points
                .iter()
                .copied()
                .filter(|p| p.value > 0.0)
                .collect(),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points.iter().map(|p| p.value).sum::<f64>() / self.points.len() as f64)
        }
    }

    pub fn last_year(&self) -> Option<i32> {
        self.points.last().map(|p| p.year)
    }
}

/// Yield in both units reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldAmount {
    pub kg_per_ha: f64,
    pub kg_per_acre: f64,
}

impl YieldAmount {
    pub fn from_kg_per_ha(kg_per_ha: f64) -> Self {
        Self {
            kg_per_ha: round2(kg_per_ha),
            kg_per_acre: round2(kg_per_ha / HECTARES_PER_ACRE_FACTOR),
        }
    }
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
