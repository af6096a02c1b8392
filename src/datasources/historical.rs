//! Read-only historical tables: district yields by year and crop, and district
//! soil health scores. Loaded once and shared between requests.

use crate::error::{AgriSureError, Result};
use crate::models::{SoilRecord, YieldPoint, YieldSeries};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const DISTRICT_COLUMN: &str = "Dist Name";
const YEAR_COLUMN: &str = "Year";
const YIELD_SUFFIX: &str = " YIELD (Kg per ha)";
const SOIL_SCORE_COLUMN: &str = "SoilHealthScore";

/// A crop and the yield column it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropColumn {
    pub name: String,
    pub column: String,
}

#[derive(Debug, Clone)]
struct YieldRow {
    year: i32,
    values: Vec<Option<f64>>,
}

/// Yield rows for one district, in file order.
#[derive(Debug, Clone, Copy)]
pub struct DistrictYields<'a> {
    crops: &'a [CropColumn],
    rows: &'a [YieldRow],
}

impl<'a> DistrictYields<'a> {
    pub fn crops(&self) -> &'a [CropColumn] {
        self.crops
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Series for the crop at `index` in column order. Missing cells are skipped.
    pub fn series(&self, index: usize) -> YieldSeries {
        YieldSeries::new(self.rows.iter().filter_map(|row| {
            row.values
                .get(index)
                .copied()
                .flatten()
                .map(|value| YieldPoint {
                    year: row.year,
                    value,
                })
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct YieldTable {
    crops: Vec<CropColumn>,
    by_district: HashMap<String, Vec<YieldRow>>,
}

impl YieldTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AgriSureError::DataSourceUnavailable(format!(
                "Failed to read yield table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let district_idx = column_index(&headers, DISTRICT_COLUMN)?;
        let year_idx = column_index(&headers, YEAR_COLUMN)?;

        let mut crops = Vec::new();
        let mut crop_indices = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(name) = header.strip_suffix(YIELD_SUFFIX) {
                crops.push(CropColumn {
                    name: name.trim().to_uppercase(),
                    column: header.to_string(),
                });
                crop_indices.push(idx);
            }
        }

        if crops.is_empty() {
            return Err(AgriSureError::InvalidData(format!(
                "yield table has no '*{}' columns",
                YIELD_SUFFIX
            )));
        }

        let mut by_district: HashMap<String, Vec<YieldRow>> = HashMap::new();
        let mut skipped = 0usize;

        for record in rdr.records() {
            let record = record?;
            let district = record.get(district_idx).unwrap_or_default();
            let year = record
                .get(year_idx)
                .and_then(|y| y.parse::<f64>().ok())
                .filter(|y| y.is_finite() && y.fract() == 0.0);

            let (district, year) = match (district_key(district), year) {
                (Some(d), Some(y)) => (d, y as i32),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            let values = crop_indices
                .iter()
                .map(|&idx| record.get(idx).and_then(parse_yield))
                .collect();

            by_district
                .entry(district)
                .or_default()
                .push(YieldRow { year, values });
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} yield rows without district or year", skipped);
        }

        tracing::info!(
            "Loaded yield table: {} crops across {} districts",
            crops.len(),
            by_district.len()
        );

        Ok(Self { crops, by_district })
    }

    pub fn crops(&self) -> &[CropColumn] {
        &self.crops
    }

    /// Column position of a crop, matched case-insensitively.
    pub fn crop_index(&self, crop: &str) -> Option<usize> {
        let crop = crop.trim().to_uppercase();
        self.crops.iter().position(|c| c.name == crop)
    }

    pub fn district(&self, district: &str) -> Option<DistrictYields<'_>> {
        let key = district_key(district)?;
        self.by_district
            .get(&key)
            .filter(|rows| !rows.is_empty())
            .map(|rows| DistrictYields {
                crops: &self.crops,
                rows,
            })
    }

    pub fn district_count(&self) -> usize {
        self.by_district.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SoilTable {
    by_district: HashMap<String, SoilRecord>,
}

impl SoilTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AgriSureError::DataSourceUnavailable(format!(
                "Failed to read soil table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let district_idx = column_index(&headers, DISTRICT_COLUMN)?;
        let score_idx = column_index(&headers, SOIL_SCORE_COLUMN)?;

        let mut by_district = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let name = record.get(district_idx).unwrap_or_default();
            let Some(key) = district_key(name) else {
                continue;
            };
            let score = record
                .get(score_idx)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|s| s.is_finite() && *s >= 0.0)
                .unwrap_or(0.0);

            // first row wins for a repeated district
            by_district.entry(key).or_insert_with(|| SoilRecord {
                district: name.to_string(),
                soil_health_score: score,
            });
        }

        tracing::info!("Loaded soil table: {} districts", by_district.len());

        Ok(Self { by_district })
    }

    pub fn get(&self, district: &str) -> Option<&SoilRecord> {
        self.by_district.get(&district_key(district)?)
    }

    pub fn district_count(&self) -> usize {
        self.by_district.len()
    }
}

/// Both historical tables behind one read-only handle.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataStore {
    pub yields: YieldTable,
    pub soil: SoilTable,
}

impl HistoricalDataStore {
    pub fn new(yields: YieldTable, soil: SoilTable) -> Self {
        Self { yields, soil }
    }

    pub fn load(yield_csv: impl AsRef<Path>, soil_csv: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            yields: YieldTable::from_path(yield_csv)?,
            soil: SoilTable::from_path(soil_csv)?,
        })
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| AgriSureError::InvalidData(format!("missing '{}' column", name)))
}

fn district_key(name: &str) -> Option<String> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Empty, non-numeric and negative cells are missing values.
fn parse_yield(cell: &str) -> Option<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YIELDS: &str = "\
Dist Code,Year,State Name,Dist Name,RICE AREA (1000 ha),RICE YIELD (Kg per ha),WHEAT YIELD (Kg per ha)
1,1990,West Bengal,Burdwan,400,2100.5,1800
1,1991,West Bengal,Burdwan,410,,-1
1,1992,West Bengal,BURDWAN,420,2300,0
2,1990,West Bengal,Nadia,100,1500,2500
";

    const SOIL: &str = "\
Dist Name,SoilHealthScore
Burdwan,4.7
burdwan,1.0
Nadia,
";

    #[test]
    fn discovers_crop_columns_in_order() {
        let table = YieldTable::from_reader(YIELDS.as_bytes()).unwrap();
        let names: Vec<&str> = table.crops().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["RICE", "WHEAT"]);
        assert_eq!(table.crop_index("wheat"), Some(1));
        assert_eq!(table.crop_index("MAIZE"), None);
    }

    #[test]
    fn district_lookup_is_case_insensitive() {
        let table = YieldTable::from_reader(YIELDS.as_bytes()).unwrap();
        let burdwan = table.district("  burdwan ").unwrap();
        assert_eq!(burdwan.row_count(), 3);
        assert!(table.district("Hooghly").is_none());
        assert_eq!(table.district_count(), 2);
    }

    #[test]
    fn series_skips_missing_cells() {
        let table = YieldTable::from_reader(YIELDS.as_bytes()).unwrap();
        let burdwan = table.district("Burdwan").unwrap();

        let rice = burdwan.series(0);
        let years: Vec<i32> = rice.points().iter().map(|p| p.year).collect();
        assert_eq!(years, vec![1990, 1992]);

        // -1 is a missing marker, 0 is kept as an observation
        let wheat = burdwan.series(1);
        assert_eq!(wheat.len(), 2);
        assert_eq!(wheat.positive().len(), 1);
    }

    #[test]
    fn rejects_table_without_yield_columns() {
        let csv = "Dist Name,Year,RICE AREA (1000 ha)\nBurdwan,1990,10\n";
        assert!(matches!(
            YieldTable::from_reader(csv.as_bytes()),
            Err(AgriSureError::InvalidData(_))
        ));
    }

    #[test]
    fn soil_first_row_wins() {
        let soil = SoilTable::from_reader(SOIL.as_bytes()).unwrap();
        assert_eq!(soil.get("BURDWAN").unwrap().soil_health_score, 4.7);
        assert_eq!(soil.get("nadia").unwrap().soil_health_score, 0.0);
        assert!(soil.get("Kolkata").is_none());
        assert_eq!(soil.district_count(), 2);
    }
}
