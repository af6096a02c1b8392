//! District resolution: coordinate → geocoder address → canonical district
//! name that joins against the historical tables.

use crate::datasources::ReverseGeocoder;
use crate::error::{AgriSureError, ResolutionError, Result};
use crate::models::{GeoPoint, ResolvedDistrict};
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BUILTIN_ALIASES: &str = include_str!("../../config/district_aliases.yaml");

#[derive(Debug, Deserialize)]
struct AliasFile {
    version: u32,
    aliases: HashMap<String, String>,
}

/// Renamed or merged districts mapped onto the names in the historical tables.
#[derive(Debug, Clone)]
pub struct DistrictAliases {
    version: u32,
    /// lowercase normalized key -> canonical target
    map: HashMap<String, String>,
}

/// Strips administrative suffixes and applies the alias table.
#[derive(Debug, Clone)]
pub struct DistrictCanonicalizer {
    suffix: Regex,
    district_word: Regex,
    aliases: DistrictAliases,
}

impl DistrictCanonicalizer {
    pub fn new(aliases: DistrictAliases) -> Result<Self> {
        let suffix = Regex::new(r"(?i)\s*[-–]\s*(?:I{1,3}|IV|V|VI|VII|VIII|IX|X|\d+)$")
            .map_err(|e| AgriSureError::Internal(format!("district suffix pattern: {}", e)))?;
        let district_word = Regex::new(r"(?i)\bdistrict\b")
            .map_err(|e| AgriSureError::Internal(format!("district word pattern: {}", e)))?;

        let canonicalizer = Self {
            suffix,
            district_word,
            aliases: DistrictAliases::empty(),
        };
        let aliases = aliases.validated(&canonicalizer)?;

        Ok(Self {
            aliases,
            ..canonicalizer
        })
    }

    pub fn with_builtin_aliases() -> Result<Self> {
        Self::new(DistrictAliases::builtin()?)
    }

    /// Strip "-II"/"- 3" style suffixes and the word "District", collapsing
    /// whitespace, repeated until nothing changes.
    pub fn normalize(&self, name: &str) -> String {
        let mut current = collapse_whitespace(name);
        loop {
            let stripped = self.suffix.replace(&current, "");
            let stripped = self.district_word.replace_all(&stripped, "");
            let next = collapse_whitespace(&stripped);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Normalized name with the alias table applied.
    pub fn canonicalize(&self, name: &str) -> String {
        let normalized = self.normalize(name);
        match self.aliases.lookup(&normalized) {
            Some(target) => target.to_string(),
            None => normalized,
        }
    }

    pub fn aliases(&self) -> &DistrictAliases {
        &self.aliases
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl DistrictAliases {
    pub fn empty() -> Self {
        Self {
            version: 0,
            map: HashMap::new(),
        }
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_ALIASES)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgriSureError::Config(format!(
                "Failed to read alias table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: AliasFile = serde_yaml::from_str(content)?;
        Ok(Self::from_pairs(file.version, file.aliases))
    }

    pub fn from_pairs(version: u32, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            version,
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn lookup(&self, normalized: &str) -> Option<&str> {
        self.map.get(&normalized.to_lowercase()).map(String::as_str)
    }

    /// Re-key through the normalizer and reject chains: every target must be
    /// already normalized and must not be a key itself.
    fn validated(self, canonicalizer: &DistrictCanonicalizer) -> Result<Self> {
        let map: HashMap<String, String> = self
            .map
            .into_iter()
            .map(|(k, v)| (canonicalizer.normalize(&k).to_lowercase(), v))
            .collect();

        for (key, target) in &map {
            if key.is_empty() || target.is_empty() {
                return Err(AgriSureError::Config(
                    "district alias entries must not be empty".into(),
                ));
            }
            if canonicalizer.normalize(target) != *target {
                return Err(AgriSureError::Config(format!(
                    "district alias target '{}' is not a normalized name",
                    target
                )));
            }
            if map.contains_key(&target.to_lowercase()) {
                return Err(AgriSureError::Config(format!(
                    "district alias '{}' -> '{}' chains into another alias",
                    key, target
                )));
            }
        }

        Ok(Self {
            version: self.version,
            map,
        })
    }
}

pub struct DistrictResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
    canonicalizer: DistrictCanonicalizer,
    timeout: Duration,
}

impl DistrictResolver {
    pub fn new(
        geocoder: Arc<dyn ReverseGeocoder>,
        canonicalizer: DistrictCanonicalizer,
        timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            canonicalizer,
            timeout,
        }
    }

    pub fn canonicalizer(&self) -> &DistrictCanonicalizer {
        &self.canonicalizer
    }

    pub async fn resolve(
        &self,
        point: GeoPoint,
    ) -> std::result::Result<ResolvedDistrict, ResolutionError> {
        let address = match tokio::time::timeout(self.timeout, self.geocoder.reverse(point)).await
        {
            Err(_) => {
                tracing::warn!("Reverse geocoding {} timed out after {:?}", point, self.timeout);
                return Err(ResolutionError::GeocodeUnavailable(
                    "Reverse geocoding service timed out.".into(),
                ));
            }
            Ok(Err(e)) => {
                tracing::warn!("Reverse geocoding {} failed: {}", point, e);
                return Err(ResolutionError::GeocodeUnavailable(e.to_string()));
            }
            Ok(Ok(None)) => {
                return Err(ResolutionError::GeocodeUnavailable(
                    "Could not get district from coordinates.".into(),
                ));
            }
            Ok(Ok(Some(address))) => address,
        };

        let detected = address
            .district_like()
            .ok_or(ResolutionError::DistrictNotFound)?
            .to_string();

        let display_name = self.canonicalizer.normalize(&detected);
        if display_name.is_empty() {
            return Err(ResolutionError::DistrictNotFound);
        }
        let canonical = self.canonicalizer.canonicalize(&display_name);

        tracing::debug!(
            "Resolved {} to district '{}' (canonical '{}')",
            point,
            detected,
            canonical
        );

        Ok(ResolvedDistrict {
            detected,
            display_name,
            canonical,
        })
    }
}
