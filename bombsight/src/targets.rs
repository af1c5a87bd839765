//! Named target catalog.
//!
//! ```json
//! { "targets": [ { "name": "drop_zone_a", "latitude": 22.3293,
//!                  "longitude": 114.1794, "altitude": 0.0,
//!                  "description": "Drop zone A" } ] }
//! ```
//!
//! Every entry is validated into a `GeoPosition` on load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{GeoPosition, ValidationError};

/// Target catalog errors.
#[derive(Debug, Error)]
pub enum TargetCatalogError {
    #[error("Failed to read target catalog: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse target catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid target '{name}': {source}")]
    Invalid {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("Target '{0}' not found in catalog")]
    NotFound(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTarget {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: f64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCatalog {
    targets: Vec<RawTarget>,
}

/// A validated, named target.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTarget {
    pub name: String,
    pub position: GeoPosition,
    pub description: String,
}

/// Targets loaded from a catalog file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetCatalog {
    targets: Vec<NamedTarget>,
}

impl TargetCatalog {
    pub fn new(targets: Vec<NamedTarget>) -> Self {
        Self { targets }
    }

    pub fn load(path: &Path) -> Result<Self, TargetCatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, TargetCatalogError> {
        let raw: RawCatalog = serde_json::from_str(text)?;
        let targets = raw
            .targets
            .into_iter()
            .map(|t| {
                let position = GeoPosition::new(t.latitude, t.longitude, t.altitude).map_err(
                    |source| TargetCatalogError::Invalid {
                        name: t.name.clone(),
                        source,
                    },
                )?;
                Ok(NamedTarget {
                    name: t.name,
                    position,
                    description: t.description,
                })
            })
            .collect::<Result<Vec<_>, TargetCatalogError>>()?;
        Ok(Self { targets })
    }

    pub fn save(&self, path: &Path) -> Result<(), TargetCatalogError> {
        let raw = RawCatalog {
            targets: self
                .targets
                .iter()
                .map(|t| RawTarget {
                    name: t.name.clone(),
                    latitude: t.position.latitude(),
                    longitude: t.position.longitude(),
                    altitude: t.position.altitude(),
                    description: t.description.clone(),
                })
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&raw)?)?;
        Ok(())
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Result<&NamedTarget, TargetCatalogError> {
        self.targets
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TargetCatalogError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
