//! Gene locus registry
//!
//! Immutable mapping from (crop, trait) to the gene used for guide design.
//! The registry is a data artifact: the default table ships as
//! `data/crops_and_traits.json` and is embedded at compile time; a
//! replacement file can be supplied at startup.
//!
//! Artifact layout:
//!
//! ```json
//! {
//!   "rice": {
//!     "scientific_name": "oryza_sativa",
//!     "traits": {
//!       "drought resistance": { "external_id": "LOC_Os06g03670", "symbol": "DREB1A" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GrnaError;

/// Registry shipped with the crate
const EMBEDDED_REGISTRY: &str = include_str!("../../data/crops_and_traits.json");

/// Gene reference stored per trait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRef {
    /// Identifier understood by the primary source
    #[serde(alias = "ensembl_id")]
    pub external_id: String,
    /// Gene symbol used by the secondary source
    pub symbol: String,
}

/// One crop and its supported traits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropEntry {
    /// Species identifier in `genus_species` form (e.g. `oryza_sativa`)
    pub scientific_name: String,
    #[serde(default)]
    pub traits: BTreeMap<String, GeneRef>,
}

/// A resolved registry record for one (crop, trait) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneLocus {
    pub crop: String,
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Species identifier used by the primary source
    pub organism_id: String,
    pub external_id: String,
    pub symbol: String,
}

impl GeneLocus {
    /// Human-readable organism name for the secondary source (`oryza_sativa` -> `oryza sativa`)
    pub fn organism_name(&self) -> String {
        organism_display_name(&self.organism_id)
    }

    /// The gene descriptor surfaced to callers
    pub fn gene_ref(&self) -> GeneRef {
        GeneRef {
            external_id: self.external_id.clone(),
            symbol: self.symbol.clone(),
        }
    }
}

/// Replace `_` separators with spaces
pub fn organism_display_name(organism_id: &str) -> String {
    organism_id
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup failures; both mean "unsupported crop or trait"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Crop not supported: '{crop}'")]
    UnsupportedCrop { crop: String },

    #[error("Trait not supported for this crop: '{trait_name}' ({crop})")]
    UnsupportedTrait { crop: String, trait_name: String },
}

/// Normalize a lookup key: trimmed, lower case
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Immutable crop/trait registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocusRegistry {
    crops: BTreeMap<String, CropEntry>,
}

impl LocusRegistry {
    /// The registry compiled into the crate
    pub fn embedded() -> Result<Self, GrnaError> {
        Self::from_json_str(EMBEDDED_REGISTRY)
    }

    /// Parse a registry artifact
    ///
    /// Keys are normalized to lower case. Two keys that normalize to the same
    /// name (e.g. `"Rice"` and `"rice"`) are a format error.
    pub fn from_json_str(json: &str) -> Result<Self, GrnaError> {
        let raw: BTreeMap<String, CropEntry> =
            serde_json::from_str(json).map_err(|e| GrnaError::RegistryFormat {
                msg: e.to_string(),
            })?;
        Self::from_entries(raw)
    }

    /// Load a registry artifact from disk
    pub fn from_path(path: &Path) -> Result<Self, GrnaError> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded gene registry from {} ({} crops, {} traits)",
            path.display(),
            registry.crop_count(),
            registry.len()
        );
        Ok(registry)
    }

    /// Build from already-parsed entries
    pub fn from_entries(entries: BTreeMap<String, CropEntry>) -> Result<Self, GrnaError> {
        let mut crops = BTreeMap::new();
        for (crop, entry) in entries {
            let crop = normalize_key(&crop);
            if crop.is_empty() {
                return Err(GrnaError::RegistryFormat {
                    msg: "empty crop name".to_string(),
                });
            }
            if entry.scientific_name.trim().is_empty() {
                return Err(GrnaError::RegistryFormat {
                    msg: format!("crop '{}' has no scientific_name", crop),
                });
            }
            let mut traits = BTreeMap::new();
            for (name, gene) in entry.traits {
                let key = normalize_key(&name);
                if traits.insert(key.clone(), gene).is_some() {
                    return Err(GrnaError::RegistryFormat {
                        msg: format!("crop '{}' lists trait '{}' more than once", crop, key),
                    });
                }
            }
            let entry = CropEntry {
                scientific_name: entry.scientific_name.trim().to_string(),
                traits,
            };
            if crops.insert(crop.clone(), entry).is_some() {
                return Err(GrnaError::RegistryFormat {
                    msg: format!("crop '{}' is listed more than once", crop),
                });
            }
        }
        if crops.is_empty() {
            return Err(GrnaError::RegistryEmpty);
        }
        Ok(Self { crops })
    }

    /// Resolve a (crop, trait) pair; matching is case-insensitive
    pub fn lookup(&self, crop: &str, trait_name: &str) -> Result<GeneLocus, LookupError> {
        let crop_key = normalize_key(crop);
        let trait_key = normalize_key(trait_name);

        let entry = self
            .crops
            .get(&crop_key)
            .ok_or_else(|| LookupError::UnsupportedCrop {
                crop: crop_key.clone(),
            })?;
        let gene = entry
            .traits
            .get(&trait_key)
            .ok_or_else(|| LookupError::UnsupportedTrait {
                crop: crop_key.clone(),
                trait_name: trait_key.clone(),
            })?;

        Ok(GeneLocus {
            crop: crop_key,
            trait_name: trait_key,
            organism_id: entry.scientific_name.clone(),
            external_id: gene.external_id.clone(),
            symbol: gene.symbol.clone(),
        })
    }

    /// Crop entry by (case-insensitive) name
    pub fn crop(&self, crop: &str) -> Option<&CropEntry> {
        self.crops.get(&normalize_key(crop))
    }

    /// Crop names in sorted order
    pub fn crops(&self) -> impl Iterator<Item = &str> {
        self.crops.keys().map(String::as_str)
    }

    /// Trait names of one crop in sorted order
    pub fn traits(&self, crop: &str) -> Option<Vec<&str>> {
        self.crop(crop)
            .map(|entry| entry.traits.keys().map(String::as_str).collect())
    }

    /// The full mapping, as served to clients
    pub fn entries(&self) -> &BTreeMap<String, CropEntry> {
        &self.crops
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }

    /// Number of (crop, trait) pairs
    pub fn len(&self) -> usize {
        self.crops.values().map(|c| c.traits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
