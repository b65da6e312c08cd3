use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::record::OTHER;
use crate::core::region::{Region, RegionError};
use crate::matching::search::PatternSet;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Failed to read catalogue: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalogue: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("No valid motif list found in catalogue")]
    Empty,

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Duplicate region {region} under label '{label}'")]
    DuplicateRegion { label: String, region: String },

    #[error("Catalogue layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Label -> ordered region list.
///
/// The order of each region list is the merge key between a catalogue and
/// its worker copies: copies made with [`RegionCatalogue::zeroed_copy`] keep
/// the same labels and the same per-label order, and
/// [`RegionCatalogue::merge_aligned`] adds them back index by index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCatalogue {
    regions: BTreeMap<String, Vec<Region>>,
}

impl RegionCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalogue from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::ReadError` if the file cannot be read, or any
    /// error from [`RegionCatalogue::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogueError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalogue from JSON, zeroing every counter.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::ParseError` for malformed JSON,
    /// `CatalogueError::Empty` if no label is defined, or
    /// `CatalogueError::DuplicateRegion` if a label lists the same region twice.
    pub fn from_json(json: &str) -> Result<Self, CatalogueError> {
        let regions: BTreeMap<String, Vec<Region>> = serde_json::from_str(json)?;
        let mut catalogue = Self::new();
        for (label, list) in regions {
            catalogue.insert(label, list)?;
        }
        if catalogue.is_empty() {
            return Err(CatalogueError::Empty);
        }
        Ok(catalogue)
    }

    /// Add a label with its regions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::DuplicateRegion` if two regions in `list`
    /// share the same identity.
    pub fn insert(&mut self, label: impl Into<String>, list: Vec<Region>) -> Result<(), CatalogueError> {
        let label = label.into();
        for (i, region) in list.iter().enumerate() {
            if list[..i].iter().any(|r| r.same_region(region)) {
                return Err(CatalogueError::DuplicateRegion {
                    label,
                    region: region.identity(),
                });
            }
        }
        self.regions.insert(label, list);
        Ok(())
    }

    /// Export catalogue to JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the catalogue as JSON to `path`
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::ReadError` if the file cannot be written.
    pub fn write_to_file(&self, path: &Path) -> Result<(), CatalogueError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Compile every pattern referenced by any region
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::InvalidPattern` for the first pattern that
    /// does not compile.
    pub fn compile_patterns(&self) -> Result<PatternSet, CatalogueError> {
        let patterns = self
            .regions
            .values()
            .flatten()
            .flat_map(|region| region.regex.keys());
        PatternSet::compile(patterns).map_err(|(pattern, e)| CatalogueError::InvalidPattern {
            pattern,
            message: e.to_string(),
        })
    }

    pub fn get(&self, label: &str) -> Option<&[Region]> {
        self.regions.get(label).map(Vec::as_slice)
    }

    /// Regions a record with `label` is tested against.
    ///
    /// Labels absent from the catalogue fall back to the `"other"` list; if
    /// that is absent too the record is not tallied anywhere.
    pub fn regions_for_mut(&mut self, label: &str) -> Option<&mut Vec<Region>> {
        if self.regions.contains_key(label) {
            self.regions.get_mut(label)
        } else {
            self.regions.get_mut(OTHER)
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Region])> {
        self.regions
            .iter()
            .map(|(label, list)| (label.as_str(), list.as_slice()))
    }

    /// Zero every region's counters.
    pub fn reset(&mut self) {
        self.regions.values_mut().flatten().for_each(Region::reset);
    }

    /// A structurally identical copy with all counters at zero.
    #[must_use]
    pub fn zeroed_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.reset();
        copy
    }

    /// Check that `other` has the same labels and per-label region identities, in order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::LayoutMismatch` naming the first difference.
    pub fn check_aligned(&self, other: &RegionCatalogue) -> Result<(), CatalogueError> {
        if self.regions.len() != other.regions.len() {
            return Err(CatalogueError::LayoutMismatch(format!(
                "{} labels vs {}",
                self.regions.len(),
                other.regions.len()
            )));
        }
        for ((label, list), (other_label, other_list)) in self.regions.iter().zip(&other.regions) {
            if label != other_label {
                return Err(CatalogueError::LayoutMismatch(format!(
                    "label '{label}' vs '{other_label}'"
                )));
            }
            if list.len() != other_list.len() {
                return Err(CatalogueError::LayoutMismatch(format!(
                    "label '{label}' has {} regions vs {}",
                    list.len(),
                    other_list.len()
                )));
            }
            if let Some((a, b)) = list.iter().zip(other_list).find(|(a, b)| !a.same_region(b)) {
                return Err(CatalogueError::LayoutMismatch(format!(
                    "label '{label}' region {a} vs {b}"
                )));
            }
        }
        Ok(())
    }

    /// Add the counters of `partial` into `self`, region by region at the same index.
    ///
    /// `partial` must come from [`RegionCatalogue::zeroed_copy`] of this
    /// catalogue; every region pair is still identity-checked.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::LayoutMismatch` if a label is missing or a
    /// list length differs, or `CatalogueError::Region` on an identity mismatch.
    pub fn merge_aligned(&mut self, partial: &RegionCatalogue) -> Result<(), CatalogueError> {
        for (label, partial_list) in &partial.regions {
            let Some(list) = self.regions.get_mut(label) else {
                return Err(CatalogueError::LayoutMismatch(format!(
                    "label '{label}' is not in the catalogue"
                )));
            };
            if list.len() != partial_list.len() {
                return Err(CatalogueError::LayoutMismatch(format!(
                    "label '{label}' has {} regions vs {}",
                    list.len(),
                    partial_list.len()
                )));
            }
            for (i, region) in partial_list.iter().enumerate() {
                list[i].merge(region)?;
            }
        }
        Ok(())
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of regions across all labels
    pub fn region_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}
