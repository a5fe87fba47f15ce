//! Discovery metadata and per-slice value handling.

use serde::{Deserialize, Serialize};

/// CF conventions version declared in every archive.
pub const CONVENTIONS: &str = "CF-1.5";

pub const ISO19115_TOPIC_CATEGORIES: &str = "Environment; GeoscientificInformation";

pub const STANDARD_NAME_VOCABULARY: &str = "NetCDF Climate and Forecast (CF) Metadata Convention";

/// Text attributes written into every archive.
///
/// `title` defaults to `"OGC API: {description}"` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveMetadata {
    pub title: Option<String>,
    pub description: String,
    pub summary: String,
    pub source: String,
    pub product_version: String,
    pub acknowledgment: String,
    pub creator_name: String,
    pub creator_email: String,
    pub creator_url: String,
    /// `var_desc` of the data variable.
    pub variable_description: String,
    /// `level_desc` of the data variable.
    pub level_description: String,
}

impl Default for ArchiveMetadata {
    fn default() -> Self {
        Self {
            title: None,
            description: "EO4SAS Land Cover Classification".to_string(),
            summary: "Product from the OGC API project, produced using an approached developed by Pixalytics Ltd.".to_string(),
            source: "Pixalytics Ltd".to_string(),
            product_version: format!("Version {}", env!("CARGO_PKG_VERSION")),
            acknowledgment: "Testbed 17 activity supported by OGC".to_string(),
            creator_name: "Pixalytics Ltd".to_string(),
            creator_email: "helpdesk@pixalytics.com".to_string(),
            creator_url: "https://www.pixalytics.com".to_string(),
            variable_description: "Surface Classification".to_string(),
            level_description: "Surface".to_string(),
        }
    }
}

impl ArchiveMetadata {
    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("OGC API: {}", self.description))
    }
}

/// Inclusive range of valid class values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRange {
    pub min: u8,
    pub max: u8,
}

impl ClassRange {
    /// Observed range of the non-background values of a slice.
    pub fn observed(slice: &[u8], background: u8) -> Option<Self> {
        let mut values = slice.iter().copied().filter(|&v| v != background);
        let first = values.next()?;
        Some(values.fold(Self { min: first, max: first }, |acc, v| Self {
            min: acc.min.min(v),
            max: acc.max.max(v),
        }))
    }
}

/// Writer settings that are not archive text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// zlib deflate level for the data variable (0 disables compression).
    pub deflate_level: i32,
    /// Fill / background class, never altered by clamping.
    pub background: u8,
    /// Fixed valid range; the observed range of each slice when unset.
    pub class_range: Option<ClassRange>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            deflate_level: 4,
            background: 0,
            class_range: None,
        }
    }
}

/// Clamp one slice into its valid range.
///
/// Values above `max` become `max`; positive values at or below `min` become
/// `min`. The background value passes through unchanged.
pub fn clamp_slice(slice: &[u8], background: u8, range: Option<ClassRange>) -> Vec<u8> {
    let Some(range) = range.or_else(|| ClassRange::observed(slice, background)) else {
        return slice.to_vec();
    };

    slice
        .iter()
        .map(|&v| {
            if v == background {
                v
            } else if v > range.max {
                range.max
            } else if v > 0 && v <= range.min {
                range.min
            } else {
                v
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title_uses_description() {
        let meta = ArchiveMetadata::default();
        assert_eq!(meta.title(), "OGC API: EO4SAS Land Cover Classification");

        let custom = ArchiveMetadata {
            title: Some("Custom".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.title(), "Custom");
    }

    #[test]
    fn test_observed_range_skips_background() {
        let range = ClassRange::observed(&[0, 3, 0, 7, 5], 0).unwrap();
        assert_eq!(range, ClassRange { min: 3, max: 7 });
        assert!(ClassRange::observed(&[0, 0, 0], 0).is_none());
    }

    #[test]
    fn test_clamp_observed_is_identity() {
        let slice = [0, 3, 9, 200, 0, 1];
        assert_eq!(clamp_slice(&slice, 0, None), slice.to_vec());
    }

    #[test]
    fn test_clamp_configured_range() {
        let slice = [0, 1, 2, 5, 9, 255];
        let clamped = clamp_slice(&slice, 0, Some(ClassRange { min: 2, max: 8 }));
        assert_eq!(clamped, vec![0, 2, 2, 5, 8, 8]);
    }

    #[test]
    fn test_clamp_all_background() {
        assert_eq!(clamp_slice(&[0, 0], 0, None), vec![0, 0]);
    }
}
