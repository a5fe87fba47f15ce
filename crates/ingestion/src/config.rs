//! Pipeline configuration.
//!
//! Layered as: built-in defaults, then an optional YAML file, then
//! `LANDCOVER_*` environment variables. CLI flags are applied last by the
//! service.

use std::env;
use std::path::{Path, PathBuf};

use netcdf_archive::{ArchiveMetadata, ClassRange, WriterOptions};
use projection::AxisMode;
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, Result};

/// Everything the converter needs besides the per-run options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `gdaladdo` / `gdal_translate`; `PATH` lookup when unset.
    pub gdal_tool_dir: Option<PathBuf>,

    /// Archive text attributes.
    pub metadata: ArchiveMetadata,

    /// Compression, background and class range.
    pub writer: WriterOptions,

    /// Force the UTM central meridian instead of deriving it from the zone.
    pub central_meridian: Option<f64>,

    /// Geographic axis derivation.
    pub axis_mode: AxisMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gdal_tool_dir: None,
            metadata: ArchiveMetadata::default(),
            writer: WriterOptions::default(),
            central_meridian: None,
            axis_mode: AxisMode::Linear,
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| IngestionError::InvalidConfig(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| IngestionError::not_found(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Apply `LANDCOVER_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LANDCOVER_GDAL_HOME") {
            self.gdal_tool_dir = Some(PathBuf::from(dir));
        }
        if let Some(description) = lookup("LANDCOVER_DESCRIPTION") {
            self.metadata.description = description;
        }
        if let Some(title) = lookup("LANDCOVER_TITLE") {
            self.metadata.title = Some(title);
        }
        if let Some(version) = lookup("LANDCOVER_PRODUCT_VERSION") {
            self.metadata.product_version = version;
        }
        if let Some(level) = lookup("LANDCOVER_DEFLATE_LEVEL") {
            self.writer.deflate_level = parse_value("LANDCOVER_DEFLATE_LEVEL", &level)?;
        }
        if let Some(background) = lookup("LANDCOVER_BACKGROUND") {
            self.writer.background = parse_value("LANDCOVER_BACKGROUND", &background)?;
        }
        if let Some(range) = lookup("LANDCOVER_CLASS_RANGE") {
            self.writer.class_range = Some(parse_class_range(&range)?);
        }
        if let Some(cm) = lookup("LANDCOVER_CENTRAL_MERIDIAN") {
            self.central_meridian = Some(parse_value("LANDCOVER_CENTRAL_MERIDIAN", &cm)?);
        }
        if let Some(mode) = lookup("LANDCOVER_AXIS_MODE") {
            self.axis_mode = match mode.to_lowercase().as_str() {
                "linear" => AxisMode::Linear,
                "exact" => AxisMode::Exact,
                other => {
                    return Err(IngestionError::InvalidConfig(format!(
                        "LANDCOVER_AXIS_MODE must be 'linear' or 'exact', got '{}'",
                        other
                    )))
                }
            };
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=9).contains(&self.writer.deflate_level) {
            return Err(IngestionError::InvalidConfig(format!(
                "deflate level {} outside 0-9",
                self.writer.deflate_level
            )));
        }
        if let Some(range) = self.writer.class_range {
            if range.min > range.max {
                return Err(IngestionError::InvalidConfig(format!(
                    "class range min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        if let Some(cm) = self.central_meridian {
            if !(-180.0..=180.0).contains(&cm) {
                return Err(IngestionError::InvalidConfig(format!(
                    "central meridian {} outside [-180, 180]",
                    cm
                )));
            }
        }
        if self.metadata.description.trim().is_empty() {
            return Err(IngestionError::InvalidConfig(
                "description must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| IngestionError::InvalidConfig(format!("{}: invalid value '{}'", key, value)))
}

/// `"min-max"`, e.g. `"1-12"`.
fn parse_class_range(value: &str) -> Result<ClassRange> {
    let (min, max) = value.split_once('-').ok_or_else(|| {
        IngestionError::InvalidConfig(format!("class range '{}' is not 'min-max'", value))
    })?;
    Ok(ClassRange {
        min: parse_value("LANDCOVER_CLASS_RANGE", min)?,
        max: parse_value("LANDCOVER_CLASS_RANGE", max)?,
    })
}
