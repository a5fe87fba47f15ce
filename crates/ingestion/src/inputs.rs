//! Input discovery and filtering.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{IngestionError, Result};

/// Which rasters in the input directory take part in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// `*_classification.tif`, excluding RGB renderings.
    #[default]
    Classification,
    /// `*_rgb_classification.tif`.
    Rgb,
    /// Every `.tif`.
    Any,
}

impl InputKind {
    pub fn matches(&self, file_name: &str) -> bool {
        if !file_name.ends_with(".tif") {
            return false;
        }
        match self {
            InputKind::Classification => {
                file_name.ends_with("_classification.tif") && !file_name.contains("rgb")
            }
            InputKind::Rgb => file_name.ends_with("_rgb_classification.tif"),
            InputKind::Any => true,
        }
    }
}

/// List matching rasters directly inside `dir`, sorted by file name.
pub fn discover_inputs(dir: &Path, kind: InputKind) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestionError::not_found(dir, "not a directory"));
    }

    let inputs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(|n| kind.matches(n)))
        .map(|entry| entry.into_path())
        .collect();

    debug!(dir = %dir.display(), kind = ?kind, count = inputs.len(), "Discovered inputs");
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::scratch_dir;

    #[test]
    fn test_kind_matching() {
        assert!(InputKind::Classification.matches("20230101_classification.tif"));
        assert!(!InputKind::Classification.matches("20230101_rgb_classification.tif"));
        assert!(!InputKind::Classification.matches("20230101_classification.nc"));
        assert!(InputKind::Rgb.matches("20230101_rgb_classification.tif"));
        assert!(!InputKind::Rgb.matches("20230101_classification.tif"));
        assert!(InputKind::Any.matches("scene.tif"));
        assert!(!InputKind::Any.matches("scene.tif.aux.xml"));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = scratch_dir();
        for name in [
            "20230103_classification.tif",
            "20230101_classification.tif",
            "20230102_rgb_classification.tif",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("20230104_classification.tif")).unwrap();

        let found = discover_inputs(dir.path(), InputKind::Classification).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["20230101_classification.tif", "20230103_classification.tif"]
        );

        let rgb = discover_inputs(dir.path(), InputKind::Rgb).unwrap();
        assert_eq!(rgb.len(), 1);
        assert_eq!(discover_inputs(dir.path(), InputKind::Any).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_dir() {
        assert!(matches!(
            discover_inputs(Path::new("/nonexistent/input"), InputKind::Any),
            Err(IngestionError::ResourceNotFound { .. })
        ));
    }
}
