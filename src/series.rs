//
// series.rs
// dcm-convertor
//
// Enumerates the series directories found directly under the input root.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ConvertError, Result};

/// One DICOM series: an immediate subdirectory of the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub path: PathBuf,
}

/// Lists the series under `root`, sorted by directory name.
///
/// Plain files next to the series directories are ignored.
pub fn list_series(root: &Path) -> Result<Vec<Series>> {
    if !root.is_dir() {
        return Err(ConvertError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut series = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        series.push(Series {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        });
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_only_subdirectories_in_name_order() {
        let root = tempdir().expect("tmpdir");
        fs::create_dir(root.path().join("SERIES_B")).expect("mkdir");
        fs::create_dir(root.path().join("SERIES_A")).expect("mkdir");
        fs::write(root.path().join("README.txt"), b"notes").expect("write");

        let series = list_series(root.path()).expect("list");
        let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["SERIES_A", "SERIES_B"]);
        assert_eq!(series[0].path, root.path().join("SERIES_A"));
    }

    #[test]
    fn missing_root_is_reported() {
        let root = tempdir().expect("tmpdir");
        let missing = root.path().join("nope");
        assert!(matches!(
            list_series(&missing),
            Err(ConvertError::DirectoryNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn file_as_root_is_reported() {
        let root = tempdir().expect("tmpdir");
        let file = root.path().join("slice.dcm");
        fs::write(&file, b"x").expect("write");
        assert!(matches!(
            list_series(&file),
            Err(ConvertError::DirectoryNotFound(_))
        ));
    }
}
