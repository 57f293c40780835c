//
// storage.rs
// dcm-convertor
//
// Output tree layout: one root per export kind, mirrored per series, files named after the source slice.
//
// Thales Matheus Mendonça Santos - October 2026

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const JPEG_DIR: &str = "jpeg";
pub const NIFTI_DIR: &str = "nifti";
pub const THRESHOLD_DICOM_DIR: &str = "threshold_dicom";
pub const THRESHOLD_JPEG_DIR: &str = "threshold_jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Jpeg,
    Nifti,
    ThresholdDicom,
    ThresholdJpeg,
}

impl OutputKind {
    fn dir_name(self) -> &'static str {
        match self {
            OutputKind::Jpeg => JPEG_DIR,
            OutputKind::Nifti => NIFTI_DIR,
            OutputKind::ThresholdDicom => THRESHOLD_DICOM_DIR,
            OutputKind::ThresholdJpeg => THRESHOLD_JPEG_DIR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn series_dir(&self, kind: OutputKind, series: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(series)
    }

    /// Per-series output directory, created on first use.
    pub fn ensure_series_dir(&self, kind: OutputKind, series: &str) -> Result<PathBuf> {
        let dir = self.series_dir(kind, series);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// `<dir>/<stem of source>.<extension>`
pub fn derived_path(dir: &Path, source: &Path, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "slice".to_string());
    dir.join(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn series_dirs_mirror_the_input_names() {
        let root = tempdir().expect("tmpdir");
        let layout = OutputLayout::new(root.path());

        let dir = layout
            .ensure_series_dir(OutputKind::ThresholdJpeg, "SERIES_A")
            .expect("create");
        assert_eq!(dir, root.path().join("threshold_jpeg").join("SERIES_A"));
        assert!(dir.is_dir());
        assert!(!layout.series_dir(OutputKind::Jpeg, "SERIES_A").exists());
    }

    #[test]
    fn derived_path_swaps_extension() {
        let out = derived_path(Path::new("out"), Path::new("/in/IM-0001-0001.dcm"), "jpg");
        assert_eq!(out, Path::new("out").join("IM-0001-0001.jpg"));
    }
}
