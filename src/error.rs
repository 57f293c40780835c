//
// error.rs
// dcm-convertor
//
// Error taxonomy shared by the series reader, the volume assembler and the exporters.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read DICOM slice {path:?}: {reason}")]
    SliceRead { path: PathBuf, reason: String },

    #[error("Slice {0:?} has no pixel data")]
    MissingPixelData(PathBuf),

    #[error("Slice {path:?} is missing attribute {attribute}")]
    MissingAttribute {
        path: PathBuf,
        attribute: &'static str,
    },

    #[error("Unsupported pixel format in {path:?}: {reason}")]
    UnsupportedPixelFormat { path: PathBuf, reason: String },

    #[error("Series {0:?} contains no .dcm slices")]
    EmptySeries(PathBuf),

    #[error(
        "Slice {path:?} is {rows}x{columns}, expected {expected_rows}x{expected_columns}"
    )]
    InconsistentGeometry {
        path: PathBuf,
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },

    #[error("Slice {path:?} stores {found} pixels, expected {expected}")]
    InconsistentPixelType {
        path: PathBuf,
        found: &'static str,
        expected: &'static str,
    },

    #[error("Failed to start {program}: {source}")]
    ExternalToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    ExternalToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    ExternalToolTimeout { program: String, timeout: Duration },

    #[error("Failed to write image {path:?}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write DICOM file {path:?}: {reason}")]
    DicomWrite { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub(crate) fn slice_read(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ConvertError::SliceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors confined to a single slice file; the skip policy may step over these.
    pub fn is_slice_local(&self) -> bool {
        matches!(
            self,
            ConvertError::SliceRead { .. }
                | ConvertError::MissingPixelData(_)
                | ConvertError::UnsupportedPixelFormat { .. }
        )
    }
}

/// Listing failures keep the underlying IO error; a directory loop has none.
impl From<walkdir::Error> for ConvertError {
    fn from(err: walkdir::Error) -> Self {
        let message = err.to_string();
        ConvertError::Io(
            err.into_io_error()
                .unwrap_or_else(|| std::io::Error::other(message)),
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    #[test]
    fn listing_failures_become_io_errors() {
        let dir = tempdir().expect("tmpdir");
        let failure = WalkDir::new(dir.path().join("absent"))
            .into_iter()
            .next()
            .expect("one entry")
            .expect_err("missing root");

        match ConvertError::from(failure) {
            ConvertError::Io(err) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
