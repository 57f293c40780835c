//
// jpeg.rs
// dcm-convertor
//
// Writes every slice of every series as a single-channel JPEG holding the raw intensities.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::Path;

use image::{ColorType, ImageFormat};
use tracing::info;

use crate::batch::{self, BatchSummary, ErrorPolicy};
use crate::error::{ConvertError, Result};
use crate::series::{self, Series};
use crate::slice;
use crate::storage::{derived_path, OutputKind, OutputLayout};

/// Converts all series under `dcm_dir` into `<output>/jpeg/<series>/<slice>.jpg`.
pub fn dcm2jpg(
    dcm_dir: &Path,
    layout: &OutputLayout,
    policy: ErrorPolicy,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for series in series::list_series(dcm_dir)? {
        info!("Converting series {} to jpeg", series.name);
        let result = export_series(&series, layout, policy);
        summary.record_series(policy, &series.name, result)?;
    }
    Ok(summary)
}

/// One JPEG per slice, no windowing: intensities are saturated into 0..=255.
pub fn export_series(
    series: &Series,
    layout: &OutputLayout,
    policy: ErrorPolicy,
) -> Result<BatchSummary> {
    let jpeg_series = layout.ensure_series_dir(OutputKind::Jpeg, &series.name)?;

    batch::for_each_slice(&series.path, policy, |path| {
        let slice = slice::read_slice(path)?;
        let jpeg_file = derived_path(&jpeg_series, path, "jpg");
        info!(
            "\t -Writing the data {} out to {}",
            slice.file_name(),
            jpeg_file.display()
        );
        write_gray_jpeg(
            &jpeg_file,
            slice.rows(),
            slice.columns(),
            &slice.pixels.saturate_to_u8(),
        )
    })
}

/// Encodes a row-major 8-bit buffer of `rows x columns` samples as a grayscale JPEG.
pub fn write_gray_jpeg(path: &Path, rows: usize, columns: usize, samples: &[u8]) -> Result<()> {
    image::save_buffer_with_format(
        path,
        samples,
        columns as u32,
        rows as u32,
        ColorType::L8,
        ImageFormat::Jpeg,
    )
    .map_err(|source| ConvertError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn gray_jpeg_has_the_slice_dimensions() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("slice.jpg");
        let samples: Vec<u8> = (0..12).map(|v| v * 20).collect();

        write_gray_jpeg(&path, 3, 4, &samples).expect("write");

        let decoded = image::open(&path).expect("decode");
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.color(), ColorType::L8);
    }
}
