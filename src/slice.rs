//
// slice.rs
// dcm-convertor
//
// Lists the slice files of one series and decodes each into raw pixels plus the geometry attributes.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::{Path, PathBuf};

use dicom::object::{open_file, DefaultDicomObject};
use dicom_dictionary_std::tags;
use dicom_pixeldata::{
    ConvertOptions, DecodedPixelData, ModalityLutOption, PixelDecoder, PixelRepresentation,
    VoiLutOption,
};
use ndarray::{s, Array2};
use walkdir::WalkDir;

use crate::dicom_access::ElementAccess;
use crate::error::{ConvertError, Result};

/// Sample type of the stored pixels, from BitsAllocated and PixelRepresentation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl PixelType {
    pub fn name(self) -> &'static str {
        match self {
            PixelType::U8 => "u8",
            PixelType::I8 => "i8",
            PixelType::U16 => "u16",
            PixelType::I16 => "i16",
            PixelType::U32 => "u32",
            PixelType::I32 => "i32",
        }
    }

    fn from_encoding(bits_allocated: u16, representation: PixelRepresentation) -> Self {
        let signed = representation == PixelRepresentation::Signed;
        match (bits_allocated, signed) {
            (0..=8, false) => PixelType::U8,
            (0..=8, true) => PixelType::I8,
            (9..=16, false) => PixelType::U16,
            (9..=16, true) => PixelType::I16,
            (_, false) => PixelType::U32,
            (_, true) => PixelType::I32,
        }
    }
}

/// A 2-D pixel array (rows x columns) in the slice's own sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Array2<u8>),
    I8(Array2<i8>),
    U16(Array2<u16>),
    I16(Array2<i16>),
    U32(Array2<u32>),
    I32(Array2<i32>),
}

macro_rules! each_variant {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            PixelData::U8($arr) => $body,
            PixelData::I8($arr) => $body,
            PixelData::U16($arr) => $body,
            PixelData::I16($arr) => $body,
            PixelData::U32($arr) => $body,
            PixelData::I32($arr) => $body,
        }
    };
}

impl PixelData {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            PixelData::U8(_) => PixelType::U8,
            PixelData::I8(_) => PixelType::I8,
            PixelData::U16(_) => PixelType::U16,
            PixelData::I16(_) => PixelType::I16,
            PixelData::U32(_) => PixelType::U32,
            PixelData::I32(_) => PixelType::I32,
        }
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        each_variant!(self, arr => arr.dim())
    }

    /// Pixel values widened to f64, for arithmetic that must not overflow.
    pub fn to_f64(&self) -> Array2<f64> {
        each_variant!(self, arr => arr.mapv(f64::from))
    }

    /// Raw intensities saturated into the 8-bit sample range, row-major.
    pub fn saturate_to_u8(&self) -> Vec<u8> {
        each_variant!(self, arr => arr
            .iter()
            .map(|&v| {
                let v = i64::from(v);
                v.clamp(0, i64::from(u8::MAX)) as u8
            })
            .collect())
    }
}

/// Geometry and ordering attributes read alongside the pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceMetadata {
    /// (row spacing, column spacing) in millimetres.
    pub pixel_spacing: Option<(f64, f64)>,
    pub slice_thickness: Option<f64>,
    pub instance_number: Option<i64>,
}

impl SliceMetadata {
    pub fn from_object<T: ElementAccess>(obj: &T) -> Self {
        let pixel_spacing = obj
            .element_multi_f64(tags::PIXEL_SPACING)
            .and_then(|v| match v.as_slice() {
                [row, column, ..] => Some((*row, *column)),
                _ => None,
            });

        SliceMetadata {
            pixel_spacing,
            slice_thickness: obj.element_f64(tags::SLICE_THICKNESS),
            instance_number: obj.element_int(tags::INSTANCE_NUMBER),
        }
    }
}

/// One decoded slice file.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub path: PathBuf,
    pub pixels: PixelData,
    pub metadata: SliceMetadata,
}

impl Slice {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn columns(&self) -> usize {
        self.pixels.dim().1
    }
}

/// Lists the `*.dcm` files directly inside `series_dir`, sorted by file name.
pub fn list_slice_files(series_dir: &Path) -> Result<Vec<PathBuf>> {
    if !series_dir.is_dir() {
        return Err(ConvertError::DirectoryNotFound(series_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(series_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        // An unreadable entry fails the listing rather than shrinking the series.
        let entry = entry?;
        if entry.file_type().is_file() && has_dcm_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn has_dcm_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

/// Opens a slice file, keeping the parsed object for callers that derive new files from it.
pub fn open_slice(path: &Path) -> Result<(DefaultDicomObject, Slice)> {
    let obj = open_file(path).map_err(|e| ConvertError::slice_read(path, e))?;
    if !obj.has_element(tags::PIXEL_DATA) {
        return Err(ConvertError::MissingPixelData(path.to_path_buf()));
    }

    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| ConvertError::slice_read(path, e))?;
    let pixels = decode_pixels(&decoded, path)?;
    drop(decoded);

    let slice = Slice {
        path: path.to_path_buf(),
        pixels,
        metadata: SliceMetadata::from_object(&obj),
    };
    Ok((obj, slice))
}

pub fn read_slice(path: &Path) -> Result<Slice> {
    open_slice(path).map(|(_, slice)| slice)
}

/// Reads every slice of a series in listing order; the first failure aborts.
pub fn read_series(series_dir: &Path) -> Result<Vec<Slice>> {
    list_slice_files(series_dir)?
        .iter()
        .map(|path| read_slice(path))
        .collect()
}

fn decode_pixels(decoded: &DecodedPixelData<'_>, path: &Path) -> Result<PixelData> {
    if decoded.samples_per_pixel() != 1 {
        return Err(ConvertError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            reason: format!("{} samples per pixel", decoded.samples_per_pixel()),
        });
    }
    if decoded.number_of_frames() != 1 {
        return Err(ConvertError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            reason: format!("{} frames", decoded.number_of_frames()),
        });
    }

    let pixel_type =
        PixelType::from_encoding(decoded.bits_allocated(), decoded.pixel_representation());
    // Stored values only: no rescale, no windowing.
    let options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::None)
        .with_voi_lut(VoiLutOption::Identity);

    macro_rules! raw_frame {
        ($t:ty, $variant:ident) => {
            decoded
                .to_ndarray_with_options::<$t>(&options)
                .map(|frames| PixelData::$variant(frames.slice_move(s![0, .., .., 0])))
                .map_err(|e| ConvertError::slice_read(path, e))
        };
    }

    match pixel_type {
        PixelType::U8 => raw_frame!(u8, U8),
        PixelType::I8 => raw_frame!(i8, I8),
        PixelType::U16 => raw_frame!(u16, U16),
        PixelType::I16 => raw_frame!(i16, I16),
        PixelType::U32 => raw_frame!(u32, U32),
        PixelType::I32 => raw_frame!(i32, I32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn slice_listing_filters_and_sorts() {
        let dir = tempdir().expect("tmpdir");
        for name in ["b.dcm", "a.DCM", "c.txt", "d.dcm.bak"] {
            fs::write(dir.path().join(name), b"").expect("write");
        }
        fs::create_dir(dir.path().join("nested.dcm")).expect("mkdir");

        let files = list_slice_files(dir.path()).expect("list");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.DCM", "b.dcm"]);
    }

    #[test]
    fn unparseable_file_is_a_read_error() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("broken.dcm");
        fs::write(&path, b"definitely not dicom").expect("write");
        assert!(matches!(
            read_slice(&path),
            Err(ConvertError::SliceRead { .. })
        ));
    }

    #[test]
    fn pixel_type_follows_encoding() {
        assert_eq!(
            PixelType::from_encoding(8, PixelRepresentation::Unsigned),
            PixelType::U8
        );
        assert_eq!(
            PixelType::from_encoding(16, PixelRepresentation::Signed),
            PixelType::I16
        );
        assert_eq!(
            PixelType::from_encoding(12, PixelRepresentation::Unsigned),
            PixelType::U16
        );
        assert_eq!(
            PixelType::from_encoding(32, PixelRepresentation::Signed),
            PixelType::I32
        );
    }

    #[test]
    fn saturating_cast_clips_to_byte_range() {
        let pixels = PixelData::I16(array![[-5, 0], [200, 4000]]);
        assert_eq!(pixels.saturate_to_u8(), vec![0, 0, 200, 255]);
        assert_eq!(pixels.dim(), (2, 2));
    }
}
