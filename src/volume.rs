//
// volume.rs
// dcm-convertor
//
// Stacks the slices of one series into a rows x columns x slices array with physical spacing.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::{Path, PathBuf};

use ndarray::{s, Array3};

use crate::error::{ConvertError, Result};
use crate::slice::{PixelData, PixelType, Slice};

/// Which key decides the position of each slice along the third axis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SliceOrder {
    /// Rank of the file in the filename-sorted listing.
    #[default]
    Listing,
    /// Ascending InstanceNumber (0020,0013).
    InstanceNumber,
}

/// Physical voxel size in millimetres.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spacing {
    pub row: f64,
    pub column: f64,
    pub slice: f64,
}

/// A rows x columns x slices array in the series' sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    U8(Array3<u8>),
    I8(Array3<i8>),
    U16(Array3<u16>),
    I16(Array3<i16>),
    U32(Array3<u32>),
    I32(Array3<i32>),
}

impl VolumeData {
    fn zeros(pixel_type: PixelType, shape: (usize, usize, usize)) -> Self {
        match pixel_type {
            PixelType::U8 => VolumeData::U8(Array3::zeros(shape)),
            PixelType::I8 => VolumeData::I8(Array3::zeros(shape)),
            PixelType::U16 => VolumeData::U16(Array3::zeros(shape)),
            PixelType::I16 => VolumeData::I16(Array3::zeros(shape)),
            PixelType::U32 => VolumeData::U32(Array3::zeros(shape)),
            PixelType::I32 => VolumeData::I32(Array3::zeros(shape)),
        }
    }

    /// Writes `pixels` at depth `index`; false when the sample types differ.
    fn place(&mut self, index: usize, pixels: &PixelData) -> bool {
        match (self, pixels) {
            (VolumeData::U8(v), PixelData::U8(p)) => v.slice_mut(s![.., .., index]).assign(p),
            (VolumeData::I8(v), PixelData::I8(p)) => v.slice_mut(s![.., .., index]).assign(p),
            (VolumeData::U16(v), PixelData::U16(p)) => v.slice_mut(s![.., .., index]).assign(p),
            (VolumeData::I16(v), PixelData::I16(p)) => v.slice_mut(s![.., .., index]).assign(p),
            (VolumeData::U32(v), PixelData::U32(p)) => v.slice_mut(s![.., .., index]).assign(p),
            (VolumeData::I32(v), PixelData::I32(p)) => v.slice_mut(s![.., .., index]).assign(p),
            _ => return false,
        }
        true
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            VolumeData::U8(_) => PixelType::U8,
            VolumeData::I8(_) => PixelType::I8,
            VolumeData::U16(_) => PixelType::U16,
            VolumeData::I16(_) => PixelType::I16,
            VolumeData::U32(_) => PixelType::U32,
            VolumeData::I32(_) => PixelType::I32,
        }
    }

    /// (rows, columns, slices)
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            VolumeData::U8(v) => v.dim(),
            VolumeData::I8(v) => v.dim(),
            VolumeData::U16(v) => v.dim(),
            VolumeData::I16(v) => v.dim(),
            VolumeData::U32(v) => v.dim(),
            VolumeData::I32(v) => v.dim(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub data: VolumeData,
    pub spacing: Spacing,
    /// Source file of each depth index.
    pub sources: Vec<PathBuf>,
}

impl Volume {
    /// Get the dimensions of the volume (rows, columns, slices)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn pixel_type(&self) -> PixelType {
        self.data.pixel_type()
    }
}

/// Assemble a volume from the slices of `series_dir`, given in listing order.
///
/// The first slice of the listing is the reference: it fixes the shape, the
/// sample type and the spacing. Every other slice must match its rows, columns
/// and sample type.
///
/// # Errors
///
/// `EmptySeries` without slices, `MissingAttribute` when the reference lacks
/// PixelSpacing or SliceThickness (or InstanceNumber is needed and absent),
/// `InconsistentGeometry` / `InconsistentPixelType` naming the first
/// offending file.
pub fn assemble(series_dir: &Path, slices: &[Slice], order: SliceOrder) -> Result<Volume> {
    let reference = slices
        .first()
        .ok_or_else(|| ConvertError::EmptySeries(series_dir.to_path_buf()))?;
    let (rows, columns) = reference.pixels.dim();
    let pixel_type = reference.pixels.pixel_type();
    let spacing = reference_spacing(reference)?;

    for slice in slices {
        if slice.pixels.dim() != (rows, columns) {
            return Err(ConvertError::InconsistentGeometry {
                path: slice.path.clone(),
                rows: slice.rows(),
                columns: slice.columns(),
                expected_rows: rows,
                expected_columns: columns,
            });
        }
        if slice.pixels.pixel_type() != pixel_type {
            return Err(ConvertError::InconsistentPixelType {
                path: slice.path.clone(),
                found: slice.pixels.pixel_type().name(),
                expected: pixel_type.name(),
            });
        }
    }

    let placement = placement_order(slices, order)?;
    let mut data = VolumeData::zeros(pixel_type, (rows, columns, slices.len()));
    let mut sources = Vec::with_capacity(slices.len());
    for (depth, &slice_index) in placement.iter().enumerate() {
        let slice = &slices[slice_index];
        let placed = data.place(depth, &slice.pixels);
        debug_assert!(placed, "sample types are checked before placement");
        sources.push(slice.path.clone());
    }

    Ok(Volume {
        data,
        spacing,
        sources,
    })
}

fn reference_spacing(reference: &Slice) -> Result<Spacing> {
    let (row, column) =
        reference
            .metadata
            .pixel_spacing
            .ok_or_else(|| ConvertError::MissingAttribute {
                path: reference.path.clone(),
                attribute: "PixelSpacing",
            })?;
    let slice = reference
        .metadata
        .slice_thickness
        .ok_or_else(|| ConvertError::MissingAttribute {
            path: reference.path.clone(),
            attribute: "SliceThickness",
        })?;

    Ok(Spacing { row, column, slice })
}

/// Indices into `slices`, in depth order.
fn placement_order(slices: &[Slice], order: SliceOrder) -> Result<Vec<usize>> {
    match order {
        SliceOrder::Listing => Ok((0..slices.len()).collect()),
        SliceOrder::InstanceNumber => {
            let mut keyed = slices
                .iter()
                .enumerate()
                .map(|(idx, slice)| {
                    slice
                        .metadata
                        .instance_number
                        .map(|n| (n, idx))
                        .ok_or_else(|| ConvertError::MissingAttribute {
                            path: slice.path.clone(),
                            attribute: "InstanceNumber",
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            // Ties keep listing order.
            keyed.sort();
            Ok(keyed.into_iter().map(|(_, idx)| idx).collect())
        }
    }
}
