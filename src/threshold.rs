//
// threshold.rs
// dcm-convertor
//
// Binary thresholding of each slice at its own mean, written back out as a derived DICOM and a JPEG mask.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::Path;

use dicom::core::{dicom_value, DataElement, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{DefaultDicomObject, FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use dicom_dictionary_std::tags;
use ndarray::Array2;
use tracing::{debug, info};

use crate::batch::{self, BatchSummary, ErrorPolicy};
use crate::dicom_access::ElementAccess;
use crate::error::{ConvertError, Result};
use crate::jpeg::write_gray_jpeg;
use crate::series::{self, Series};
use crate::slice::{self, PixelData};
use crate::stats::{self, PixelStatistics};
use crate::storage::{derived_path, OutputKind, OutputLayout};

const SECONDARY_CAPTURE_SOP_CLASS: &str = "1.2.840.10008.5.1.4.1.1.7";

/// Attributes carried over from the source slice into the derived DICOM file.
const COPIED_TAGS: &[Tag] = &[
    tags::SOP_CLASS_UID,
    tags::SOP_INSTANCE_UID,
    tags::STUDY_DATE,
    tags::STUDY_TIME,
    tags::ACCESSION_NUMBER,
    tags::MODALITY,
    tags::STUDY_DESCRIPTION,
    tags::SERIES_DESCRIPTION,
    tags::PATIENT_NAME,
    tags::PATIENT_ID,
    tags::PATIENT_SEX,
    tags::SLICE_THICKNESS,
    tags::PROTOCOL_NAME,
    tags::SPACING_BETWEEN_SLICES,
    tags::STUDY_INSTANCE_UID,
    tags::SERIES_INSTANCE_UID,
    tags::STUDY_ID,
    tags::SERIES_NUMBER,
    tags::ACQUISITION_NUMBER,
    tags::INSTANCE_NUMBER,
    tags::IMAGE_POSITION_PATIENT,
    tags::IMAGE_ORIENTATION_PATIENT,
    tags::FRAME_OF_REFERENCE_UID,
    tags::SLICE_LOCATION,
    tags::ACQUISITION_TIME,
    tags::PIXEL_SPACING,
];

/// The two encodings of one slice's binary mask.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdedSlice {
    /// Statistics of the source slice; the cutoff is their mean.
    pub statistics: PixelStatistics,
    /// 1 above the cutoff, 0 elsewhere.
    pub dicom_mask: Array2<u16>,
    /// 255 above the cutoff, 0 elsewhere.
    pub jpeg_mask: Array2<u8>,
}

/// Thresholds `pixels` at their own arithmetic mean (strictly greater is high).
pub fn threshold(pixels: &PixelData) -> ThresholdedSlice {
    let statistics = stats::pixel_statistics(pixels);
    let above = pixels.to_f64().mapv(|v| v > statistics.mean);

    ThresholdedSlice {
        statistics,
        dicom_mask: above.mapv(u16::from),
        jpeg_mask: above.mapv(|high| if high { u8::MAX } else { 0 }),
    }
}

impl ThresholdedSlice {
    pub fn cutoff(&self) -> f64 {
        self.statistics.mean
    }

    /// Builds a fresh 16-bit MONOCHROME2 object from the mask and the identifying,
    /// study, series and geometry attributes of `source`.
    pub fn to_dicom(&self, source: &DefaultDicomObject, path: &Path) -> Result<DefaultDicomObject> {
        let (rows, columns) = self.dicom_mask.dim();
        let dimension = |value: usize| {
            u16::try_from(value).map_err(|_| ConvertError::DicomWrite {
                path: path.to_path_buf(),
                reason: format!("dimension {} does not fit in US", value),
            })
        };
        let rows = dimension(rows)?;
        let columns = dimension(columns)?;

        let mut obj = InMemDicomObject::new_empty_with_dict(StandardDataDictionary);
        for &tag in COPIED_TAGS {
            if let Ok(elem) = source.element(tag) {
                obj.put(elem.clone());
            }
        }

        obj.put(DataElement::new(
            tags::IMAGE_TYPE,
            VR::CS,
            dicom_value!(Strs, ["DERIVED", "SECONDARY"]),
        ));
        obj.put(DataElement::new(
            tags::SAMPLES_PER_PIXEL,
            VR::US,
            PrimitiveValue::from(1_u16),
        ));
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
        obj.put(DataElement::new(
            tags::COLUMNS,
            VR::US,
            PrimitiveValue::from(columns),
        ));
        obj.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(16_u16),
        ));
        obj.put(DataElement::new(
            tags::BITS_STORED,
            VR::US,
            PrimitiveValue::from(16_u16),
        ));
        obj.put(DataElement::new(
            tags::HIGH_BIT,
            VR::US,
            PrimitiveValue::from(15_u16),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));

        let pixel_bytes: Vec<u8> = self
            .dicom_mask
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::from(pixel_bytes),
        ));

        let sop_class_uid = source
            .element_str(tags::SOP_CLASS_UID)
            .unwrap_or_else(|| SECONDARY_CAPTURE_SOP_CLASS.to_string());
        let sop_instance_uid = source.element_str(tags::SOP_INSTANCE_UID).unwrap_or_else(|| {
            source
                .meta()
                .media_storage_sop_instance_uid
                .trim_end_matches('\0')
                .to_string()
        });

        let file_meta = FileMetaTableBuilder::new()
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
            .media_storage_sop_class_uid(sop_class_uid)
            .media_storage_sop_instance_uid(sop_instance_uid)
            .build()
            .map_err(|e| ConvertError::DicomWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut file_obj =
            FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, file_meta);
        for elem in obj {
            file_obj.put(elem);
        }
        Ok(file_obj)
    }
}

/// Thresholds every series under `dcm_dir` into `threshold_dicom/` and `threshold_jpeg/`.
pub fn binary_threshold(
    dcm_dir: &Path,
    layout: &OutputLayout,
    policy: ErrorPolicy,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for series in series::list_series(dcm_dir)? {
        info!("Binary thresholding for series {}", series.name);
        let result = export_series(&series, layout, policy);
        summary.record_series(policy, &series.name, result)?;
    }
    Ok(summary)
}

pub fn export_series(
    series: &Series,
    layout: &OutputLayout,
    policy: ErrorPolicy,
) -> Result<BatchSummary> {
    let dicom_series = layout.ensure_series_dir(OutputKind::ThresholdDicom, &series.name)?;
    let jpeg_series = layout.ensure_series_dir(OutputKind::ThresholdJpeg, &series.name)?;

    batch::for_each_slice(&series.path, policy, |path| {
        export_slice(path, &dicom_series, &jpeg_series)
    })
}

fn export_slice(path: &Path, dicom_series: &Path, jpeg_series: &Path) -> Result<()> {
    let (source, slice) = slice::open_slice(path)?;
    let mask = threshold(&slice.pixels);
    debug!(
        "{}: cutoff {:.3} over {} pixels in [{}, {}]",
        slice.file_name(),
        mask.cutoff(),
        mask.statistics.total_pixels,
        mask.statistics.min,
        mask.statistics.max
    );

    let dicom_file = dicom_series.join(slice.file_name());
    info!(
        "\t Writing dcm threshold volumes for file {} to {}",
        slice.file_name(),
        dicom_file.display()
    );
    mask.to_dicom(&source, &dicom_file)?
        .write_to_file(&dicom_file)
        .map_err(|e| ConvertError::DicomWrite {
            path: dicom_file.clone(),
            reason: e.to_string(),
        })?;

    let jpeg_file = derived_path(jpeg_series, path, "jpg");
    info!(
        "\t Writing jpeg threshold volumes for file {} to {}",
        slice.file_name(),
        jpeg_file.display()
    );
    let (rows, columns) = mask.jpeg_mask.dim();
    let samples: Vec<u8> = mask.jpeg_mask.iter().copied().collect();
    write_gray_jpeg(&jpeg_file, rows, columns, &samples)
}
