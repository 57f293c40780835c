use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use crate::batch::{BatchSummary, ErrorPolicy};
use crate::error::Result;
use crate::series::{self, Series};
use crate::slice;
use crate::volume::{self, SliceOrder, Volume};

/// A series reconstructed in memory.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: Series,
    pub volume: Volume,
    pub elapsed: Duration,
}

/// Reads all slices of `series` and stacks them into a volume.
pub fn load_series(series: &Series, order: SliceOrder) -> Result<Volume> {
    let slices = slice::read_series(&series.path)?;
    volume::assemble(&series.path, &slices, order)
}

/// Loads every series under `dcm_dir`; under `Skip` a series that fails to load is left out.
pub fn load_dicom(
    dcm_dir: &Path,
    order: SliceOrder,
    policy: ErrorPolicy,
) -> Result<(Vec<LoadedSeries>, BatchSummary)> {
    let mut summary = BatchSummary::default();
    let mut loaded = Vec::new();

    for series in series::list_series(dcm_dir)? {
        info!("Loading series {}", series.name);
        let started = Instant::now();
        let result = load_series(&series, order);
        if let Some(volume) = summary.record(policy, &series.name, result)? {
            let elapsed = started.elapsed();
            let (rows, columns, slices) = volume.dim();
            info!(
                "\t {}x{}x{} {} voxels, spacing {:.3}x{:.3}x{:.3} mm, {:?}",
                rows,
                columns,
                slices,
                volume.pixel_type().name(),
                volume.spacing.row,
                volume.spacing.column,
                volume.spacing.slice,
                elapsed
            );
            loaded.push(LoadedSeries {
                series,
                volume,
                elapsed,
            });
        }
    }

    Ok((loaded, summary))
}
