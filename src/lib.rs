//
// lib.rs
// dcm-convertor
//
// Exposes the crate's modules and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - October 2026

// Public surface of the library: one module per component, plus shared utilities.
pub mod batch;
pub mod cli;
pub mod dicom_access;
pub mod error;
pub mod jpeg;
pub mod load;
pub mod logging;
pub mod nifti;
pub mod series;
pub mod slice;
pub mod stats;
pub mod storage;
pub mod threshold;
pub mod volume;

pub use cli::{execute, run as run_cli, Cli};
pub use error::{ConvertError, Result};
pub use volume::{SliceOrder, Spacing, Volume, VolumeData};
