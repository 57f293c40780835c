//
// cli.rs
// dcm-convertor
//
// Defines the CLI surface with Clap and runs the selected conversions over the input directory in a fixed order.
//
// Thales Matheus Mendonça Santos - October 2026

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::warn;

use crate::batch::{BatchSummary, ErrorPolicy};
use crate::nifti::{self, NiftiOptions};
use crate::storage::OutputLayout;
use crate::volume::SliceOrder;
use crate::{jpeg, load, logging, threshold};

const DESCRIPTION: &str = "\
Takes in a DICOM folder with DICOM series
    (e.g. dicom/37978.000000-T2reg-73187/)
Performs the following operations:
    1.  write the data out as jpeg images
    2.  write DICOM series out in nifti format (through dcm2niix)
    3.  binary thresholding of each slice at its mean, written as DICOM and jpeg
    4.  load DICOM series into memory as volumes

Examples:
    dcm-convertor -d DICOM_DIR --dcm2jpg
    dcm-convertor -d DICOM_DIR --dcm2nifti
    dcm-convertor -d DICOM_DIR -t
    dcm-convertor -d DICOM_DIR -l";

const NO_OPERATION: &str = "choose at least one operation. Arguments required: \
--dcm2jpg, --dcm2nifti, --b_threshold / -t, or --load / -l";

/// Command-line interface glue code: input directory, operations and their knobs.
#[derive(Parser, Debug)]
#[command(name = "dcm-convertor")]
#[command(about = "Convert folders of DICOM series to JPEG, NIfTI and thresholded masks")]
#[command(long_about = DESCRIPTION)]
pub struct Cli {
    /// Input dir with dicom series (one subdirectory per series)
    #[arg(short = 'd', long = "dcmdir", value_name = "DIR")]
    pub dcmdir: PathBuf,

    /// Convert from dcm to jpg
    #[arg(long = "dcm2jpg")]
    pub dcm2jpg: bool,

    /// Convert from dcm to nifti with dcm2niix
    #[arg(long = "dcm2nifti")]
    pub dcm2nifti: bool,

    /// Binary threshold every slice at its mean intensity
    #[arg(short = 't', long = "b_threshold")]
    pub b_threshold: bool,

    /// Load every series as a volume
    #[arg(short = 'l', long = "load")]
    pub load: bool,

    /// Root of the jpeg/, nifti/, threshold_dicom/ and threshold_jpeg/ trees
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Key used to place slices along the volume's third axis
    #[arg(long, value_enum, default_value_t = Order::Listing)]
    pub order: Order,

    /// Abort on the first failure, or log it and continue
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    pub on_error: OnError,

    /// dcm2niix executable
    #[arg(long, value_name = "PATH", default_value = "dcm2niix")]
    pub dcm2niix: String,

    /// dcm2niix output file name pattern
    #[arg(long, default_value = nifti::DEFAULT_PATTERN)]
    pub nifti_pattern: String,

    /// Seconds before a dcm2niix run is killed
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub nifti_timeout: u64,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Order {
    Listing,
    InstanceNumber,
}

impl From<Order> for SliceOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::Listing => SliceOrder::Listing,
            Order::InstanceNumber => SliceOrder::InstanceNumber,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OnError {
    Abort,
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::Abort,
            OnError::Skip => ErrorPolicy::Skip,
        }
    }
}

/// The operations, in the order they run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Jpeg,
    Nifti,
    Threshold,
    Load,
}

/// Everything an operation needs, resolved from the flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dcm_dir: PathBuf,
    pub layout: OutputLayout,
    pub order: SliceOrder,
    pub policy: ErrorPolicy,
    pub nifti: NiftiOptions,
}

impl Cli {
    pub fn operations(&self) -> Vec<Operation> {
        [
            (self.dcm2jpg, Operation::Jpeg),
            (self.dcm2nifti, Operation::Nifti),
            (self.b_threshold, Operation::Threshold),
            (self.load, Operation::Load),
        ]
        .into_iter()
        .filter_map(|(selected, op)| selected.then_some(op))
        .collect()
    }

    pub fn config(&self) -> RunConfig {
        RunConfig {
            dcm_dir: self.dcmdir.clone(),
            layout: OutputLayout::new(&self.output_dir),
            order: self.order.into(),
            policy: self.on_error.into(),
            nifti: NiftiOptions {
                program: self.dcm2niix.clone(),
                pattern: self.nifti_pattern.clone(),
                timeout: Duration::from_secs(self.nifti_timeout),
            },
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    // Parse the raw CLI arguments once, then hand over to the dispatcher.
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);
    execute(&cli).await
}

/// Runs the selected operations one after the other; nothing is written when none is selected.
pub async fn execute(cli: &Cli) -> anyhow::Result<()> {
    banner("dcm-convertor: STARTING");
    let operations = cli.operations();
    if operations.is_empty() {
        bail!(NO_OPERATION);
    }

    let config = cli.config();
    for operation in operations {
        let summary = match operation {
            Operation::Jpeg => {
                banner("dcm-convertor: DICOM TO JPEG");
                let summary = jpeg::dcm2jpg(&config.dcm_dir, &config.layout, config.policy)
                    .context("DICOM to JPEG conversion failed")?;
                banner("dcm-convertor: FINISHED DICOM TO JPEG");
                summary
            }
            Operation::Nifti => {
                banner("dcm-convertor: DICOM TO NIFTI");
                let summary = nifti::dcm2nifti(
                    &config.dcm_dir,
                    &config.layout,
                    &config.nifti,
                    config.policy,
                )
                .await
                .context("DICOM to NIfTI conversion failed")?;
                banner("dcm-convertor: FINISHED DICOM TO NIFTI");
                summary
            }
            Operation::Threshold => {
                banner("dcm-convertor: BINARY THRESHOLDING");
                let summary =
                    threshold::binary_threshold(&config.dcm_dir, &config.layout, config.policy)
                        .context("Binary thresholding failed")?;
                banner("dcm-convertor: FINISHED BINARY THRESHOLDING");
                summary
            }
            Operation::Load => {
                banner("dcm-convertor: LOADING DCM");
                let (volumes, summary) =
                    load::load_dicom(&config.dcm_dir, config.order, config.policy)
                        .context("Loading DICOM series failed")?;
                println!("Loaded {} volume(s).", volumes.len());
                banner("dcm-convertor: FINISHED LOADING DCM");
                summary
            }
        };
        report_skipped(operation, &summary);
    }

    banner("dcm-convertor: DONE");
    Ok(())
}

fn report_skipped(operation: Operation, summary: &BatchSummary) {
    if summary.skipped.is_empty() {
        return;
    }
    warn!(
        "{:?}: {} item(s) skipped, {} succeeded",
        operation,
        summary.skipped.len(),
        summary.succeeded
    );
    for (item, reason) in &summary.skipped {
        warn!("  {}: {}", item, reason);
    }
}

fn banner(title: &str) {
    let line = "*".repeat(title.len() + 8);
    println!("{}\n*** {} ***\n{}\n", line, title, line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_keep_the_fixed_order() {
        let cli = Cli::try_parse_from(["dcm-convertor", "-d", "dicom", "-l", "-t", "--dcm2jpg"])
            .expect("parse");
        assert_eq!(
            cli.operations(),
            [Operation::Jpeg, Operation::Threshold, Operation::Load]
        );
    }

    #[test]
    fn dcmdir_is_required() {
        assert!(Cli::try_parse_from(["dcm-convertor", "--dcm2jpg"]).is_err());
    }

    #[test]
    fn defaults_resolve_into_a_run_config() {
        let cli = Cli::try_parse_from(["dcm-convertor", "--dcmdir", "dicom", "--dcm2nifti"])
            .expect("parse");
        let config = cli.config();

        assert_eq!(config.dcm_dir, PathBuf::from("dicom"));
        assert_eq!(config.layout.root(), std::path::Path::new("."));
        assert_eq!(config.order, SliceOrder::Listing);
        assert_eq!(config.policy, ErrorPolicy::Abort);
        assert_eq!(config.nifti.program, "dcm2niix");
        assert_eq!(config.nifti.pattern, "%p_%t_%s");
        assert_eq!(config.nifti.timeout, Duration::from_secs(600));
    }

    #[test]
    fn knobs_are_parsed() {
        let cli = Cli::try_parse_from([
            "dcm-convertor",
            "-d",
            "dicom",
            "-l",
            "--order",
            "instance-number",
            "--on-error",
            "skip",
            "--nifti-timeout",
            "5",
            "-o",
            "out",
        ])
        .expect("parse");
        let config = cli.config();

        assert_eq!(config.order, SliceOrder::InstanceNumber);
        assert_eq!(config.policy, ErrorPolicy::Skip);
        assert_eq!(config.nifti.timeout, Duration::from_secs(5));
        assert_eq!(config.layout.root(), std::path::Path::new("out"));
    }
}
