//
// nifti.rs
// dcm-convertor
//
// Delegates DICOM to NIfTI conversion to dcm2niix, one invocation per series, with a timeout and exit-code checks.
//
// Thales Matheus Mendonça Santos - October 2026

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::batch::{BatchSummary, ErrorPolicy};
use crate::error::{ConvertError, Result};
use crate::series::{self, Series};
use crate::storage::{OutputKind, OutputLayout};

/// Protocol name, acquisition time, series number.
pub const DEFAULT_PATTERN: &str = "%p_%t_%s";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct NiftiOptions {
    /// dcm2niix executable, looked up on PATH unless absolute.
    pub program: String,
    /// Output file name pattern (`-f`).
    pub pattern: String,
    pub timeout: Duration,
}

impl Default for NiftiOptions {
    fn default() -> Self {
        Self {
            program: "dcm2niix".to_string(),
            pattern: DEFAULT_PATTERN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything a finished external process reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// An external program run to completion with captured output and a deadline.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Runs the program; the child is killed if the deadline passes.
    pub async fn run(&self) -> Result<CommandOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ConvertError::ExternalToolTimeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| ConvertError::ExternalToolSpawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`run`](Self::run), but a non-zero exit becomes `ExternalToolFailed`.
    pub async fn run_checked(&self) -> Result<CommandOutput> {
        let output = self.run().await?;
        if !output.success() {
            let stderr = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            return Err(ConvertError::ExternalToolFailed {
                program: self.program.clone(),
                code: output.code,
                stderr,
            });
        }
        Ok(output)
    }
}

/// `dcm2niix -z y -f <pattern> -o <out_dir> <in_dir>`
pub fn dcm2niix_command(
    options: &NiftiOptions,
    in_dir: &Path,
    out_dir: &Path,
) -> ExternalCommand {
    ExternalCommand::new(&options.program, options.timeout)
        .arg("-z")
        .arg("y")
        .arg("-f")
        .arg(&options.pattern)
        .arg("-o")
        .arg(out_dir)
        .arg(in_dir)
}

/// Converts every series under `dcm_dir` into `<output>/nifti/<series>/`, one after the other.
pub async fn dcm2nifti(
    dcm_dir: &Path,
    layout: &OutputLayout,
    options: &NiftiOptions,
    policy: ErrorPolicy,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for series in series::list_series(dcm_dir)? {
        let result = export_series(&series, layout, options).await;
        summary.record(policy, &series.name, result)?;
    }
    Ok(summary)
}

pub async fn export_series(
    series: &Series,
    layout: &OutputLayout,
    options: &NiftiOptions,
) -> Result<CommandOutput> {
    let nii_series = layout.ensure_series_dir(OutputKind::Nifti, &series.name)?;
    info!(
        "Converting {} series as nii images and saved to {}",
        series.name,
        nii_series.display()
    );

    let output = dcm2niix_command(options, &series.path, &nii_series)
        .run_checked()
        .await?;
    info!("{} stdout: {}", options.program, output.stdout.trim_end());
    if !output.stderr.is_empty() {
        debug!("{} stderr: {}", options.program, output.stderr.trim_end());
    }
    Ok(output)
}
