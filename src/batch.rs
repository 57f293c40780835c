use std::path::Path;

use tracing::warn;

use crate::error::{ConvertError, Result};
use crate::slice;

/// What to do when a slice or a series fails.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run on the first error.
    #[default]
    Abort,
    /// Log the failure and continue with the next slice or series.
    Skip,
}

/// Outcome counters for one operation over the input root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// (item name, error message) for every skipped failure.
    pub skipped: Vec<(String, String)>,
}

impl BatchSummary {
    /// Accounts for one item's outcome, handing the error back under `Abort`.
    pub fn record<T>(
        &mut self,
        policy: ErrorPolicy,
        item: &str,
        result: Result<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => {
                self.succeeded += 1;
                Ok(Some(value))
            }
            Err(err) if policy == ErrorPolicy::Skip && !is_fatal(&err) => {
                warn!("Skipping {}: {}", item, err);
                self.skipped.push((item.to_string(), err.to_string()));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Folds in the per-slice outcome of one series, or counts the series itself as failed.
    ///
    /// `succeeded` and `skipped` stay in slice units for series that were walked.
    pub fn record_series(
        &mut self,
        policy: ErrorPolicy,
        series: &str,
        result: Result<BatchSummary>,
    ) -> Result<()> {
        match result {
            Ok(inner) => {
                self.succeeded += inner.succeeded;
                self.skipped.extend(inner.skipped);
                Ok(())
            }
            Err(err) => self.record::<()>(policy, series, Err(err)).map(|_| ()),
        }
    }
}

fn is_fatal(err: &ConvertError) -> bool {
    matches!(err, ConvertError::DirectoryNotFound(_))
}

/// Runs `per_slice` over every `.dcm` file of `series_dir` in listing order.
///
/// Under `Skip`, only failures local to one slice file are stepped over; anything
/// else (for example a failed output write) still aborts the series.
pub fn for_each_slice<F>(
    series_dir: &Path,
    policy: ErrorPolicy,
    mut per_slice: F,
) -> Result<BatchSummary>
where
    F: FnMut(&Path) -> Result<()>,
{
    let mut summary = BatchSummary::default();
    for path in slice::list_slice_files(series_dir)? {
        let name = path.display().to_string();
        match per_slice(&path) {
            Err(err) if !err.is_slice_local() => return Err(err),
            result => {
                summary.record(policy, &name, result)?;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn read_failure(path: &Path) -> ConvertError {
        ConvertError::slice_read(path, "bad preamble")
    }

    #[test]
    fn abort_returns_the_first_error() {
        let mut summary = BatchSummary::default();
        let result: Result<Option<()>> = summary.record(
            ErrorPolicy::Abort,
            "a.dcm",
            Err(read_failure(Path::new("a.dcm"))),
        );
        assert!(result.is_err());
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn skip_keeps_going_but_not_for_missing_directories() {
        let mut summary = BatchSummary::default();
        let failure = Err(read_failure(Path::new("a.dcm")));
        let skipped = summary
            .record::<()>(ErrorPolicy::Skip, "a.dcm", failure)
            .expect("skipped");
        assert!(skipped.is_none());
        assert_eq!(summary.skipped.len(), 1);

        let fatal = summary.record::<()>(
            ErrorPolicy::Skip,
            "root",
            Err(ConvertError::DirectoryNotFound(PathBuf::from("root"))),
        );
        assert!(fatal.is_err());
    }

    #[test]
    fn slice_loop_skips_unreadable_files() {
        let dir = tempdir().expect("tmpdir");
        for name in ["a.dcm", "b.dcm", "c.dcm"] {
            fs::write(dir.path().join(name), b"").expect("write");
        }

        let mut seen = Vec::new();
        let summary = for_each_slice(dir.path(), ErrorPolicy::Skip, |path| {
            seen.push(path.file_name().unwrap().to_owned());
            if path.ends_with("b.dcm") {
                Err(read_failure(path))
            } else {
                Ok(())
            }
        })
        .expect("loop");

        assert_eq!(seen.len(), 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped.len(), 1);
    }

    #[test]
    fn slice_loop_never_skips_write_failures() {
        let dir = tempdir().expect("tmpdir");
        fs::write(dir.path().join("a.dcm"), b"").expect("write");

        let result = for_each_slice(dir.path(), ErrorPolicy::Skip, |_| {
            Err(ConvertError::Io(std::io::Error::other("disk full")))
        });
        assert!(matches!(result, Err(ConvertError::Io(_))));
    }

    #[test]
    fn series_outcomes_are_counted_in_slices() {
        let mut summary = BatchSummary::default();
        let walked = BatchSummary {
            succeeded: 3,
            skipped: vec![("z.dcm".to_string(), "bad preamble".to_string())],
        };
        summary
            .record_series(ErrorPolicy::Skip, "A", Ok(walked))
            .expect("walked series");
        summary
            .record_series(
                ErrorPolicy::Skip,
                "B",
                Err(ConvertError::EmptySeries(PathBuf::from("B"))),
            )
            .expect("failed series is skipped");

        assert_eq!(summary.succeeded, 3);
        let names: Vec<_> = summary.skipped.iter().map(|(item, _)| item.as_str()).collect();
        assert_eq!(names, ["z.dcm", "B"]);
    }
}
