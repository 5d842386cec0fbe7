//! Bounded worker pool over a file list. One failing file never stops the
//! others; failures are collected into the `BatchReport`.
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::error::{Error, Result};
use crate::observer::{PipelineObserver, Stage, StageEvent};

/// A file that failed a stage, with the error category and message.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Files that completed, in input order.
    pub completed: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.completed.len()
    }

    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold a later stage's report into this one. Files that completed an
    /// earlier stage but failed this one move from `completed` to `failures`.
    pub fn merge(&mut self, later: BatchReport) {
        self.completed = later.completed;
        self.failures.extend(later.failures);
    }
}

/// Run `op` over `files` on at most `concurrency` threads.
///
/// Errors from `op` are reported to `observer` and recorded; the returned
/// `Result` only fails if the pool itself cannot be built.
pub fn run_batch<F>(
    stage: Stage,
    files: &[PathBuf],
    concurrency: usize,
    observer: &dyn PipelineObserver,
    op: F,
) -> Result<BatchReport>
where
    F: Fn(&Path) -> Result<()> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .map_err(|e| Error::Config(format!("cannot build worker pool: {}", e)))?;

    let outcomes: Vec<std::result::Result<PathBuf, BatchFailure>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                observer.on_event(&StageEvent::Started { stage, path });
                match op(path) {
                    Ok(()) => {
                        observer.on_event(&StageEvent::Completed { stage, path });
                        Ok(path.clone())
                    }
                    Err(error) => {
                        observer.on_event(&StageEvent::Failed {
                            stage,
                            path,
                            error: &error,
                        });
                        Err(BatchFailure {
                            path: path.clone(),
                            kind: error.kind(),
                            message: error.to_string(),
                        })
                    }
                }
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(path) => report.completed.push(path),
            Err(failure) => report.failures.push(failure),
        }
    }
    info!(
        "[{}] {} processed, {} failed",
        stage,
        report.processed(),
        report.errors()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{}.tif", i))).collect()
    }

    #[test]
    fn failure_does_not_stop_the_batch() {
        let observer = RecordingObserver::new();
        let report = run_batch(Stage::ToDb, &files(6), 3, &observer, |path| {
            if path == Path::new("f2.tif") {
                Err(Error::Domain { value: 0.0, count: 4 })
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(report.processed(), 5);
        assert_eq!(report.errors(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("f2.tif"));
        assert_eq!(report.failures[0].kind, "DomainError");
        assert!(!report.completed.contains(&PathBuf::from("f2.tif")));
        assert_eq!(observer.failures().len(), 1);
    }

    #[test]
    fn completed_keeps_input_order() {
        let observer = RecordingObserver::new();
        let input = files(20);
        let report = run_batch(Stage::Sort, &input, 4, &observer, |_| Ok(())).unwrap();
        assert_eq!(report.completed, input);
        assert!(report.is_success());
    }

    #[test]
    fn merge_moves_later_failures() {
        let mut first = BatchReport {
            completed: files(2),
            failures: vec![],
        };
        let second = BatchReport {
            completed: vec![PathBuf::from("f0.tif")],
            failures: vec![BatchFailure {
                path: PathBuf::from("f1.tif"),
                kind: "GeometryError",
                message: "x".into(),
            }],
        };
        first.merge(second);
        assert_eq!(first.completed, vec![PathBuf::from("f0.tif")]);
        assert_eq!(first.errors(), 1);
    }
}
