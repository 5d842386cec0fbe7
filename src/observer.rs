//! Progress reporting for pipeline stages. Stages never log per-file outcomes
//! themselves; they report to an injected `PipelineObserver`.
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::error::Error;

const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Reproject,
    Clip,
    Align,
    ToLinear,
    ToDb,
    Extract,
    Sort,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reproject => "reproject",
            Stage::Clip => "clip",
            Stage::Align => "align",
            Stage::ToLinear => "to-linear",
            Stage::ToDb => "to-db",
            Stage::Extract => "extract",
            Stage::Sort => "sort",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum StageEvent<'a> {
    Started { stage: Stage, path: &'a Path },
    Completed { stage: Stage, path: &'a Path },
    Failed { stage: Stage, path: &'a Path, error: &'a Error },
}

impl StageEvent<'_> {
    pub fn stage(&self) -> Stage {
        match self {
            StageEvent::Started { stage, .. }
            | StageEvent::Completed { stage, .. }
            | StageEvent::Failed { stage, .. } => *stage,
        }
    }
}

/// Receives stage events; called concurrently from batch workers.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &StageEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &StageEvent<'_>) {
        match event {
            StageEvent::Started { stage, path } => info!("[{}] processing {:?}", stage, path),
            StageEvent::Completed { stage, path } => info!("[{}] done {:?}", stage, path),
            StageEvent::Failed { stage, path, error } => {
                warn!("[{}] {:?} failed ({}): {}", stage, path, error.kind(), error)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: tracing::Level,
    pub timestamp: String,
    pub stage: Stage,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: tracing::Level, stage: Stage, message: String) -> Self {
        let timestamp = chrono::Utc::now().format("%H:%M:%S").to_string();
        Self {
            level,
            timestamp,
            stage,
            message,
        }
    }
}

/// Keeps the most recent events in memory, e.g. for tests or a status view.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Entries recorded for failed files.
    pub fn failures(&self) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == tracing::Level::WARN)
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &StageEvent<'_>) {
        let (level, message) = match event {
            StageEvent::Started { path, .. } => (tracing::Level::DEBUG, format!("started {}", path.display())),
            StageEvent::Completed { path, .. } => (tracing::Level::INFO, format!("completed {}", path.display())),
            StageEvent::Failed { path, error, .. } => (
                tracing::Level::WARN,
                format!("{} failed: {}: {}", path.display(), error.kind(), error),
            ),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry::new(level, event.stage(), message));
            if entries.len() > MAX_ENTRIES {
                let excess = entries.len() - MAX_ENTRIES;
                entries.drain(0..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_failures() {
        let observer = RecordingObserver::new();
        let path = Path::new("a.tif");
        let error = Error::Geometry("empty".into());
        observer.on_event(&StageEvent::Started { stage: Stage::Clip, path });
        observer.on_event(&StageEvent::Failed { stage: Stage::Clip, path, error: &error });

        assert_eq!(observer.entries().len(), 2);
        let failures = observer.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Clip);
        assert!(failures[0].message.contains("GeometryError"));
    }

    #[test]
    fn recording_buffer_is_bounded() {
        let observer = RecordingObserver::new();
        let path = Path::new("a.tif");
        for _ in 0..(MAX_ENTRIES + 10) {
            observer.on_event(&StageEvent::Completed { stage: Stage::Sort, path });
        }
        assert_eq!(observer.entries().len(), MAX_ENTRIES);
    }
}
