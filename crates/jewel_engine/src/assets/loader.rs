//! Background asset loading
//!
//! A [`LoadTask`] runs an [`AssetLoader`] on a worker thread. Progress and the
//! final scene graph come back over crossbeam channels, and the owner polls
//! the task once per frame so all scene mutation stays on its own thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use thiserror::Error;

use crate::foundation::time::Stopwatch;
use crate::scene::SceneGraph;

/// Progress reports buffered while the owner is not polling
const PROGRESS_CAPACITY: usize = 16;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed asset contents
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed input that is not a usable asset
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The load was cancelled before it finished
    #[error("Load cancelled")]
    Cancelled,

    /// The worker thread died without reporting a result
    #[error("Loader worker for '{0}' panicked")]
    WorkerPanicked(String),
}

/// Where an asset comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// File on disk
    Path(PathBuf),
    /// Bytes already in memory (downloads, embedded assets, tests)
    Memory {
        /// Display name
        name: String,
        /// Raw file contents
        bytes: Vec<u8>,
    },
}

impl AssetSource {
    /// Source reading the file at `path`
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Source over in-memory bytes
    pub fn memory(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Human readable name, the file stem for paths
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned()),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// Read the full contents
    pub fn read_bytes(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::Path(path) => Ok(std::fs::read(path)?),
            Self::Memory { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Bytes processed so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Bytes processed
    pub loaded: u64,
    /// Total bytes, when known
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Percentage complete, `None` when the total is unknown or zero
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f32 / total as f32 * 100.0),
            _ => None,
        }
    }
}

/// Loader side of the progress channel
///
/// A disabled sink swallows reports, which is what synchronous callers use.
/// The channel is bounded: when it is full the oldest report is dropped.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    channel: Option<(Sender<LoadProgress>, Receiver<LoadProgress>)>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressSink {
    /// Sink that reports nowhere and is never cancelled
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Report progress without blocking the loader
    pub fn report(&self, loaded: u64, total: Option<u64>) {
        let Some((sender, overflow)) = &self.channel else {
            return;
        };
        if let Err(TrySendError::Full(progress)) = sender.try_send(LoadProgress { loaded, total }) {
            let _ = overflow.try_recv();
            let _ = sender.try_send(progress);
        }
    }

    /// Whether the owner asked the load to stop
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`LoadError::Cancelled`] when cancellation was requested
    pub fn check_cancelled(&self) -> Result<(), LoadError> {
        if self.is_cancelled() {
            Err(LoadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Turns an [`AssetSource`] into a scene graph
pub trait AssetLoader: Send + 'static {
    /// Load the asset, reporting progress through `progress`
    fn load(&mut self, source: &AssetSource, progress: &ProgressSink) -> Result<SceneGraph, LoadError>;
}

impl<F> AssetLoader for F
where
    F: FnMut(&AssetSource, &ProgressSink) -> Result<SceneGraph, LoadError> + Send + 'static,
{
    fn load(&mut self, source: &AssetSource, progress: &ProgressSink) -> Result<SceneGraph, LoadError> {
        self(source, progress)
    }
}

/// An asset load running on a worker thread
#[derive(Debug)]
pub struct LoadTask {
    name: String,
    progress_rx: Receiver<LoadProgress>,
    result_rx: Receiver<Result<SceneGraph, LoadError>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    latest: Option<LoadProgress>,
    stopwatch: Stopwatch,
    finished: bool,
}

impl LoadTask {
    /// Start loading `source` with `loader` on a new thread
    pub fn spawn<L: AssetLoader>(mut loader: L, source: AssetSource) -> Result<Self, LoadError> {
        let name = source.name();
        let (progress_tx, progress_rx) = bounded(PROGRESS_CAPACITY);
        let (result_tx, result_rx) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let sink = ProgressSink {
            channel: Some((progress_tx, progress_rx.clone())),
            cancelled: cancelled.clone(),
        };

        let worker = thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                let result = loader.load(&source, &sink);
                let _ = result_tx.send(result);
            })?;

        log::info!("Loading asset '{}'", name);
        Ok(Self {
            name,
            progress_rx,
            result_rx,
            cancelled,
            worker: Some(worker),
            latest: None,
            stopwatch: Stopwatch::start_new(),
            finished: false,
        })
    }

    /// Display name of the asset being loaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Most recent progress report seen by [`Self::poll`]
    pub fn latest_progress(&self) -> Option<LoadProgress> {
        self.latest
    }

    /// Whether the terminal result has already been handed out
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ask the loader to stop at its next cancellation check
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Drain progress and check for the result without blocking
    ///
    /// Returns `Some` exactly once, when the worker has finished.
    pub fn poll(&mut self) -> Option<Result<SceneGraph, LoadError>> {
        if self.finished {
            return None;
        }
        self.drain_progress();

        let result = match self.result_rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(LoadError::WorkerPanicked(self.name.clone())),
        };
        // Reports sent just before the result
        self.drain_progress();
        Some(self.finish(result))
    }

    /// Block until the worker finishes
    pub fn wait(mut self) -> Result<SceneGraph, LoadError> {
        if self.finished {
            return Err(LoadError::InvalidFormat(format!("result of '{}' was already taken", self.name)));
        }
        let result = self
            .result_rx
            .recv()
            .unwrap_or_else(|_| Err(LoadError::WorkerPanicked(self.name.clone())));
        self.drain_progress();
        self.finish(result)
    }

    fn drain_progress(&mut self) {
        for progress in self.progress_rx.try_iter() {
            match progress.percent() {
                Some(percent) => log::info!("{:.0}% loaded", percent),
                None => log::info!("{} bytes loaded", progress.loaded),
            }
            self.latest = Some(progress);
        }
    }

    fn finish(&mut self, result: Result<SceneGraph, LoadError>) -> Result<SceneGraph, LoadError> {
        self.finished = true;
        self.stopwatch.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        match &result {
            Ok(graph) => log::info!(
                "Loaded '{}' in {:.1} ms ({} nodes, {} meshes)",
                self.name,
                self.stopwatch.elapsed_millis(),
                graph.len(),
                graph.mesh_count()
            ),
            Err(e) => log::error!("Failed to load '{}': {}", self.name, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use std::time::Duration;

    fn poll_until_done(task: &mut LoadTask) -> Result<SceneGraph, LoadError> {
        for _ in 0..2000 {
            if let Some(result) = task.poll() {
                return result;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("load task did not finish");
    }

    #[test]
    fn test_percent() {
        assert_eq!(LoadProgress { loaded: 50, total: Some(200) }.percent(), Some(25.0));
        assert_eq!(LoadProgress { loaded: 50, total: None }.percent(), None);
        assert_eq!(LoadProgress { loaded: 0, total: Some(0) }.percent(), None);
    }

    #[test]
    fn test_source_names() {
        assert_eq!(AssetSource::path("models/ring.obj").name(), "ring");
        assert_eq!(AssetSource::memory("pendant", b"".to_vec()).name(), "pendant");
    }

    #[test]
    fn test_task_delivers_progress_and_result() {
        let loader = |source: &AssetSource, progress: &ProgressSink| -> Result<SceneGraph, LoadError> {
            let bytes = source.read_bytes()?;
            let total = bytes.len() as u64;
            progress.report(total / 2, Some(total));
            progress.report(total, Some(total));
            let mut graph = SceneGraph::new();
            graph.add_root(Node::group(source.name()));
            Ok(graph)
        };

        let mut task = LoadTask::spawn(loader, AssetSource::memory("ring", vec![0u8; 10])).unwrap();
        let graph = poll_until_done(&mut task).unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(task.latest_progress(), Some(LoadProgress { loaded: 10, total: Some(10) }));
        assert!(task.is_finished());
        assert!(task.poll().is_none());
    }

    #[test]
    fn test_unpolled_progress_stays_bounded_and_keeps_latest() {
        let (done_tx, done_rx) = crossbeam::channel::bounded(1);
        let loader = move |_: &AssetSource, progress: &ProgressSink| -> Result<SceneGraph, LoadError> {
            for loaded in 1..=1000 {
                progress.report(loaded, Some(1000));
            }
            let _ = done_tx.send(());
            Ok(SceneGraph::new())
        };

        let mut task = LoadTask::spawn(loader, AssetSource::memory("chatty", Vec::new())).unwrap();
        done_rx.recv().unwrap();
        assert!(task.progress_rx.len() <= PROGRESS_CAPACITY);

        assert_eq!(poll_until_done(&mut task).unwrap().len(), 0);
        assert_eq!(task.latest_progress(), Some(LoadProgress { loaded: 1000, total: Some(1000) }));
    }

    #[test]
    fn test_loader_error_is_reported() {
        let loader =
            |_: &AssetSource, _: &ProgressSink| -> Result<SceneGraph, LoadError> { Err(LoadError::Parse("bad header".to_string())) };
        let task = LoadTask::spawn(loader, AssetSource::memory("broken", Vec::new())).unwrap();
        assert!(matches!(task.wait(), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let loader = |_: &AssetSource, _: &ProgressSink| -> Result<SceneGraph, LoadError> { panic!("decoder bug") };
        let mut task = LoadTask::spawn(loader, AssetSource::memory("crash", Vec::new())).unwrap();
        assert!(matches!(poll_until_done(&mut task), Err(LoadError::WorkerPanicked(_))));
    }

    #[test]
    fn test_cancel_reaches_loader() {
        let loader = |_: &AssetSource, progress: &ProgressSink| -> Result<SceneGraph, LoadError> {
            loop {
                progress.check_cancelled()?;
                thread::sleep(Duration::from_millis(1));
            }
        };
        let task = LoadTask::spawn(loader, AssetSource::memory("slow", Vec::new())).unwrap();
        task.cancel();
        assert!(matches!(task.wait(), Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = AssetSource::path("/definitely/not/here.obj");
        assert!(matches!(source.read_bytes(), Err(LoadError::Io(_))));
    }
}
