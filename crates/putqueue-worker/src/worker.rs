//! Upload worker - drains the upload queue one file at a time
//!
//! The [`UploadWorker`] pulls a snapshot of the queue from its owner, launches
//! the upload program for each entry through an [`IProcessRunner`], and
//! removes entries from the live queue as they complete.
//!
//! ## State Machine
//!
//! ```text
//! Validating ──invalid──→ Finished(InvalidDestination)
//!     │
//!     ▼
//! Draining ──empty──→ Finished(Done)
//!     │  └─stop requested──→ Finished(Paused)
//!     ▼
//! PerFile ──exit 0 / unresolved──→ PerFile (next entry)
//!     │  └─exhausted──→ Draining
//!     └─non-zero exit──→ Finished(Aborted)
//! ```
//!
//! Launch and wait failures leave the machine through `Err`.
//!
//! ## Cancellation
//!
//! [`UploadWorker::stop`] only sets a flag. It is honoured at the top of
//! each outer pass (and between files when `stop_between_files` is set). An
//! upload that is already running always finishes first.
//!
//! ## Failure Policy
//!
//! A non-zero exit aborts the whole run. The failed entry and all entries
//! after it stay queued, so the next run resumes from the same point.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use putqueue_core::config::Config;
use putqueue_core::domain::{
    AggregateCounters, CounterSnapshot, Credentials, HostPort, ProcessExit, QueuedFile,
    RunOutcome, RunState, StopHandle, StreamKind, UploadError, UploadStatus,
};
use putqueue_core::ports::{
    ChildStream, ILogSink, IProcessRunner, IStatusSink, IUploadQueue, LaunchRequest,
};

use crate::drain::StreamDrainer;
use crate::sinks::{TracingLogSink, TracingStatusSink};

// ============================================================================
// WorkerSettings
// ============================================================================

/// Tunables for one [`UploadWorker`]
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Absolute path of the upload program
    pub executable: PathBuf,
    /// Also check the stop flag between files
    pub stop_between_files: bool,
    /// How long output drainers may keep flushing after the child exits
    pub drain_grace: Duration,
}

impl WorkerSettings {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            stop_between_files: false,
            drain_grace: Duration::from_secs(2),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            executable: config.uploader.executable_path(),
            stop_between_files: config.uploader.stop_between_files,
            drain_grace: config.uploader.drain_grace(),
        }
    }
}

// ============================================================================
// UploadWorker
// ============================================================================

enum State {
    Validating,
    Draining,
    PerFile(std::vec::IntoIter<QueuedFile>),
    Finished(RunOutcome),
}

/// Drains the upload queue by invoking the upload program once per file
pub struct UploadWorker {
    destination: HostPort,
    credentials: Credentials,
    settings: WorkerSettings,
    queue: Arc<dyn IUploadQueue>,
    runner: Arc<dyn IProcessRunner>,
    status: Arc<dyn IStatusSink>,
    log: Arc<dyn ILogSink>,
    run_state: RunState,
    counters: AggregateCounters,
    /// Serialises `run()` so two passes never overlap
    running: Mutex<()>,
}

impl UploadWorker {
    /// Creates a worker reporting through the tracing sinks
    ///
    /// # Arguments
    /// * `destination` - Where uploads go; checked at the start of every run
    /// * `credentials` - Passed to the upload program via its environment
    /// * `settings` - Executable path and worker tunables
    /// * `queue` - The queue owner
    /// * `runner` - Launches the upload program
    pub fn new(
        destination: HostPort,
        credentials: Credentials,
        settings: WorkerSettings,
        queue: Arc<dyn IUploadQueue>,
        runner: Arc<dyn IProcessRunner>,
    ) -> Self {
        Self {
            destination,
            credentials,
            settings,
            queue,
            runner,
            status: Arc::new(TracingStatusSink::new()),
            log: Arc::new(TracingLogSink::new()),
            run_state: RunState::new(),
            counters: AggregateCounters::new(),
            running: Mutex::new(()),
        }
    }

    /// Replaces the status sink
    pub fn with_status_sink(mut self, status: Arc<dyn IStatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Replaces the sink receiving the upload program's output
    pub fn with_log_sink(mut self, log: Arc<dyn ILogSink>) -> Self {
        self.log = log;
        self
    }

    /// Requests a cooperative stop. Idempotent; safe from any thread.
    pub fn stop(&self) {
        info!("Upload stop requested");
        self.run_state.stop_handle().stop();
    }

    /// Handle that can request a stop after the worker moved into a task
    pub fn stop_handle(&self) -> StopHandle {
        self.run_state.stop_handle()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.run_state.is_stop_requested()
    }

    /// Current in-flight counters
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn destination(&self) -> &HostPort {
        &self.destination
    }

    /// Runs until the queue is empty, a stop is honoured, or an upload fails
    ///
    /// # Errors
    /// [`UploadError`] when the upload program could not be launched or
    /// awaited. The entry being processed stays queued.
    pub async fn run(&self) -> Result<RunOutcome, UploadError> {
        let _running = self.running.lock().await;
        info!(destination = %self.destination, "Upload worker running");

        let mut state = State::Validating;
        let mut passes = 0u32;
        loop {
            state = match state {
                State::Validating => self.validate(),
                State::Draining => {
                    passes += 1;
                    self.begin_pass(passes).await
                }
                State::PerFile(entries) => self.process_next(entries).await?,
                State::Finished(outcome) => {
                    info!(outcome = %outcome, passes, "Upload worker finished");
                    return Ok(outcome);
                }
            };
        }
    }

    fn validate(&self) -> State {
        if !self.destination.is_valid() {
            warn!(destination = %self.destination.raw(), "Host/port is invalid");
            self.emit(UploadStatus::InvalidDestination(
                self.destination.raw().to_string(),
            ));
            return State::Finished(RunOutcome::InvalidDestination);
        }

        self.emit(UploadStatus::Running(self.destination.clone()));
        self.reset_counters();
        State::Draining
    }

    async fn begin_pass(&self, pass: u32) -> State {
        let snapshot = self.queue.snapshot().await;
        if snapshot.is_empty() {
            self.reset_counters();
            self.emit(UploadStatus::QueueEmpty);
            return State::Finished(RunOutcome::Done);
        }

        if self.run_state.is_stop_requested() {
            self.emit(UploadStatus::PauseRequested);
            return State::Finished(RunOutcome::Paused);
        }

        debug!(pass, entries = snapshot.len(), "Starting outer pass");
        self.reset_counters();
        self.emit(UploadStatus::Uploading);
        State::PerFile(snapshot.into_iter())
    }

    async fn process_next(
        &self,
        mut entries: std::vec::IntoIter<QueuedFile>,
    ) -> Result<State, UploadError> {
        let Some(entry) = entries.next() else {
            self.reset_counters();
            return Ok(State::Draining);
        };

        if self.settings.stop_between_files && self.run_state.is_stop_requested() {
            self.emit(UploadStatus::PauseRequested);
            return Ok(State::Finished(RunOutcome::Paused));
        }

        let Some(path) = entry.disk_path().and_then(absolute_path) else {
            debug!(source = %entry.source(), "Entry has no usable disk path; dropping");
            self.queue.remove(entry.id()).await;
            return Ok(State::PerFile(entries));
        };

        debug!(entry = %entry, "Need to upload");
        let exit = self.upload(&path).await?;

        if exit.success() {
            self.emit(UploadStatus::uploaded(&path));
            self.queue.remove(entry.id()).await;
            Ok(State::PerFile(entries))
        } else {
            warn!(file = %path.display(), exit = %exit, "Problem uploading; aborting run");
            self.emit(UploadStatus::Failed {
                path: path.clone(),
                exit,
            });
            Ok(State::Finished(RunOutcome::Aborted {
                entry: entry.id(),
                path,
                exit,
            }))
        }
    }

    /// Launches the upload program for `path` and waits for it to exit
    async fn upload(&self, path: &Path) -> Result<ProcessExit, UploadError> {
        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        self.set_counters(size, 1);

        let request = LaunchRequest::new(
            &self.settings.executable,
            &self.destination,
            path,
            self.credentials.clone(),
        );
        let mut process = match self.runner.start(&request).await {
            Ok(process) => process,
            Err(e) => {
                self.reset_counters();
                return Err(e);
            }
        };

        let stdout = self.attach_drainer(process.take_stdout(), StreamKind::Stdout);
        let stderr = self.attach_drainer(process.take_stderr(), StreamKind::Stderr);

        let exit = process.wait_for_exit().await;

        let grace = self.settings.drain_grace;
        tokio::join!(finish_drainer(stdout, grace), finish_drainer(stderr, grace));
        self.set_counters(0, 0);

        let exit = exit?;
        debug!(file = %path.display(), exit = %exit, "Upload program finished");
        Ok(exit)
    }

    fn attach_drainer(
        &self,
        stream: Option<ChildStream>,
        kind: StreamKind,
    ) -> Option<StreamDrainer> {
        match stream {
            Some(stream) => Some(StreamDrainer::attach(stream, kind, Arc::clone(&self.log))),
            None => {
                debug!(stream = %kind, "No child stream to drain");
                None
            }
        }
    }

    fn emit(&self, status: UploadStatus) {
        let text = status.to_string();
        debug!(status = %text, "Status");
        self.status.set_status_text(&text);
    }

    fn set_counters(&self, bytes: u64, blobs: u64) {
        self.counters.set_in_flight_bytes(bytes);
        self.counters.set_in_flight_blobs(blobs);
        self.status.set_in_flight_bytes(bytes);
        self.status.set_in_flight_blobs(blobs);
    }

    fn reset_counters(&self) {
        self.set_counters(0, 0);
    }
}

/// The upload program always receives an absolute path; relative disk paths
/// are taken relative to the worker's current directory
fn absolute_path(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    match std::env::current_dir() {
        Ok(cwd) => Some(cwd.join(path)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot resolve relative path");
            None
        }
    }
}

async fn finish_drainer(drainer: Option<StreamDrainer>, grace: Duration) {
    if let Some(drainer) = drainer {
        drainer.finish(grace).await;
    }
}
