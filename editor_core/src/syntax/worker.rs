//! Background highlight worker.
//!
//! Runs highlight queries on a dedicated thread. Jobs and completions travel
//! over crossbeam channels; the editing thread decides on arrival whether a
//! completion is still current.

use super::client::{QueryLimits, QueryOutcome, QuerySnapshot};
use crossbeam_channel::{Receiver, Sender};
use ropey::Rope;
use std::ops::Range;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A query to run off the editing thread.
pub struct HighlightJob {
    /// Edit generation the job was created for.
    pub generation: u64,
    pub snapshot: QuerySnapshot,
    /// Text matching `snapshot.tree`.
    pub rope: Rope,
    pub range: Range<usize>,
    pub limits: QueryLimits,
}

/// A finished job.
#[derive(Debug, Clone)]
pub struct HighlightCompletion {
    pub generation: u64,
    pub range: Range<usize>,
    pub outcome: QueryOutcome,
}

enum WorkerRequest {
    Highlight(HighlightJob),
    Shutdown,
}

/// Handle to the worker thread. Dropping it stops the thread.
pub struct HighlightWorker {
    request_tx: Sender<WorkerRequest>,
    completion_rx: Receiver<HighlightCompletion>,
    thread: Option<JoinHandle<()>>,
}

impl HighlightWorker {
    /// Starts the worker thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();

        let thread = thread::Builder::new()
            .name("highlight-worker".to_string())
            .spawn(move || run_worker(request_rx, completion_tx))?;

        Ok(Self {
            request_tx,
            completion_rx,
            thread: Some(thread),
        })
    }

    /// Queues a job. Jobs still waiting when a newer one arrives are skipped.
    pub fn submit(&self, job: HighlightJob) -> bool {
        self.request_tx.send(WorkerRequest::Highlight(job)).is_ok()
    }

    /// Takes a finished job, if any (non-blocking).
    pub fn try_recv(&self) -> Option<HighlightCompletion> {
        self.completion_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for a finished job.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<HighlightCompletion> {
        self.completion_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for HighlightWorker {
    fn drop(&mut self) {
        let _ = self.request_tx.send(WorkerRequest::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("highlight worker panicked");
            }
        }
    }
}

fn run_worker(request_rx: Receiver<WorkerRequest>, completion_tx: Sender<HighlightCompletion>) {
    log::debug!("highlight worker started");
    while let Ok(request) = request_rx.recv() {
        // Only the newest queued job is worth running.
        let mut latest = request;
        while let Ok(next) = request_rx.try_recv() {
            if matches!(latest, WorkerRequest::Shutdown) {
                break;
            }
            if let WorkerRequest::Highlight(skipped) = &latest {
                log::trace!("skipping superseded highlight job (generation {})", skipped.generation);
            }
            latest = next;
        }

        let job = match latest {
            WorkerRequest::Highlight(job) => job,
            WorkerRequest::Shutdown => break,
        };
        let outcome = job
            .snapshot
            .query
            .run_extended(&job.snapshot.tree, &job.rope, &job.range, job.limits);
        let completion = HighlightCompletion {
            generation: job.generation,
            range: job.range,
            outcome,
        };
        if completion_tx.send(completion).is_err() {
            break;
        }
    }
    log::debug!("highlight worker stopped");
}
