//! Worker offload for CPU-bound analysis and timeout bounds on pluggable
//! capabilities.
//!
//! Feature extraction and alignment run off the caller's thread on a small
//! bounded pool; pluggable capability calls (classifier, transliterator) are
//! bounded by a timeout, with a timeout resolving to the stage fallback
//! rather than failing the request.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use super::{AnalysisReport, AnalysisRequest, Analyzer, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool of analysis worker threads.
pub struct AnalysisPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl AnalysisPool {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (tx, rx) = channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let rx = Arc::clone(&rx);
            let handle = thread::Builder::new()
                .name(format!("analysis-worker-{index}"))
                .spawn(move || loop {
                    let job = {
                        let guard = rx.lock().expect("worker queue poisoned");
                        guard.recv()
                    };
                    match job {
                        Ok(job) => job(),
                        Err(_) => break,
                    }
                })
                .expect("failed to spawn analysis worker");
            workers.push(handle);
        }
        info!(worker_count, "analysis pool started");
        Self {
            tx: Some(tx),
            workers,
        }
    }

    /// Submits one analysis request; the result arrives on the returned
    /// channel. Each request is independent, so cancellation is simply
    /// dropping the receiver.
    pub fn submit(
        &self,
        analyzer: Arc<Analyzer>,
        request: AnalysisRequest,
    ) -> Receiver<Result<AnalysisReport>> {
        let (result_tx, result_rx) = channel();
        let job: Job = Box::new(move || {
            let outcome = analyzer.analyze(&request);
            let _ = result_tx.send(outcome);
        });
        if let Some(tx) = &self.tx {
            let _ = tx.send(job);
        }
        result_rx
    }
}

impl Drop for AnalysisPool {
    fn drop(&mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Runs a black-box capability call with a wall-clock bound. `None` means the
/// call timed out or could not be dispatched; callers resolve that to their
/// documented fallback.
pub(crate) fn call_with_timeout<T, F>(label: &'static str, timeout: Duration, call: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = channel();
    let spawned = thread::Builder::new()
        .name(format!("capability-{label}"))
        .spawn(move || {
            let _ = tx.send(call());
        });
    if let Err(err) = spawned {
        warn!(label, error = %err, "failed to dispatch capability call");
        return None;
    }
    match rx.recv_timeout(timeout) {
        Ok(value) => Some(value),
        Err(RecvTimeoutError::Timeout) => {
            warn!(label, timeout_ms = timeout.as_millis() as u64, "capability call timed out");
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!(label, "capability call panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_call_returns_fast_results() {
        let value = call_with_timeout("test", Duration::from_millis(500), || 41 + 1);
        assert_eq!(value, Some(42));
    }

    #[test]
    fn bounded_call_times_out_on_stalls() {
        let value = call_with_timeout("stall", Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(400));
            1
        });
        assert_eq!(value, None);
    }

    #[test]
    fn bounded_call_absorbs_panics() {
        let value: Option<i32> =
            call_with_timeout("panic", Duration::from_millis(200), || panic!("boom"));
        assert_eq!(value, None);
    }
}
