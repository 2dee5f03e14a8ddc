use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A unit of work scheduled onto the main execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The single designated serialized execution context for MAIN-mode
/// deliveries.
///
/// The bus never invokes MAIN-routed handlers itself; it only schedules
/// them here, one job per delivery, and relies on the context to run jobs
/// one at a time. Implement this to route deliveries onto an application's
/// UI thread or any other serialized executor. The built-in
/// [`SerialContext`] is the default.
pub trait MainContext: Send + Sync + 'static {
    /// Enqueue a job. Must not block the caller; jobs must execute
    /// serialized, in submission order.
    fn schedule(&self, job: Job);
}

/// Default main context: a dedicated task draining an unbounded job queue,
/// executing one job at a time.
pub struct SerialContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialContext {
    /// Spawn a serial context on the current Tokio runtime. It runs until
    /// every handle to it is dropped.
    pub fn spawn() -> Arc<Self> {
        Self::spawn_with(CancellationToken::new())
    }

    /// Spawn a serial context that also stops when `cancel` fires; jobs
    /// still queued at that point are discarded.
    pub(crate) fn spawn_with(cancel: CancellationToken) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    maybe = rx.recv() => match maybe {
                        Some(job) => job(),
                        None => break,
                    },
                }
            }
        });
        Arc::new(Self { tx })
    }
}

impl MainContext for SerialContext {
    fn schedule(&self, job: Job) {
        // Send failure means the context task is gone; the job is discarded,
        // matching teardown semantics.
        let _ = self.tx.send(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_jobs_in_submission_order() {
        let ctx = SerialContext::spawn();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..8 {
            let log = log.clone();
            ctx.schedule(Box::new(move || log.lock().unwrap().push(i)));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*log.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn cancelled_context_discards_queued_jobs() {
        let cancel = CancellationToken::new();
        let ctx = SerialContext::spawn_with(cancel.clone());
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        ctx.schedule(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
