use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::ErrorSink;
use crate::envelope::Envelope;
use crate::error::DeliveryFailure;
use crate::main_context::MainContext;
use crate::registry::Registry;
use crate::subscription::Subscription;
use crate::thread_mode::ThreadMode;

/// What travels on the main queue.
///
/// `Posted` entries come from `post_main` and are matched against the full
/// registry by the main loop. `Routed` entries are MAIN-mode matches the
/// background loop already resolved; carrying the record (rather than
/// re-enqueueing the bare event) makes the match at original dispatch time
/// authoritative: a subscriber registered afterwards cannot receive it.
pub(crate) enum MainItem {
    Posted(Envelope),
    Routed(Arc<Subscription>, Envelope),
}

/// Background dispatch loop. Single dedicated worker; drains the background
/// queue FIFO and routes each matching record by its declared mode.
pub(crate) struct Dispatcher {
    pub(crate) registry: Arc<Registry>,
    pub(crate) main_tx: UnboundedSender<MainItem>,
    pub(crate) pool: Arc<Semaphore>,
    pub(crate) sink: ErrorSink,
    pub(crate) cancel: CancellationToken,
}

impl Dispatcher {
    pub(crate) async fn run(self, mut rx: UnboundedReceiver<Envelope>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                maybe = rx.recv() => match maybe {
                    Some(envelope) => self.dispatch(envelope),
                    None => break,
                },
            }
        }
        drain(&mut rx);
    }

    /// Full linear scan of the registry snapshot; events with no match are
    /// dropped silently.
    fn dispatch(&self, envelope: Envelope) {
        for subscription in self.registry.snapshot() {
            if !subscription.matches(&envelope) {
                continue;
            }
            match subscription.effective_mode() {
                ThreadMode::Background => self.spawn_pooled(subscription, envelope.clone()),
                ThreadMode::Main | ThreadMode::MainOrdered => {
                    let _ = self
                        .main_tx
                        .send(MainItem::Routed(subscription, envelope.clone()));
                }
                // Inline on the loop: one event's inline matches complete
                // before the next queued event is taken.
                ThreadMode::Posting | ThreadMode::Async => {
                    deliver(&subscription, &envelope, &self.sink)
                }
            }
        }
    }

    /// Hand one delivery to the bounded pool. The spawned task waits for a
    /// permit, so the loop itself never blocks on pool capacity; a closed
    /// pool (teardown) cancels the delivery.
    fn spawn_pooled(&self, subscription: Arc<Subscription>, envelope: Envelope) {
        let pool = self.pool.clone();
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                permit = pool.acquire_owned() => permit,
            };
            if permit.is_ok() {
                deliver(&subscription, &envelope, &sink);
            }
        });
    }
}

/// Main dispatch loop. Mirrors the background loop's blocking-take shape
/// over the main queue, but never invokes handlers itself: every delivery
/// is scheduled onto the main context, which serializes them.
pub(crate) struct MainDispatcher {
    pub(crate) registry: Arc<Registry>,
    pub(crate) context: Arc<dyn MainContext>,
    pub(crate) sink: ErrorSink,
    pub(crate) cancel: CancellationToken,
}

impl MainDispatcher {
    pub(crate) async fn run(self, mut rx: UnboundedReceiver<MainItem>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                maybe = rx.recv() => match maybe {
                    Some(MainItem::Posted(envelope)) => {
                        for subscription in self.registry.snapshot() {
                            if subscription.matches(&envelope) {
                                self.schedule(subscription, envelope.clone());
                            }
                        }
                    }
                    Some(MainItem::Routed(subscription, envelope)) => {
                        self.schedule(subscription, envelope);
                    }
                    None => break,
                },
            }
        }
        drain(&mut rx);
    }

    fn schedule(&self, subscription: Arc<Subscription>, envelope: Envelope) {
        let sink = self.sink.clone();
        self.context.schedule(Box::new(move || {
            deliver(&subscription, &envelope, &sink);
        }));
    }
}

/// Invocation boundary: failures are reported to the sink and dropped; the
/// loops never terminate because of a subscriber.
pub(crate) fn deliver(subscription: &Subscription, envelope: &Envelope, sink: &ErrorSink) {
    tracing::trace!(key = subscription.key(), event = envelope.kind(), "deliver");
    if let Err(error) = subscription.invoke(envelope) {
        sink(&DeliveryFailure {
            key: subscription.key().to_string(),
            event_type: envelope.kind(),
            error,
        });
    }
}

fn drain<T>(rx: &mut UnboundedReceiver<T>) {
    rx.close();
    while rx.try_recv().is_ok() {}
}
