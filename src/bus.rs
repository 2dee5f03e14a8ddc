use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{default_sink, Config};
use crate::dispatch::{Dispatcher, MainDispatcher, MainItem};
use crate::envelope::Envelope;
use crate::event::Event;
use crate::handle::BusHandle;
use crate::handler::Handler;
use crate::main_context::{MainContext, SerialContext};
use crate::registry::Registry;
use crate::subscriber::Subscriber;
use crate::subscription::{Subscription, SubscriptionInfo};

/// Typed in-process publish/subscribe event bus.
///
/// Producers post events of any [`Event`] type; the bus matches each event's
/// runtime type against the registered subscriptions and delivers on the
/// execution context each subscription declared: the bounded background
/// pool, the single serialized main context, or inline on the dispatch
/// loop. See the crate docs for a full tour.
///
/// # Ordering
///
/// Events are *selected* for dispatch in posting order per queue. Inline
/// deliveries therefore run strictly in posting order; pooled deliveries
/// may complete out of order; main-context deliveries follow main-queue
/// order, and deliveries cross-routed from the background loop are ordered
/// by its registry iteration, not by their original posting order.
///
/// # Lifecycle
///
/// Must be created inside a Tokio runtime (it spawns its dispatch loops).
/// [`shutdown`](Bus::shutdown) is an abrupt, best-effort immediate stop:
/// queued events are discarded, pending pooled work is cancelled, the
/// registry is cleared. Posting afterwards is accepted and silently
/// discarded; producers never observe bus state.
pub struct Bus {
    registry: Arc<Registry>,
    background_tx: mpsc::UnboundedSender<Envelope>,
    main_tx: mpsc::UnboundedSender<MainItem>,
    pool: Arc<Semaphore>,
    cancel: CancellationToken,
    running: AtomicBool,
    next_identity: AtomicUsize,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl Bus {
    /// Build a bus and spawn its dispatch loops on the current runtime.
    pub fn new(config: Config) -> Self {
        let pool_size = config.pool_size();
        let sink = config.error_sink.clone().unwrap_or_else(default_sink);
        let cancel = CancellationToken::new();
        let context = config.main_context.clone().unwrap_or_else(|| {
            let ctx: Arc<dyn MainContext> = SerialContext::spawn_with(cancel.child_token());
            ctx
        });

        let registry = Arc::new(Registry::new());
        let pool = Arc::new(Semaphore::new(pool_size));
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        let (main_tx, main_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            registry: registry.clone(),
            main_tx: main_tx.clone(),
            pool: pool.clone(),
            sink: sink.clone(),
            cancel: cancel.clone(),
        };
        let main_dispatcher = MainDispatcher {
            registry: registry.clone(),
            context,
            sink,
            cancel: cancel.clone(),
        };
        let loops = Mutex::new(vec![
            tokio::spawn(dispatcher.run(background_rx)),
            tokio::spawn(main_dispatcher.run(main_rx)),
        ]);

        Self {
            registry,
            background_tx,
            main_tx,
            pool,
            cancel,
            running: AtomicBool::new(true),
            next_identity: AtomicUsize::new(0),
            loops,
        }
    }

    // ---- registration ------------------------------------------------------

    /// Register every handler a subscriber declares, keyed under the
    /// subscriber's [`name`](Subscriber::name). Registering the same object
    /// again overwrites its records rather than duplicating them.
    pub fn register<S>(&self, subscriber: &Arc<S>)
    where
        S: Subscriber + ?Sized,
    {
        self.register_tagged(subscriber.name(), subscriber);
    }

    /// Register under a caller-supplied tag instead of the subscriber name.
    /// The tag becomes the key prefix used by [`unregister_tag`](Bus::unregister_tag).
    pub fn register_tagged<S>(&self, tag: &str, subscriber: &Arc<S>)
    where
        S: Subscriber + ?Sized,
    {
        let identity = Arc::as_ptr(subscriber) as *const () as usize;
        for handler in Arc::clone(subscriber).handlers() {
            let subscription = Subscription::new(tag, identity, handler);
            tracing::debug!(key = subscription.key(), "subscription registered");
            self.registry.add(subscription);
        }
    }

    /// Register a standalone handler under a tag, without a subscriber
    /// object. Each call is a distinct registration; returns the record's
    /// uniqueness key.
    pub fn subscribe(&self, tag: &str, handler: Handler) -> String {
        let identity = self.next_identity.fetch_add(1, Ordering::Relaxed) + 1;
        let subscription = Subscription::new(tag, identity, handler);
        let key = subscription.key().to_string();
        tracing::debug!(key = %key, "subscription registered");
        self.registry.add(subscription);
        key
    }

    /// Remove every subscription registered under the subscriber's name.
    /// Records registered under a custom tag are not touched. No-op when
    /// nothing matches.
    pub fn unregister<S>(&self, subscriber: &Arc<S>)
    where
        S: Subscriber + ?Sized,
    {
        self.unregister_tag(subscriber.name());
    }

    /// Remove every subscription whose key starts with `prefix`. No-op when
    /// nothing matches.
    pub fn unregister_tag(&self, prefix: &str) {
        let removed = self.registry.remove_like(prefix);
        if removed > 0 {
            tracing::debug!(prefix, removed, "subscriptions removed");
        }
    }

    // ---- publishing --------------------------------------------------------

    /// Enqueue onto the background queue. Fire-and-forget: never blocks,
    /// never fails, no delivery confirmation. An event matching nothing is
    /// dropped silently.
    pub fn post<E: Event>(&self, event: E) {
        let _ = self.background_tx.send(Envelope::new(event));
    }

    /// Enqueue onto the main queue; every match is scheduled onto the main
    /// execution context. Same fire-and-forget contract as [`post`](Bus::post).
    pub fn post_main<E: Event>(&self, event: E) {
        let _ = self.main_tx.send(MainItem::Posted(Envelope::new(event)));
    }

    /// Post after a best-effort delay, on an ad-hoc one-shot task. The
    /// caller is never blocked; the delayed post is not cancellable.
    pub fn post_delay<E: Event>(&self, event: E, delay: Duration) {
        self.handle().post_delay(event, delay);
    }

    /// Producer-only handle for bridges and callbacks (see [`BusHandle`]).
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            background_tx: self.background_tx.clone(),
            main_tx: self.main_tx.clone(),
        }
    }

    // ---- lifecycle & introspection ----------------------------------------

    /// Abrupt teardown: stops both dispatch loops, cancels pending pooled
    /// deliveries, discards both queues, clears the registry. Does not wait
    /// for in-flight handler invocations. Idempotent; also runs on `Drop`.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("bus shutting down");
        self.cancel.cancel();
        self.pool.close();
        let mut loops = self.loops.lock().unwrap_or_else(PoisonError::into_inner);
        for task in loops.drain(..) {
            task.abort();
        }
        self.registry.clear();
    }

    /// False once [`shutdown`](Bus::shutdown) has run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Descriptive snapshot of every current subscription. Diagnostics
    /// only, no behavioral contract.
    pub fn list_subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.registry.infos()
    }

    /// Number of current subscription records.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// The subscription snapshot as pretty-printed JSON.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn subscriptions_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.list_subscriptions())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("running", &self.is_running())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
