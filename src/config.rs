use std::fmt;
use std::sync::Arc;

use crate::error::DeliveryFailure;
use crate::main_context::MainContext;

/// Sink for delivery failures the bus swallows. Diagnostic only; delivery
/// continues regardless of what the sink does.
pub type ErrorSink = Arc<dyn Fn(&DeliveryFailure) + Send + Sync>;

/// Bus configuration. Use the builder methods to customize, or [`Default`]
/// for the stock setup.
///
/// ```rust,no_run
/// use herald::{Bus, Config};
///
/// # #[tokio::main] async fn main() {
/// let bus = Bus::new(
///     Config::default()
///         .with_pool_size(4)
///         .with_error_sink(|failure| eprintln!("{failure}")),
/// );
/// # }
/// ```
pub struct Config {
    /// Maximum concurrently running BACKGROUND-mode deliveries.
    /// Default: 10.
    pool_size: usize,
    pub(crate) main_context: Option<Arc<dyn MainContext>>,
    pub(crate) error_sink: Option<ErrorSink>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: 10,
            main_context: None,
            error_sink: None,
        }
    }
}

impl Config {
    /// Set the worker-pool size for BACKGROUND-mode deliveries. Clamped to
    /// at least 1.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Supply the main execution context MAIN-mode deliveries are scheduled
    /// onto (e.g. a UI-thread adapter). Without this the bus spawns its own
    /// [`SerialContext`](crate::SerialContext).
    pub fn with_main_context(mut self, context: Arc<dyn MainContext>) -> Self {
        self.main_context = Some(context);
        self
    }

    /// Observe failures the bus would otherwise only log. The sink runs on
    /// whichever execution context the failing delivery ran on, so keep it
    /// quick.
    pub fn with_error_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&DeliveryFailure) + Send + Sync + 'static,
    {
        self.error_sink = Some(Arc::new(sink));
        self
    }

    /// Returns the configured worker-pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("pool_size", &self.pool_size)
            .field("main_context", &self.main_context.is_some())
            .field("error_sink", &self.error_sink.is_some())
            .finish()
    }
}

pub(crate) fn default_sink() -> ErrorSink {
    Arc::new(|failure: &DeliveryFailure| {
        tracing::warn!(
            key = %failure.key,
            event = failure.event_type,
            error = %failure.error,
            "subscriber failure discarded"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_clamps_to_one() {
        assert_eq!(Config::default().with_pool_size(0).pool_size(), 1);
        assert_eq!(Config::default().pool_size(), 10);
    }
}
