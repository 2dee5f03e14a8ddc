use std::sync::Arc;

/// The single error type for all herald operations.
///
/// Handlers return `herald::Result<()>` (alias for `Result<(), herald::Error>`).
/// Nothing a handler returns or throws ever reaches a producer: the bus
/// contains every failure at the invocation boundary and reports it to the
/// configured error sink. This type exists so handlers have a uniform way to
/// signal failure and so the sink receives something structured.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A handler returned an error of its own.
    #[error("handler failed: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A handler panicked; the payload is the panic message when one was
    /// available.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A plain-text handler failure.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Wrap an arbitrary error as a handler failure.
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    /// Build a plain-text handler failure.
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A delivery that failed and was discarded.
///
/// Passed to the error sink configured via
/// [`Config::with_error_sink`](crate::Config::with_error_sink). The default
/// sink logs at `warn` level and drops it.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// Uniqueness key of the subscription whose handler failed.
    pub key: String,
    /// Short type name of the event being delivered.
    pub event_type: &'static str,
    /// The contained failure.
    pub error: Error,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "delivery of {} to {} failed: {}",
            self.event_type, self.key, self.error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_preserves_source() {
        let io = std::io::Error::other("boom");
        let err = Error::external(io);
        assert!(err.to_string().contains("handler failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn failure_display_names_event_and_key() {
        let failure = DeliveryFailure {
            key: "A.on_tick.Tick.1".into(),
            event_type: "Tick",
            error: Error::message("bad state"),
        };
        let text = failure.to_string();
        assert!(text.contains("Tick"));
        assert!(text.contains("A.on_tick.Tick.1"));
        assert!(text.contains("bad state"));
    }
}
