use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::filter::TypeFilter;
use crate::handler::{Handler, HandlerFn};
use crate::thread_mode::ThreadMode;

/// One registered (subscriber, handler) binding. Immutable once built.
///
/// The uniqueness key is `{tag}.{handler}.{type}.{identity}` where `tag` is
/// the caller-supplied tag or the subscriber's name, `type` is the accepted
/// type's short name, and `identity` distinguishes subscriber objects.
/// Registering the same (subscriber, handler) pair again produces the same
/// key and overwrites; unregistration removes by key prefix.
pub struct Subscription {
    key: String,
    owner: Arc<str>,
    handler_name: &'static str,
    filter: TypeFilter,
    mode: Option<ThreadMode>,
    call: HandlerFn,
}

impl Subscription {
    pub(crate) fn new(tag: &str, identity: usize, handler: Handler) -> Arc<Self> {
        let key = format!(
            "{}.{}.{}.{}",
            tag,
            handler.name,
            handler.filter.type_name(),
            identity
        );
        Arc::new(Self {
            key,
            owner: Arc::from(tag),
            handler_name: handler.name,
            filter: handler.filter,
            mode: handler.mode,
            call: handler.call,
        })
    }

    /// The uniqueness key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag or subscriber name this record was registered under.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Declared mode; `None` for implicit registrations.
    pub fn mode(&self) -> Option<ThreadMode> {
        self.mode
    }

    /// The mode dispatch actually routes on: implicit registrations run as
    /// [`ThreadMode::Background`].
    pub(crate) fn effective_mode(&self) -> ThreadMode {
        self.mode.unwrap_or(ThreadMode::Background)
    }

    pub(crate) fn matches(&self, envelope: &Envelope) -> bool {
        self.filter.accepts(envelope)
    }

    /// Invoke the handler with the event, containing both error returns and
    /// panics. The dispatch loops must survive anything a handler does.
    pub(crate) fn invoke(&self, envelope: &Envelope) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.call)(envelope.event()))) {
            Ok(result) => result,
            Err(payload) => Err(Error::Panicked(panic_text(payload))),
        }
    }

    /// Descriptive snapshot for diagnostics.
    pub fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            key: self.key.clone(),
            owner: self.owner.to_string(),
            handler: self.handler_name,
            event_type: self.filter.type_name(),
            mode: self.mode,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("filter", &self.filter)
            .field("mode", &self.mode)
            .finish()
    }
}

fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Diagnostic description of one subscription. Introspection only; nothing
/// behavioral hangs off this.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubscriptionInfo {
    pub key: String,
    pub owner: String,
    pub handler: &'static str,
    pub event_type: &'static str,
    pub mode: Option<ThreadMode>,
}

impl fmt::Display for SubscriptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.owner, self.handler, self.event_type
        )?;
        match self.mode {
            Some(mode) => write!(f, " [{mode}]"),
            None => write!(f, " [background, implicit]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    struct Seek(u64);

    impl Event for Seek {}

    #[test]
    fn key_layout() {
        let sub = Subscription::new("A", 1, Handler::new("foo", |_: &Seek| Ok(())));
        assert_eq!(sub.key(), "A.foo.Seek.1");
        assert_eq!(sub.owner(), "A");
    }

    #[test]
    fn implicit_mode_routes_background() {
        let sub = Subscription::new("A", 1, Handler::new("foo", |_: &Seek| Ok(())));
        assert_eq!(sub.mode(), None);
        assert_eq!(sub.effective_mode(), ThreadMode::Background);
    }

    #[test]
    fn invoke_contains_panics() {
        let sub = Subscription::new(
            "A",
            1,
            Handler::new("boom", |_: &Seek| -> Result<()> { panic!("kaboom") }),
        );
        let err = sub.invoke(&Envelope::new(Seek(0))).unwrap_err();
        assert!(matches!(err, Error::Panicked(ref msg) if msg.contains("kaboom")));
    }

    #[test]
    fn invoke_contains_error_returns() {
        let sub = Subscription::new(
            "A",
            1,
            Handler::new("fail", |_: &Seek| Err(Error::message("nope"))),
        );
        assert!(sub.invoke(&Envelope::new(Seek(0))).is_err());
    }

    #[test]
    fn info_display() {
        let sub = Subscription::new(
            "Player",
            3,
            Handler::with_mode("on_seek", ThreadMode::Main, |_: &Seek| Ok(())),
        );
        let text = sub.info().to_string();
        assert!(text.contains("Player.on_seek(Seek)"));
        assert!(text.contains("[main]"));
    }
}
