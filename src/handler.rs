use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::event::Event;
use crate::filter::TypeFilter;
use crate::thread_mode::ThreadMode;

/// Type-erased handler callable. Always invoked with exactly one argument:
/// the event being delivered.
pub type HandlerFn = Arc<dyn Fn(&dyn Event) -> Result<()> + Send + Sync>;

/// One handler entry in a subscriber's registration table.
///
/// Each entry pairs a name, an accepted-type filter, an optional execution
/// mode, and the callable:
///
/// - [`with_mode`](Handler::with_mode) is the explicit form: the entry
///   registers with the declared [`ThreadMode`].
/// - [`new`](Handler::new) is the implicit form: no declared mode, accepted
///   because the parameter type carries the [`Event`] marker capability;
///   such entries default to [`ThreadMode::Background`] at dispatch.
/// - A handler takes exactly one event argument by construction.
///
/// Typed constructors filter on the closure's concrete parameter type. For
/// covariant filters (`dyn Trait` markers, match-all) use
/// [`raw`](Handler::raw), whose callable receives `&dyn Event`.
pub struct Handler {
    pub(crate) name: &'static str,
    pub(crate) filter: TypeFilter,
    pub(crate) mode: Option<ThreadMode>,
    pub(crate) call: HandlerFn,
}

impl Handler {
    /// Implicit entry: accepted type taken from the closure parameter,
    /// no declared mode (defaults to background delivery).
    pub fn new<T, F>(name: &'static str, f: F) -> Self
    where
        T: Event,
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        Self::typed(name, None, f)
    }

    /// Explicit entry with a declared execution mode.
    pub fn with_mode<T, F>(name: &'static str, mode: ThreadMode, f: F) -> Self
    where
        T: Event,
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        Self::typed(name, Some(mode), f)
    }

    /// Entry with an arbitrary filter and a type-erased callable. The only
    /// way to subscribe to a `dyn Trait` marker or to every event.
    pub fn raw<F>(name: &'static str, mode: ThreadMode, filter: TypeFilter, f: F) -> Self
    where
        F: Fn(&dyn Event) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name,
            filter,
            mode: Some(mode),
            call: Arc::new(f),
        }
    }

    fn typed<T, F>(name: &'static str, mode: Option<ThreadMode>, f: F) -> Self
    where
        T: Event,
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        let call: HandlerFn = Arc::new(move |event: &dyn Event| {
            // A typed handler can only run against its own concrete type; a
            // covariant match that reaches here with some other type is
            // skipped, not an error.
            match event.downcast_ref::<T>() {
                Some(typed) => f(typed),
                None => Ok(()),
            }
        });
        Self {
            name,
            filter: TypeFilter::of::<T>(),
            mode,
            call,
        }
    }

    /// Entry name, used in the subscription's uniqueness key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The accepted-type filter.
    pub fn filter(&self) -> TypeFilter {
        self.filter
    }

    /// Declared mode; `None` for implicit entries.
    pub fn mode(&self) -> Option<ThreadMode> {
        self.mode
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Seek(u64);
    struct Stop;

    impl Event for Seek {}
    impl Event for Stop {}

    #[test]
    fn typed_handler_runs_on_its_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let handler = Handler::new("on_seek", move |e: &Seek| {
            assert_eq!(e.0, 7);
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (handler.call)(&Seek(7)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn typed_handler_skips_foreign_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let handler = Handler::new("on_seek", move |_: &Seek| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (handler.call)(&Stop).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn implicit_entries_carry_no_mode() {
        let implicit = Handler::new("on_seek", |_: &Seek| Ok(()));
        let explicit = Handler::with_mode("on_stop", ThreadMode::Main, |_: &Stop| Ok(()));
        assert_eq!(implicit.mode(), None);
        assert_eq!(explicit.mode(), Some(ThreadMode::Main));
        assert_eq!(implicit.filter().type_name(), "Seek");
    }
}
