use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use crate::event::{short_type_name, Event};

/// Unique identifier assigned to an event when it is posted (UUID v4, not
/// monotonic). Shows up in traces and in the error sink; carries no routing
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(Uuid);

impl EventId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The unit carried through both ingress queues.
///
/// Wraps the posted event together with everything the dispatch loops need
/// to match it, captured exactly once at post time: the concrete `TypeId`,
/// a short type name for diagnostics, and the event's declared
/// [`ancestors`](Event::ancestors). Cloning is cheap (the payload is behind
/// an `Arc`), which is what makes per-record fan-out affordable.
#[derive(Clone)]
pub struct Envelope {
    id: EventId,
    posted_at_nanos: u64,
    type_id: TypeId,
    type_name: &'static str,
    ancestors: Arc<[TypeId]>,
    payload: Arc<dyn Event>,
}

impl Envelope {
    /// Wrap an event for queueing.
    pub fn new<E: Event>(event: E) -> Self {
        let ancestors: Arc<[TypeId]> = event.ancestors().into();
        Self {
            id: EventId::new(),
            posted_at_nanos: now_nanos(),
            type_id: TypeId::of::<E>(),
            type_name: short_type_name(std::any::type_name::<E>()),
            ancestors,
            payload: Arc::new(event),
        }
    }

    /// Unique identifier for this posting.
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Nanoseconds since the Unix epoch at post time.
    #[inline]
    pub fn posted_at_nanos(&self) -> u64 {
        self.posted_at_nanos
    }

    /// The wrapped event.
    #[inline]
    pub fn event(&self) -> &dyn Event {
        self.payload.as_ref()
    }

    /// Short name of the event's concrete type.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the event's concrete type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Downcast the payload to a concrete event type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.event().downcast_ref::<T>()
    }

    /// Covariant type check: true when `filter_id` is the concrete type or
    /// one of the event's declared ancestors.
    pub(crate) fn satisfies(&self, filter_id: TypeId) -> bool {
        self.type_id == filter_id || self.ancestors.contains(&filter_id)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("kind", &self.type_name)
            .field("posted_at_nanos", &self.posted_at_nanos)
            .finish()
    }
}

/// # Panics
///
/// Panics if the system clock is set before the Unix epoch.
fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("SystemTime before Unix epoch")
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Seek {
        position: u64,
    }

    impl Event for Seek {}

    trait Signal {}

    struct Stop;

    impl Signal for Stop {}

    impl Event for Stop {
        fn ancestors(&self) -> Vec<TypeId> {
            vec![TypeId::of::<dyn Signal>()]
        }
    }

    #[test]
    fn captures_type_identity() {
        let env = Envelope::new(Seek { position: 42 });
        assert_eq!(env.kind(), "Seek");
        assert_eq!(env.type_id(), TypeId::of::<Seek>());
        assert_eq!(env.downcast_ref::<Seek>().map(|s| s.position), Some(42));
        assert!(env.downcast_ref::<Stop>().is_none());
    }

    #[test]
    fn satisfies_concrete_and_ancestor() {
        let env = Envelope::new(Stop);
        assert!(env.satisfies(TypeId::of::<Stop>()));
        assert!(env.satisfies(TypeId::of::<dyn Signal>()));
        assert!(!env.satisfies(TypeId::of::<Seek>()));
    }

    #[test]
    fn ids_are_unique_per_post() {
        let a = Envelope::new(Seek { position: 1 });
        let b = Envelope::new(Seek { position: 1 });
        assert_ne!(a.id(), b.id());
    }
}
