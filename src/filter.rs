use std::any::TypeId;
use std::fmt;

use crate::envelope::Envelope;
use crate::event::short_type_name;

/// The accepted-type side of a subscription.
///
/// Fixed for the lifetime of the subscription record. Matching is covariant:
/// an exact filter accepts an event whose concrete type equals the filter
/// type, or whose declared [`ancestors`](crate::Event::ancestors) include it.
///
/// `of::<T>()` works for concrete event types and for `dyn Trait` markers
/// alike, so a filter can stand in for "anything that satisfies this
/// capability":
///
/// ```rust
/// use herald::TypeFilter;
///
/// trait PlaybackSignal {}
/// struct Seek;
///
/// let exact = TypeFilter::of::<Seek>();
/// let marker = TypeFilter::of::<dyn PlaybackSignal>();
/// let everything = TypeFilter::any();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    /// Matches one `TypeId`, covariantly.
    Exact {
        id: TypeId,
        name: &'static str,
    },
    /// Matches every event.
    Any,
}

impl TypeFilter {
    /// Filter on a concrete event type or a `dyn Trait` marker.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeFilter::Exact {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// Filter that accepts every event.
    pub const fn any() -> Self {
        TypeFilter::Any
    }

    /// Short name of the accepted type, `*` for match-all. Used in
    /// subscription keys and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeFilter::Exact { name, .. } => name,
            TypeFilter::Any => "*",
        }
    }

    pub(crate) fn accepts(&self, envelope: &Envelope) -> bool {
        match self {
            TypeFilter::Exact { id, .. } => envelope.satisfies(*id),
            TypeFilter::Any => true,
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    struct Seek;
    struct Stop;

    trait Signal {}

    impl Event for Seek {}

    impl Signal for Stop {}

    impl Event for Stop {
        fn ancestors(&self) -> Vec<TypeId> {
            vec![TypeId::of::<dyn Signal>()]
        }
    }

    #[test]
    fn exact_filter_matches_concrete_type() {
        let filter = TypeFilter::of::<Seek>();
        assert!(filter.accepts(&Envelope::new(Seek)));
        assert!(!filter.accepts(&Envelope::new(Stop)));
    }

    #[test]
    fn marker_filter_matches_declared_ancestor() {
        let filter = TypeFilter::of::<dyn Signal>();
        assert!(filter.accepts(&Envelope::new(Stop)));
        assert!(!filter.accepts(&Envelope::new(Seek)));
    }

    #[test]
    fn any_filter_matches_everything() {
        let filter = TypeFilter::any();
        assert!(filter.accepts(&Envelope::new(Seek)));
        assert!(filter.accepts(&Envelope::new(Stop)));
        assert_eq!(filter.type_name(), "*");
    }

    #[test]
    fn names_are_short() {
        assert_eq!(TypeFilter::of::<Seek>().type_name(), "Seek");
        assert_eq!(TypeFilter::of::<dyn Signal>().type_name(), "Signal");
    }
}
