use std::fmt;

/// The execution context a subscription's handler runs on.
///
/// Declared per handler at registration. Subscriptions registered without a
/// declared mode (implicit registration) are treated as [`Background`].
///
/// [`Background`]: ThreadMode::Background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreadMode {
    /// Delivered on the bounded worker pool. Deliveries may run concurrently
    /// and complete out of enqueue order.
    Background,
    /// Scheduled onto the designated main execution context.
    Main,
    /// Same routing as [`Main`](ThreadMode::Main); ordering on the main
    /// context is whatever that context serializes.
    MainOrdered,
    /// Invoked inline on the dispatch loop, in registry order. A slow
    /// handler delays every subsequent delivery.
    Posting,
    /// Treated as [`Posting`](ThreadMode::Posting).
    Async,
}

impl ThreadMode {
    /// Whether the handler runs inline on the dispatch loop.
    pub const fn is_inline(self) -> bool {
        matches!(self, ThreadMode::Posting | ThreadMode::Async)
    }

    /// Whether the handler is routed to the main execution context.
    pub const fn is_main(self) -> bool {
        matches!(self, ThreadMode::Main | ThreadMode::MainOrdered)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ThreadMode::Background => "background",
            ThreadMode::Main => "main",
            ThreadMode::MainOrdered => "main_ordered",
            ThreadMode::Posting => "posting",
            ThreadMode::Async => "async",
        }
    }
}

impl fmt::Display for ThreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_predicates() {
        assert!(ThreadMode::Posting.is_inline());
        assert!(ThreadMode::Async.is_inline());
        assert!(!ThreadMode::Background.is_inline());
        assert!(ThreadMode::Main.is_main());
        assert!(ThreadMode::MainOrdered.is_main());
        assert!(!ThreadMode::Posting.is_main());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(ThreadMode::MainOrdered.to_string(), "main_ordered");
        assert_eq!(ThreadMode::Background.to_string(), "background");
    }
}
