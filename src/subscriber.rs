use std::sync::Arc;

use crate::handler::Handler;

/// A registrable subscriber object.
///
/// A subscriber declares its handler table explicitly and
/// [`Bus::register`](crate::Bus::register) walks it. Each
/// entry becomes one subscription record keyed by
/// `{name-or-tag}.{handler}.{type}.{identity}`, where identity is the
/// subscriber object's address, so registering the same object twice
/// overwrites rather than duplicates.
///
/// ```rust
/// use std::sync::Arc;
/// use herald::{Event, Handler, Result, Subscriber, ThreadMode};
///
/// struct Seek(u64);
/// struct Stop;
/// impl Event for Seek {}
/// impl Event for Stop {}
///
/// struct Player;
///
/// impl Player {
///     fn on_seek(&self, seek: &Seek) -> Result<()> {
///         println!("seek to {}", seek.0);
///         Ok(())
///     }
/// }
///
/// impl Subscriber for Player {
///     fn name(&self) -> &'static str {
///         "Player"
///     }
///
///     fn handlers(self: Arc<Self>) -> Vec<Handler> {
///         let a = Arc::clone(&self);
///         let b = Arc::clone(&self);
///         vec![
///             // implicit: no declared mode, delivered on the pool
///             Handler::new("on_seek", move |e: &Seek| a.on_seek(e)),
///             // explicit: declared main-context delivery
///             Handler::with_mode("on_stop", ThreadMode::Main, move |_: &Stop| {
///                 let _ = &b;
///                 Ok(())
///             }),
///         ]
///     }
/// }
/// ```
pub trait Subscriber: Send + Sync + 'static {
    /// Subscriber name; default key prefix when registering without a tag,
    /// and the prefix used by [`Bus::unregister`](crate::Bus::unregister).
    fn name(&self) -> &'static str;

    /// The handler table. Called once per registration; entries capture
    /// their own clones of the subscriber.
    fn handlers(self: Arc<Self>) -> Vec<Handler>;
}
