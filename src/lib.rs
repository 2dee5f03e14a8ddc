#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Herald
//!
//! A typed in-process publish/subscribe event bus for Tokio.
//!
//! Producers post values of any [`Event`] type; herald matches each event's
//! runtime type against the registered subscriptions and delivers every
//! match on the execution context it declared: a bounded background worker
//! pool, the single serialized "main" context, or inline on the dispatch
//! loop. Posting is fire-and-forget: it never blocks, never fails, and a
//! misbehaving subscriber can never break delivery to the others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use herald::{Bus, Event, Handler, Subscriber, ThreadMode};
//!
//! struct TrackChanged {
//!     index: usize,
//! }
//!
//! impl Event for TrackChanged {}
//!
//! struct Display;
//!
//! impl Subscriber for Display {
//!     fn name(&self) -> &'static str {
//!         "Display"
//!     }
//!
//!     fn handlers(self: Arc<Self>) -> Vec<Handler> {
//!         vec![Handler::with_mode(
//!             "on_track",
//!             ThreadMode::Main,
//!             |e: &TrackChanged| {
//!                 println!("now playing #{}", e.index);
//!                 Ok(())
//!             },
//!         )]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = Bus::default();
//!     bus.register(&Arc::new(Display));
//!
//!     bus.post(TrackChanged { index: 3 });
//!     bus.post_delay(TrackChanged { index: 4 }, Duration::from_millis(250));
//!
//!     tokio::time::sleep(Duration::from_millis(500)).await;
//!     bus.shutdown();
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Event`] | Marker trait for postable values; supports covariant matching |
//! | [`Bus`] | The dispatcher: registration, posting, lifecycle, introspection |
//! | [`Subscriber`] | A registrable object declaring its handler table |
//! | [`Handler`] | One handler entry: name, type filter, mode, callable |
//! | [`ThreadMode`] | Where a handler runs: pool, main context, or inline |
//! | [`TypeFilter`] | Accepted-type side of a subscription |
//! | [`MainContext`] | The serialized context MAIN-mode deliveries land on |
//! | [`BusHandle`] | Clonable producer-only view for bridges and callbacks |
//! | [`Config`] | Pool size, main context, error sink |
//!
//! ## Thread Modes
//!
//! Each handler declares where it runs. `Background` (also the default for
//! entries registered without a mode) delivers on a bounded pool and may
//! complete out of order. `Main` and `MainOrdered` are scheduled onto the
//! one serialized main context, by default a bus-owned worker, or an
//! application-supplied adapter (a UI thread, typically). `Posting` and
//! `Async` run inline on the dispatch loop itself, in strict posting order;
//! a slow inline handler stalls everything behind it, which is sometimes
//! exactly what you want and usually not.
//!
//! ## Delivery Contract
//!
//! There is none, by design. Events with no matching subscription are
//! dropped silently; handler failures and panics are contained, reported to
//! the configured error sink, and dropped. Producers never learn whether
//! anything was delivered. The decoupling is the point; wire an error sink
//! via [`Config::with_error_sink`] when you need eyes on failures.

mod bus;
mod config;
mod dispatch;
mod envelope;
mod error;
mod event;
mod filter;
mod handle;
mod handler;
mod main_context;
mod registry;
mod subscriber;
mod subscription;
mod thread_mode;

pub use bus::Bus;
pub use config::{Config, ErrorSink};
pub use envelope::{Envelope, EventId};
pub use error::{DeliveryFailure, Error, Result};
pub use event::Event;
pub use filter::TypeFilter;
pub use handle::BusHandle;
pub use handler::{Handler, HandlerFn};
pub use main_context::{Job, MainContext, SerialContext};
pub use subscriber::Subscriber;
pub use subscription::SubscriptionInfo;
pub use thread_mode::ThreadMode;
