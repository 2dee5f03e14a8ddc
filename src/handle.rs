use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::dispatch::MainItem;
use crate::envelope::Envelope;
use crate::event::Event;

/// Cheap, clonable producer-only view of a [`Bus`](crate::Bus).
///
/// Hand one of these to anything that only posts (an IPC response
/// callback, a timer, a decoder thread) without exposing registration or
/// lifecycle control. Posting through a handle is identical to posting
/// through the bus, including after shutdown (accepted, never delivered).
#[derive(Clone)]
pub struct BusHandle {
    pub(crate) background_tx: UnboundedSender<Envelope>,
    pub(crate) main_tx: UnboundedSender<MainItem>,
}

impl BusHandle {
    /// Enqueue onto the background queue. Never blocks, never fails.
    pub fn post<E: Event>(&self, event: E) {
        let _ = self.background_tx.send(Envelope::new(event));
    }

    /// Enqueue onto the main queue. Never blocks, never fails.
    pub fn post_main<E: Event>(&self, event: E) {
        let _ = self.main_tx.send(MainItem::Posted(Envelope::new(event)));
    }

    /// Post after a best-effort delay on an ad-hoc one-shot task. Not
    /// cancellable once scheduled.
    pub fn post_delay<E: Event>(&self, event: E, delay: Duration) {
        let tx = self.background_tx.clone();
        let envelope = Envelope::new(event);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(envelope);
        });
    }
}
