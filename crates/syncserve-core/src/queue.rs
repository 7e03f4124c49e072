//! Bounded single-producer/single-consumer event queue
//!
//! The queue holds at most [`EVENT_QUEUE_CAPACITY`] undelivered events. When
//! it is full, [`EventSender::send`] waits until the dispatcher takes the
//! previous event. This couples sync progress to delivery speed: a slow or
//! unreachable webhook sink stalls the sync loop rather than letting events
//! pile up in memory. Events are delivered in the order they were produced.

use tokio::sync::mpsc;

use crate::{Error, Event, Result};

/// Undelivered events the queue holds before the producer waits.
pub const EVENT_QUEUE_CAPACITY: usize = 1;

/// Create the engine-to-dispatcher queue with [`EVENT_QUEUE_CAPACITY`].
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    (EventSender { inner: tx }, EventReceiver { inner: rx })
}

/// Producing half, owned by the sync engine.
#[derive(Debug)]
pub struct EventSender {
    inner: mpsc::Sender<Event>,
}

impl EventSender {
    /// Enqueue an event, waiting while the queue is full.
    pub async fn send(&self, event: Event) -> Result<()> {
        self.inner.send(event).await.map_err(|_| Error::QueueClosed)
    }
}

/// Consuming half, owned by the webhook dispatcher.
#[derive(Debug)]
pub struct EventReceiver {
    inner: mpsc::Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once the sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Event> {
        self.inner.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Event> {
        self.inner.try_recv().ok()
    }
}
