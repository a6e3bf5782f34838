//! Bounded FIFO between event producers and the single writer.
//!
//! Producers on any thread hold an [`EventSender`]; sending never blocks.
//! When the queue is full the event is dropped and counted.

use crate::{Error, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use notewise_core::DomainEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub struct EventQueue {
    tx: Sender<DomainEvent>,
    rx: Receiver<DomainEvent>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
}

impl EventQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Yields queued events in arrival order until the queue is empty.
    pub fn drain(&self) -> impl Iterator<Item = DomainEvent> + '_ {
        self.rx.try_iter()
    }

    pub fn try_recv(&self) -> Option<DomainEvent> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events lost to overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::bounded(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<DomainEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Enqueues without blocking. `Ok(false)` if the queue was full and the
    /// event was dropped.
    pub fn send(&self, event: DomainEvent) -> Result<bool> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Event queue full, dropping {} event", event.kind());
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::QueueClosed),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
