//! NotewiseEngine: normalizer → queue → reconciler → store, with queries on top.

use crate::{EngineConfig, Result};
use notewise_core::{
    Applied, ChannelId, DomainEvent, EntityStore, InputId, InputSettings, Queries, Reconciler,
    SelectorCache,
};
use notewise_midi::{
    EventQueue, EventSender, InputDefaults, InputDescriptor, InputRegistry, Normalizer,
    TransportEvent,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters since construction (or the last [`NotewiseEngine::reset`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Events that changed the store.
    pub applied: u64,
    /// Valid events with no effect.
    pub unchanged: u64,
    /// Events naming unknown inputs, channels or notes.
    pub ignored: u64,
    /// Records or byte messages that failed validation.
    pub malformed: u64,
    /// Events lost to a full queue.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    applied: AtomicU64,
    unchanged: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
}

impl Counters {
    fn record(&self, applied: Applied) {
        let counter = match applied {
            Applied::Changed => &self.applied,
            Applied::Unchanged => &self.unchanged,
            Applied::Ignored(_) => &self.ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [&self.applied, &self.unchanged, &self.ignored, &self.malformed] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    store: RwLock<EntityStore>,
    cache: SelectorCache,
    queue: EventQueue,
    sender: EventSender,
    normalizer: Normalizer,
    registry: InputRegistry,
    counters: Counters,
    /// Dropped-event count at the last reset.
    dropped_base: AtomicU64,
    /// Serializes `pump` so events leave the queue and hit the store in order.
    pump_lock: Mutex<()>,
}

/// Live note-state engine.
///
/// Producers on any thread submit raw bytes, transport records or domain
/// events; [`pump`](Self::pump) applies them in arrival order on the calling
/// thread. Consumers pull state through [`read`](Self::read).
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Example
///
/// ```ignore
/// use notewise::prelude::*;
///
/// let engine = NotewiseEngine::builder().build()?;
/// engine.announce_input(InputDescriptor::new("usb-1", "Piano"))?;
/// engine.submit_bytes(&InputId::new("usb-1"), &[0x90, 60, 100], 0.0)?;
/// engine.pump();
///
/// let sounding = engine.read(|q| q.sorted_notes_on(&InputId::new("usb-1").channel(1)));
/// ```
#[derive(Clone)]
pub struct NotewiseEngine {
    inner: Arc<EngineInner>,
}

impl NotewiseEngine {
    pub fn builder() -> crate::NotewiseEngineBuilder {
        crate::NotewiseEngineBuilder::default()
    }

    pub(crate) fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let defaults = InputDefaults {
            octave_offset: config.default_octave_offset,
            reverse_pedal: config.default_reverse_pedal,
        };
        let queue = EventQueue::bounded(config.queue_capacity);
        let inner = EngineInner {
            store: RwLock::new(EntityStore::new()),
            cache: SelectorCache::new(),
            sender: queue.sender(),
            queue,
            normalizer: Normalizer::new(config.normalizer),
            registry: InputRegistry::new(defaults),
            counters: Counters::default(),
            dropped_base: AtomicU64::new(0),
            pump_lock: Mutex::new(()),
            config,
        };
        tracing::debug!(
            "Created notewise engine (queue capacity {})",
            inner.config.queue_capacity
        );
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ==================== Producers ====================

    /// Producer handle for transport threads.
    pub fn sender(&self) -> EventSender {
        self.inner.sender.clone()
    }

    /// Enqueues a domain event. `Ok(false)` if the queue was full.
    pub fn submit(&self, event: DomainEvent) -> Result<bool> {
        Ok(self.inner.sender.send(event)?)
    }

    /// Normalizes and enqueues one MIDI message. `Ok(false)` for messages the
    /// note model doesn't track.
    pub fn submit_bytes(&self, input_id: &InputId, bytes: &[u8], timestamp: f64) -> Result<bool> {
        match self
            .inner
            .normalizer
            .try_normalize_bytes(input_id, bytes, timestamp)
        {
            Ok(Some(event)) => self.submit(event),
            Ok(None) => Ok(false),
            Err(e) => Err(self.malformed(e)),
        }
    }

    pub fn submit_transport(&self, event: TransportEvent) -> Result<bool> {
        match event.into_domain() {
            Ok(event) => self.submit(event),
            Err(e) => Err(self.malformed(e)),
        }
    }

    /// Parses one JSON transport record and enqueues it.
    pub fn submit_json(&self, text: &str) -> Result<bool> {
        match self.inner.normalizer.normalize_json(text) {
            Ok(event) => self.submit(event),
            Err(e) => {
                self.inner.counters.malformed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Dropping malformed transport record: {}", e);
                Err(e.into())
            }
        }
    }

    fn malformed(&self, e: notewise_midi::NormalizeError) -> crate::Error {
        self.inner.counters.malformed.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Dropping malformed event: {}", e);
        e.into()
    }

    // ==================== Input lifecycle ====================
    //
    // The registry only records a change once its event is enqueued. A full
    // queue surfaces as `notewise_midi::Error::QueueFull` and leaves the
    // registry untouched, so the call can be retried after a `pump`.

    /// Registers a device. `Ok(false)` if it was already announced.
    pub fn announce_input(&self, descriptor: InputDescriptor) -> Result<bool> {
        let sender = &self.inner.sender;
        Ok(self.inner.registry.announce(descriptor, |e| sender.send(e))?)
    }

    /// Unregisters a device. `Ok(false)` if it was never announced.
    pub fn withdraw_input(&self, id: &InputId) -> Result<bool> {
        let sender = &self.inner.sender;
        Ok(self.inner.registry.withdraw(id, |e| sender.send(e))?)
    }

    /// Reconciles the announced inputs with the currently visible devices.
    /// Returns how many lifecycle events were enqueued.
    pub fn sync_inputs(&self, visible: impl IntoIterator<Item = InputDescriptor>) -> Result<usize> {
        let sender = &self.inner.sender;
        Ok(self.inner.registry.sync(visible, |e| sender.send(e))?)
    }

    /// Announces a synthesized source and returns its id.
    pub fn virtual_input(&self, name: impl Into<String>) -> Result<InputId> {
        let sender = &self.inner.sender;
        Ok(self.inner.registry.virtual_input(name, |e| sender.send(e))?)
    }

    pub fn inputs(&self) -> Vec<InputDescriptor> {
        self.inner.registry.list()
    }

    // ==================== Writer ====================

    /// Applies every queued event in arrival order. Returns how many were
    /// processed.
    pub fn pump(&self) -> usize {
        let _guard = self.inner.pump_lock.lock();
        let mut processed = 0;
        while let Some(event) = self.inner.queue.try_recv() {
            let _ = self.apply(&event);
            processed += 1;
        }
        if processed > 0 {
            tracing::trace!("Pumped {} event(s)", processed);
        }
        processed
    }

    /// Applies one event immediately, bypassing the queue.
    pub fn dispatch(&self, event: DomainEvent) -> Applied {
        self.apply(&event)
    }

    fn apply(&self, event: &DomainEvent) -> Applied {
        let applied = {
            let mut store = self.inner.store.write();
            Reconciler::new(&mut store).apply(event)
        };
        if let (DomainEvent::InputRemoved(ids), Applied::Changed) = (event, applied) {
            for id in ids {
                self.inner.cache.invalidate_input(id);
            }
        }
        self.inner.counters.record(applied);
        applied
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    // ==================== Administration ====================

    pub fn reset_key_data(&self, channel: &ChannelId) -> Applied {
        let mut store = self.inner.store.write();
        Reconciler::new(&mut store).reset_key_data(channel)
    }

    pub fn update_input(&self, id: &InputId, settings: InputSettings) -> Result<Applied> {
        let mut store = self.inner.store.write();
        Ok(Reconciler::new(&mut store).update_input(id, settings)?)
    }

    /// Releases every key and the pedal of one input.
    pub fn release_all(&self, id: &InputId) -> Applied {
        let mut store = self.inner.store.write();
        Reconciler::new(&mut store).release_all(id)
    }

    /// Drops all state: store, selector cache, registry, queued events and
    /// counters. The store version keeps counting.
    pub fn reset(&self) {
        let _guard = self.inner.pump_lock.lock();
        let discarded = self.inner.queue.drain().count();
        self.inner.store.write().clear();
        self.inner.cache.clear();
        self.inner.registry.clear();
        self.inner.counters.reset();
        self.inner
            .dropped_base
            .store(self.inner.queue.dropped(), Ordering::Relaxed);
        tracing::debug!("Engine reset ({} queued event(s) discarded)", discarded);
    }

    // ==================== Readers ====================

    /// Runs queries against the current state under a read lock.
    pub fn read<R>(&self, f: impl FnOnce(Queries<'_>) -> R) -> R {
        let store = self.inner.store.read();
        f(Queries::new(&store, &self.inner.cache))
    }

    /// Owned copy of the current store.
    pub fn snapshot(&self) -> EntityStore {
        self.inner.store.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.store.read().version()
    }

    pub fn stats(&self) -> EngineStats {
        let counters = &self.inner.counters;
        EngineStats {
            applied: counters.applied.load(Ordering::Relaxed),
            unchanged: counters.unchanged.load(Ordering::Relaxed),
            ignored: counters.ignored.load(Ordering::Relaxed),
            malformed: counters.malformed.load(Ordering::Relaxed),
            dropped: self
                .inner
                .queue
                .dropped()
                .saturating_sub(self.inner.dropped_base.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewise_core::NoteEvent;

    #[test]
    fn test_pump_applies_in_order() {
        let engine = NotewiseEngine::builder().build().unwrap();
        let id = InputId::new("kbd");
        assert!(engine
            .announce_input(InputDescriptor::new(id.clone(), "Keyboard"))
            .unwrap());
        engine.submit_bytes(&id, &[0x90, 60, 100], 0.0).unwrap();
        engine.submit_bytes(&id, &[0x80, 60, 0], 1.0).unwrap();
        assert_eq!(engine.pending(), 3);

        assert_eq!(engine.pump(), 3);
        assert_eq!(engine.pending(), 0);
        assert!(engine.read(|q| q.sorted_notes_on(&id.channel(1)).unwrap().is_empty()));
        assert_eq!(engine.stats().applied, 3);
    }

    #[test]
    fn test_clones_share_state() {
        let engine = NotewiseEngine::builder().build().unwrap();
        let other = engine.clone();
        other
            .announce_input(InputDescriptor::new("kbd", "Keyboard"))
            .unwrap();
        other.pump();
        let applied = engine.dispatch(NoteEvent::note_on("kbd", 1, 60, 0.5).into());
        assert!(applied.is_changed());
        assert!(other.read(|q| q.notes_on_by_channel(&InputId::new("kbd").channel(1), &[60])));
    }

    #[test]
    fn test_reset_clears_everything() {
        let engine = NotewiseEngine::builder().build().unwrap();
        engine
            .announce_input(InputDescriptor::new("kbd", "Keyboard"))
            .unwrap();
        engine.pump();
        let version = engine.version();
        engine.submit(NoteEvent::note_on("kbd", 1, 60, 0.5).into()).unwrap();

        engine.reset();
        assert_eq!(engine.pending(), 0);
        assert!(engine.snapshot().is_empty());
        assert!(engine.inputs().is_empty());
        assert_eq!(engine.stats(), EngineStats::default());
        assert!(engine.version() > version);
    }
}
