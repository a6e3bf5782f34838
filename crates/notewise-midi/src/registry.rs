//! Announced-input bookkeeping.
//!
//! Turns device connect/disconnect notifications into bulk registration and
//! removal events. The registry only remembers which ids are live; all note
//! state lives in the core store.

use crate::{Error, Result};
use notewise_core::{DomainEvent, Input, InputId, InputKind, InputRegistration};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a transport knows about a visible device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub id: InputId,
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub kind: InputKind,
}

impl InputDescriptor {
    pub fn new(id: impl Into<InputId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: None,
            kind: InputKind::Hardware,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Settings given to every newly registered input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputDefaults {
    pub octave_offset: i8,
    pub reverse_pedal: bool,
}

pub struct InputRegistry {
    inputs: RwLock<Vec<InputDescriptor>>,
    next_virtual: AtomicU64,
    defaults: InputDefaults,
}

impl InputRegistry {
    pub fn new(defaults: InputDefaults) -> Self {
        Self {
            inputs: RwLock::new(Vec::new()),
            next_virtual: AtomicU64::new(1),
            defaults,
        }
    }

    pub fn defaults(&self) -> InputDefaults {
        self.defaults
    }

    /// Registers a device and hands its registration event to `deliver`.
    ///
    /// `Ok(false)` if the id is already announced. The registry lock is held
    /// while delivering, and the device is only recorded once `deliver`
    /// reports the event enqueued; a dropped event leaves the registry as it
    /// was and surfaces as [`Error::QueueFull`].
    pub fn announce<F>(&self, descriptor: InputDescriptor, deliver: F) -> Result<bool>
    where
        F: FnOnce(DomainEvent) -> Result<bool>,
    {
        let mut inputs = self.inputs.write();
        if inputs.iter().any(|known| known.id == descriptor.id) {
            tracing::debug!("Input {} already announced", descriptor.id);
            return Ok(false);
        }
        let event: DomainEvent = self.registration(&descriptor).into();
        let kind = event.kind();
        if !deliver(event)? {
            return Err(Error::QueueFull(kind));
        }
        tracing::debug!("Announced input {}: {}", descriptor.id, descriptor.name);
        inputs.push(descriptor);
        Ok(true)
    }

    /// Forgets a device. `Ok(false)` if the id was never announced.
    pub fn withdraw<F>(&self, id: &InputId, deliver: F) -> Result<bool>
    where
        F: FnOnce(DomainEvent) -> Result<bool>,
    {
        let mut inputs = self.inputs.write();
        let Some(index) = inputs.iter().position(|known| &known.id == id) else {
            return Ok(false);
        };
        let event = DomainEvent::InputRemoved(vec![id.clone()]);
        let kind = event.kind();
        if !deliver(event)? {
            return Err(Error::QueueFull(kind));
        }
        inputs.remove(index);
        tracing::debug!("Withdrew input {}", id);
        Ok(true)
    }

    /// Diffs the currently visible devices against the announced set and
    /// delivers at most two events: removals first, so a device that changed
    /// identity is never registered twice, then one merged registration.
    /// Returns how many events were delivered.
    ///
    /// Each half is committed only after its event is enqueued.
    pub fn sync<F>(&self, visible: impl IntoIterator<Item = InputDescriptor>, mut deliver: F) -> Result<usize>
    where
        F: FnMut(DomainEvent) -> Result<bool>,
    {
        let visible: Vec<InputDescriptor> = visible.into_iter().collect();
        let visible_ids: HashSet<&InputId> = visible.iter().map(|d| &d.id).collect();
        let mut delivered = 0;

        let mut inputs = self.inputs.write();
        let removed: Vec<InputId> = inputs
            .iter()
            .filter(|known| !visible_ids.contains(&known.id))
            .map(|known| known.id.clone())
            .collect();
        if !removed.is_empty() {
            let count = removed.len();
            let event = DomainEvent::InputRemoved(removed);
            let kind = event.kind();
            if !deliver(event)? {
                return Err(Error::QueueFull(kind));
            }
            inputs.retain(|known| visible_ids.contains(&known.id));
            tracing::debug!("Sync removed {} input(s)", count);
            delivered += 1;
        }

        let mut seen = HashSet::new();
        let fresh: Vec<&InputDescriptor> = visible
            .iter()
            .filter(|descriptor| !inputs.iter().any(|known| known.id == descriptor.id))
            .filter(|descriptor| seen.insert(&descriptor.id))
            .collect();
        if !fresh.is_empty() {
            let added = fresh
                .iter()
                .fold(InputRegistration::default(), |acc, descriptor| {
                    acc.merge(self.registration(descriptor))
                });
            let event: DomainEvent = added.into();
            let kind = event.kind();
            if !deliver(event)? {
                return Err(Error::QueueFull(kind));
            }
            tracing::debug!("Sync added {} input(s)", fresh.len());
            inputs.extend(fresh.into_iter().cloned());
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Allocates and announces a synthesized source such as a file player.
    pub fn virtual_input<F>(&self, name: impl Into<String>, mut deliver: F) -> Result<InputId>
    where
        F: FnMut(DomainEvent) -> Result<bool>,
    {
        let name = name.into();
        loop {
            let n = self.next_virtual.fetch_add(1, Ordering::Relaxed);
            let id = InputId::new(format!("virtual-{n}"));
            let descriptor =
                InputDescriptor::new(id.clone(), name.clone()).with_kind(InputKind::Virtual);
            // skip ids a transport already handed out
            if self.announce(descriptor, &mut deliver)? {
                return Ok(id);
            }
        }
    }

    pub fn contains(&self, id: &InputId) -> bool {
        self.inputs.read().iter().any(|known| &known.id == id)
    }

    pub fn list(&self) -> Vec<InputDescriptor> {
        self.inputs.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inputs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.read().is_empty()
    }

    pub fn clear(&self) {
        self.inputs.write().clear();
    }

    fn registration(&self, descriptor: &InputDescriptor) -> InputRegistration {
        let mut input = Input::new(descriptor.id.clone(), descriptor.name.clone())
            .with_kind(descriptor.kind)
            .with_octave_offset(self.defaults.octave_offset)
            .with_reverse_pedal(self.defaults.reverse_pedal);
        input.manufacturer = descriptor.manufacturer.clone();
        InputRegistration::for_input(input)
    }
}

impl Default for InputRegistry {
    fn default() -> Self {
        Self::new(InputDefaults::default())
    }
}
