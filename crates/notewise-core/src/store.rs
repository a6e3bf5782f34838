//! Entity store: inputs, channels and notes keyed by composite ids.
//!
//! Plain CRUD plus version bookkeeping. Cross-entity consistency is the
//! reconciler's responsibility, not the store's.

use crate::entity::{Channel, Input, Note};
use crate::types::{ChannelId, InputId, NoteId};
use std::collections::{HashMap, HashSet};

/// Owns every entity. Construct one per engine (or per test); there is no
/// process-wide instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    inputs: HashMap<InputId, Input>,
    channels: HashMap<ChannelId, Channel>,
    notes: HashMap<NoteId, Note>,
    /// Bumped by every mutation. Never reset, so channel revisions stamped
    /// from it stay unique across remove/re-add cycles.
    version: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    // ==================== Reads ====================

    pub fn input(&self, id: &InputId) -> Option<&Input> {
        self.inputs.get(id)
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs.values()
    }

    /// Channels of one input in channel order.
    pub fn channels_of(&self, input: &InputId) -> Vec<&Channel> {
        let mut channels: Vec<_> = self
            .channels
            .values()
            .filter(|channel| channel.id.belongs_to(input))
            .collect();
        channels.sort_by_key(|channel| channel.id.channel);
        channels
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.channels.is_empty() && self.notes.is_empty()
    }

    // ==================== Writes ====================

    pub fn upsert_inputs(&mut self, inputs: impl IntoIterator<Item = Input>) {
        for input in inputs {
            self.inputs.insert(input.id.clone(), input);
        }
        self.bump_version();
    }

    /// Upserted channels are stamped with the new store version.
    pub fn upsert_channels(&mut self, channels: impl IntoIterator<Item = Channel>) {
        let version = self.bump_version();
        for mut channel in channels {
            channel.revision = version;
            self.channels.insert(channel.id.clone(), channel);
        }
    }

    pub fn upsert_notes(&mut self, notes: impl IntoIterator<Item = Note>) {
        for note in notes {
            self.notes.insert(note.id.clone(), note);
        }
        self.bump_version();
    }

    /// Removes the inputs and every channel and note derived from them.
    /// Returns how many inputs were actually present.
    pub fn remove_inputs<'a>(&mut self, ids: impl IntoIterator<Item = &'a InputId>) -> usize {
        let removed: HashSet<InputId> = ids
            .into_iter()
            .filter(|id| self.inputs.remove(*id).is_some())
            .cloned()
            .collect();
        if removed.is_empty() {
            return 0;
        }
        self.channels
            .retain(|id, _| !removed.contains(&id.input));
        self.notes
            .retain(|id, _| !removed.contains(&id.channel.input));
        self.bump_version();
        removed.len()
    }

    /// Drops every entity. The version keeps counting.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.channels.clear();
        self.notes.clear();
        self.bump_version();
    }

    // ==================== Reconciler access ====================

    pub(crate) fn input_mut(&mut self, id: &InputId) -> Option<&mut Input> {
        self.inputs.get_mut(id)
    }

    pub(crate) fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id)
    }

    pub(crate) fn note_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
        self.notes.get_mut(id)
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Bumps the version and stamps it on a channel that was just mutated.
    pub(crate) fn commit_channel(&mut self, id: &ChannelId) {
        let version = self.bump_version();
        if let Some(channel) = self.channels.get_mut(id) {
            channel.revision = version;
        }
    }
}
