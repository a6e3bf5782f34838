//! Applies domain events to an [`EntityStore`].
//!
//! Each call runs one event to completion. Events that name an input,
//! channel or note the store doesn't know are ignored without touching the
//! store, so late events from an unplugged device are harmless.

use crate::entity::{to_raw_note, InputSettings};
use crate::error::Result;
use crate::event::{DomainEvent, InputRegistration, NoteAction, NoteEvent, NotesOnState, PedalEvent};
use crate::store::EntityStore;
use crate::types::{ChannelId, InputId, NoteNumber};

/// Outcome of applying one event.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The store was mutated and its version advanced.
    Changed,
    /// The event was valid but had no effect.
    Unchanged,
    Ignored(IgnoreReason),
}

impl Applied {
    pub fn is_changed(self) -> bool {
        matches!(self, Applied::Changed)
    }

    pub fn is_ignored(self) -> bool {
        matches!(self, Applied::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownInput,
    UnknownChannel,
    UnknownNote,
    /// Octave offset pushed the note outside 0-127.
    NoteOutOfRange,
}

/// Metadata copied onto the Note entity by note-on/off.
#[derive(Clone, Copy)]
struct Stamp {
    velocity: f32,
    attack: f32,
    release: f32,
    timestamp: f64,
}

impl Stamp {
    fn from_event(event: &NoteEvent) -> Self {
        Self {
            velocity: event.velocity,
            attack: event.attack,
            release: event.release,
            timestamp: event.timestamp,
        }
    }
}

/// Single-writer view over a store.
pub struct Reconciler<'s> {
    store: &'s mut EntityStore,
}

impl<'s> Reconciler<'s> {
    pub fn new(store: &'s mut EntityStore) -> Self {
        Self { store }
    }

    pub fn apply(&mut self, event: &DomainEvent) -> Applied {
        tracing::trace!("apply {} event", event.kind());
        let applied = match event {
            DomainEvent::Note(note) => self.apply_note(note),
            DomainEvent::Pedal(pedal) => self.apply_pedal(pedal),
            DomainEvent::InputAdded(registration) => self.add_inputs(registration),
            DomainEvent::InputRemoved(ids) => self.remove_inputs(ids),
        };
        if let Applied::Ignored(reason) = applied {
            tracing::debug!("ignored {} event: {:?}", event.kind(), reason);
        }
        applied
    }

    // ==================== Lifecycle ====================

    fn add_inputs(&mut self, registration: &InputRegistration) -> Applied {
        if registration.is_empty() {
            return Applied::Unchanged;
        }
        for id in registration.input_ids() {
            tracing::info!("registering input {}", id);
        }
        self.store.upsert_inputs(registration.inputs.iter().cloned());
        self.store
            .upsert_channels(registration.channels.iter().cloned());
        self.store.upsert_notes(registration.notes.iter().cloned());
        Applied::Changed
    }

    fn remove_inputs(&mut self, ids: &[InputId]) -> Applied {
        let removed = self.store.remove_inputs(ids);
        if removed == 0 {
            return Applied::Ignored(IgnoreReason::UnknownInput);
        }
        tracing::info!("removed {} input(s)", removed);
        Applied::Changed
    }

    // ==================== Notes ====================

    fn apply_note(&mut self, event: &NoteEvent) -> Applied {
        let Some(input) = self.store.input(&event.input_id) else {
            return Applied::Ignored(IgnoreReason::UnknownInput);
        };
        let pedal_on = input.pedal_on;
        let channel_id = event.channel_id();
        if self.store.channel(&channel_id).is_none() {
            return Applied::Ignored(IgnoreReason::UnknownChannel);
        }

        match event.action {
            NoteAction::ForceOffAll => self.force_off_all(&channel_id, pedal_on, event.timestamp),
            NoteAction::NoteOn | NoteAction::NoteOff => {
                let Some(note) = input.logical_note(event.raw_note) else {
                    return Applied::Ignored(IgnoreReason::NoteOutOfRange);
                };
                if self.store.note(&channel_id.note(note)).is_none() {
                    return Applied::Ignored(IgnoreReason::UnknownNote);
                }
                let stamp = Stamp::from_event(event);
                if event.action == NoteAction::NoteOn {
                    self.note_on(&channel_id, note, stamp);
                } else {
                    self.note_off(&channel_id, note, pedal_on, stamp);
                }
                self.store.commit_channel(&channel_id);
                Applied::Changed
            }
        }
    }

    fn note_on(&mut self, channel_id: &ChannelId, note: NoteNumber, stamp: Stamp) {
        if let Some(channel) = self.store.channel_mut(channel_id) {
            channel.record_note_on(note);
        }
        if let Some(entity) = self.store.note_mut(&channel_id.note(note)) {
            entity.note_on = true;
            entity.note_pressed = true;
            entity.count = entity.count.saturating_add(1);
            entity.velocity = stamp.velocity;
            entity.attack = stamp.attack;
            entity.release = stamp.release;
            entity.timestamp = stamp.timestamp;
        }
    }

    /// Key release. The note keeps sounding while the pedal is held.
    fn note_off(&mut self, channel_id: &ChannelId, note: NoteNumber, pedal_on: bool, stamp: Stamp) {
        if let Some(channel) = self.store.channel_mut(channel_id) {
            if pedal_on {
                channel.release_key(note);
            } else {
                channel.silence(note);
            }
        }
        if let Some(entity) = self.store.note_mut(&channel_id.note(note)) {
            entity.note_pressed = false;
            if !pedal_on {
                entity.note_on = false;
            }
            entity.release = stamp.release;
            entity.timestamp = stamp.timestamp;
        }
    }

    fn force_off_all(&mut self, channel_id: &ChannelId, pedal_on: bool, timestamp: f64) -> Applied {
        let sounding: Vec<NoteNumber> = match self.store.channel(channel_id) {
            Some(channel) => channel.notes_on.iter().collect(),
            None => return Applied::Ignored(IgnoreReason::UnknownChannel),
        };
        if sounding.is_empty() {
            return Applied::Unchanged;
        }
        let stamp = Stamp {
            velocity: 0.0,
            attack: 0.0,
            release: 0.0,
            timestamp,
        };
        for note in sounding {
            self.note_off(channel_id, note, pedal_on, stamp);
        }
        self.store.commit_channel(channel_id);
        Applied::Changed
    }

    // ==================== Pedal ====================

    fn apply_pedal(&mut self, event: &PedalEvent) -> Applied {
        let Some(input) = self.store.input_mut(&event.input_id) else {
            return Applied::Ignored(IgnoreReason::UnknownInput);
        };
        let was_on = input.pedal_on;
        let pedal_on = input.effective_pedal(event.raw_value);
        let offset = input.manual_octave_offset;
        if self.store.channel(&event.channel_id()).is_none() {
            return Applied::Ignored(IgnoreReason::UnknownChannel);
        }

        let mut changed = was_on != pedal_on;
        if changed {
            if let Some(input) = self.store.input_mut(&event.input_id) {
                input.pedal_on = pedal_on;
            }
        }
        if pedal_on {
            if changed {
                self.store.bump_version();
                return Applied::Changed;
            }
            return Applied::Unchanged;
        }

        let event_channel = event.channel_id();
        let channel_ids: Vec<ChannelId> = self
            .store
            .channels_of(&event.input_id)
            .into_iter()
            .map(|channel| channel.id.clone())
            .collect();
        let mut touched = Vec::new();
        for channel_id in channel_ids {
            let held = if channel_id == event_channel {
                event.notes_on_state.as_deref()
            } else {
                None
            };
            if self.release_sustained(&channel_id, held, offset) {
                touched.push(channel_id);
            }
        }

        changed |= !touched.is_empty();
        if !changed {
            return Applied::Unchanged;
        }
        if touched.is_empty() {
            self.store.bump_version();
        }
        for channel_id in &touched {
            self.store.commit_channel(channel_id);
        }
        Applied::Changed
    }

    /// Drops every sounding note that is neither pressed nor held in the raw
    /// key-state array. Returns whether anything was dropped.
    fn release_sustained(
        &mut self,
        channel_id: &ChannelId,
        held: Option<&NotesOnState>,
        offset: i8,
    ) -> bool {
        let Some(channel) = self.store.channel_mut(channel_id) else {
            return false;
        };
        let held_raw = |note: NoteNumber| {
            held.zip(to_raw_note(note, offset))
                .is_some_and(|(state, raw)| state[raw as usize])
        };
        let dropped: Vec<NoteNumber> = channel
            .notes_on
            .iter()
            .filter(|&note| !channel.notes_pressed.contains(note) && !held_raw(note))
            .collect();
        for &note in &dropped {
            channel.silence(note);
        }
        for &note in &dropped {
            if let Some(entity) = self.store.note_mut(&channel_id.note(note)) {
                entity.note_on = false;
            }
        }
        !dropped.is_empty()
    }

    // ==================== Administration ====================

    /// Zeroes the key histogram of one channel. Sounding notes are kept.
    pub fn reset_key_data(&mut self, channel_id: &ChannelId) -> Applied {
        let Some(channel) = self.store.channel_mut(channel_id) else {
            return Applied::Ignored(IgnoreReason::UnknownChannel);
        };
        if channel.total_note_count == 0 && channel.key_data.iter().all(|k| k.note_count == 0) {
            return Applied::Unchanged;
        }
        channel.reset_key_data();
        self.store.commit_channel(channel_id);
        tracing::debug!("reset key data for {}", channel_id);
        Applied::Changed
    }

    /// Applies per-input settings. A polarity change takes effect at the next
    /// pedal event; the stored `pedal_on` is left as is.
    pub fn update_input(&mut self, id: &InputId, settings: InputSettings) -> Result<Applied> {
        settings.validate()?;
        let Some(input) = self.store.input_mut(id) else {
            return Ok(Applied::Ignored(IgnoreReason::UnknownInput));
        };
        let mut changed = false;
        if let Some(offset) = settings.manual_octave_offset {
            changed |= input.manual_octave_offset != offset;
            input.manual_octave_offset = offset;
        }
        if let Some(reverse) = settings.reverse_pedal {
            changed |= input.reverse_pedal != reverse;
            input.reverse_pedal = reverse;
        }
        if !changed {
            return Ok(Applied::Unchanged);
        }
        self.store.bump_version();
        tracing::debug!("updated settings for input {}: {:?}", id, settings);
        Ok(Applied::Changed)
    }

    /// Panic button: every key and the pedal of `id` released at once.
    pub fn release_all(&mut self, id: &InputId) -> Applied {
        let Some(input) = self.store.input_mut(id) else {
            return Applied::Ignored(IgnoreReason::UnknownInput);
        };
        let mut changed = input.pedal_on;
        input.pedal_on = false;

        let channel_ids: Vec<ChannelId> = self
            .store
            .channels_of(id)
            .into_iter()
            .filter(|channel| !channel.notes_on.is_empty())
            .map(|channel| channel.id.clone())
            .collect();
        for channel_id in &channel_ids {
            let sounding: Vec<NoteNumber> = self
                .store
                .channel(channel_id)
                .map(|channel| channel.notes_on.iter().collect())
                .unwrap_or_default();
            if let Some(channel) = self.store.channel_mut(channel_id) {
                channel.silence_all();
            }
            for note in sounding {
                if let Some(entity) = self.store.note_mut(&channel_id.note(note)) {
                    entity.note_on = false;
                    entity.note_pressed = false;
                }
            }
            self.store.commit_channel(channel_id);
            changed = true;
        }

        if !changed {
            return Applied::Unchanged;
        }
        if channel_ids.is_empty() {
            self.store.bump_version();
        }
        tracing::info!("released all notes on input {}", id);
        Applied::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Input;

    fn store_with(input: Input) -> EntityStore {
        let mut store = EntityStore::new();
        let mut reconciler = Reconciler::new(&mut store);
        let applied = reconciler.apply(&InputRegistration::for_input(input).into());
        assert_eq!(applied, Applied::Changed);
        store
    }

    fn apply(store: &mut EntityStore, event: impl Into<DomainEvent>) -> Applied {
        Reconciler::new(store).apply(&event.into())
    }

    fn notes_on(store: &EntityStore, input: &str, channel: u8) -> Vec<u8> {
        store
            .channel(&InputId::new(input).channel(channel))
            .map(|ch| ch.notes_on.as_slice().to_vec())
            .unwrap_or_default()
    }

    fn notes_pressed(store: &EntityStore, input: &str, channel: u8) -> Vec<u8> {
        store
            .channel(&InputId::new(input).channel(channel))
            .map(|ch| ch.notes_pressed.as_slice().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_note_on_updates_note_entity() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let event = NoteEvent::note_on("kbd", 1, 60, 0.5).at(12.5);
        assert!(apply(&mut store, event).is_changed());

        let note = store.note(&InputId::new("kbd").channel(1).note(60)).unwrap();
        assert!(note.note_on && note.note_pressed);
        assert_eq!(note.count, 1);
        assert_eq!(note.velocity, 0.5);
        assert_eq!(note.attack, 0.5);
        assert_eq!(note.timestamp, 12.5);
        assert_eq!(notes_on(&store, "kbd", 1), vec![60]);
    }

    #[test]
    fn test_note_off_without_pedal_silences() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.5));
        let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, 60).with_release(0.3).at(2.0));

        assert!(notes_on(&store, "kbd", 1).is_empty());
        let note = store.note(&InputId::new("kbd").channel(1).note(60)).unwrap();
        assert!(!note.note_on);
        assert_eq!(note.release, 0.3);
        assert_eq!(note.timestamp, 2.0);
    }

    #[test]
    fn test_sustain_keeps_released_note_sounding() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.8));
        let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, 60));

        assert_eq!(notes_on(&store, "kbd", 1), vec![60]);
        assert!(notes_pressed(&store, "kbd", 1).is_empty());
        let ch = store.channel(&InputId::new("kbd").channel(1)).unwrap();
        assert!(ch.chromatic[0].note_on);
        assert!(!ch.chromatic[0].note_pressed);
        let note = store.note(&InputId::new("kbd").channel(1).note(60)).unwrap();
        assert!(note.note_on);
        assert!(!note.note_pressed);
    }

    #[test]
    fn test_pedal_up_clears_released_notes() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        for note in [60, 64] {
            let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, note, 0.8));
            let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, note));
        }
        assert_eq!(notes_on(&store, "kbd", 1), vec![60, 64]);

        assert!(apply(&mut store, PedalEvent::up("kbd", 1)).is_changed());
        assert!(notes_on(&store, "kbd", 1).is_empty());
        assert!(!store.input(&InputId::new("kbd")).unwrap().pedal_on);
    }

    #[test]
    fn test_pedal_up_respects_raw_state() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        for note in [60, 64] {
            let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, note, 0.8));
            let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, note));
        }
        let mut state = [false; 128];
        state[60] = true;
        let _ = apply(&mut store, PedalEvent::up("kbd", 1).with_notes_on_state(state));

        assert_eq!(notes_on(&store, "kbd", 1), vec![60]);
        assert!(!store.note(&InputId::new("kbd").channel(1).note(64)).unwrap().note_on);
    }

    #[test]
    fn test_pedal_up_keeps_pressed_notes() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.8));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 67, 0.8));
        let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, 67));
        let _ = apply(&mut store, PedalEvent::up("kbd", 1));

        assert_eq!(notes_on(&store, "kbd", 1), vec![60]);
        assert_eq!(notes_pressed(&store, "kbd", 1), vec![60]);
    }

    #[test]
    fn test_pedal_up_reconciles_every_channel() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 2, 50, 0.8));
        let _ = apply(&mut store, NoteEvent::note_off("kbd", 2, 50));
        assert_eq!(notes_on(&store, "kbd", 2), vec![50]);

        let _ = apply(&mut store, PedalEvent::up("kbd", 1));
        assert!(notes_on(&store, "kbd", 2).is_empty());
    }

    #[test]
    fn test_reverse_pedal_polarity() {
        let mut store = store_with(Input::new("kbd", "Keyboard").with_reverse_pedal(true));
        let _ = apply(&mut store, PedalEvent::new("kbd", 1, true));
        assert!(store.input(&InputId::new("kbd")).unwrap().pedal_on);
        let _ = apply(&mut store, PedalEvent::new("kbd", 1, false));
        assert!(!store.input(&InputId::new("kbd")).unwrap().pedal_on);
    }

    #[test]
    fn test_octave_offset_maps_and_indexes_raw_state() {
        let mut store = store_with(Input::new("kbd", "Keyboard").with_octave_offset(1));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.8));
        let _ = apply(&mut store, NoteEvent::note_off("kbd", 1, 60));
        assert_eq!(notes_on(&store, "kbd", 1), vec![72]);

        let mut state = [false; 128];
        state[60] = true;
        let _ = apply(&mut store, PedalEvent::up("kbd", 1).with_notes_on_state(state));
        assert_eq!(notes_on(&store, "kbd", 1), vec![72]);
    }

    #[test]
    fn test_out_of_range_note_is_ignored() {
        let mut store = store_with(Input::new("kbd", "Keyboard").with_octave_offset(2));
        let before = store.clone();
        let applied = apply(&mut store, NoteEvent::note_on("kbd", 1, 120, 0.8));
        assert_eq!(applied, Applied::Ignored(IgnoreReason::NoteOutOfRange));
        assert_eq!(store, before);
    }

    #[test]
    fn test_unknown_ids_leave_store_untouched() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let before = store.clone();

        let events: Vec<DomainEvent> = vec![
            NoteEvent::note_on("ghost", 1, 60, 0.5).into(),
            NoteEvent::note_off("ghost", 1, 60).into(),
            NoteEvent::force_off_all("ghost", 1).into(),
            PedalEvent::down("ghost", 1).into(),
            NoteEvent::note_on("kbd", 17, 60, 0.5).into(),
            DomainEvent::InputRemoved(vec![InputId::new("ghost")]),
        ];
        for event in &events {
            assert!(Reconciler::new(&mut store).apply(event).is_ignored());
        }
        assert_eq!(store, before);
        assert_eq!(store.version(), before.version());
    }

    #[test]
    fn test_note_off_without_note_on_is_tolerated() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        assert!(apply(&mut store, NoteEvent::note_off("kbd", 1, 61)).is_changed());
        assert!(notes_on(&store, "kbd", 1).is_empty());
    }

    #[test]
    fn test_force_off_all_respects_pedal() {
        let mut store = store_with(Input::new("vf", "File player"));
        for note in [48, 52, 55] {
            let _ = apply(&mut store, NoteEvent::note_on("vf", 3, note, 0.5));
        }
        let _ = apply(&mut store, PedalEvent::down("vf", 3));
        let _ = apply(&mut store, NoteEvent::force_off_all("vf", 3));
        assert_eq!(notes_on(&store, "vf", 3), vec![48, 52, 55]);
        assert!(notes_pressed(&store, "vf", 3).is_empty());

        let _ = apply(&mut store, PedalEvent::up("vf", 3));
        let _ = apply(&mut store, NoteEvent::note_on("vf", 3, 60, 0.5));
        let _ = apply(&mut store, NoteEvent::force_off_all("vf", 3));
        assert!(notes_on(&store, "vf", 3).is_empty());
    }

    #[test]
    fn test_force_off_all_does_not_reapply_offset() {
        let mut store = store_with(Input::new("vf", "File player").with_octave_offset(-1));
        let _ = apply(&mut store, NoteEvent::note_on("vf", 1, 72, 0.5));
        assert_eq!(notes_on(&store, "vf", 1), vec![60]);
        let _ = apply(&mut store, NoteEvent::force_off_all("vf", 1));
        assert!(notes_on(&store, "vf", 1).is_empty());
        assert!(!store.note(&InputId::new("vf").channel(1).note(60)).unwrap().note_on);
    }

    #[test]
    fn test_pedal_down_twice_is_unchanged() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        assert!(apply(&mut store, PedalEvent::down("kbd", 1)).is_changed());
        let version = store.version();
        assert_eq!(apply(&mut store, PedalEvent::down("kbd", 1)), Applied::Unchanged);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_revision_moves_only_for_touched_channel() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let ch1 = InputId::new("kbd").channel(1);
        let ch2 = InputId::new("kbd").channel(2);
        let rev2 = store.channel(&ch2).unwrap().revision();
        let rev1 = store.channel(&ch1).unwrap().revision();

        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.5));
        assert!(store.channel(&ch1).unwrap().revision() > rev1);
        assert_eq!(store.channel(&ch2).unwrap().revision(), rev2);
    }

    #[test]
    fn test_reset_key_data_keeps_sounding_notes() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.5));
        let ch = InputId::new("kbd").channel(1);
        assert!(Reconciler::new(&mut store).reset_key_data(&ch).is_changed());
        let channel = store.channel(&ch).unwrap();
        assert_eq!(channel.total_note_count, 0);
        assert_eq!(channel.notes_on.as_slice(), &[60]);
        assert_eq!(Reconciler::new(&mut store).reset_key_data(&ch), Applied::Unchanged);
    }

    #[test]
    fn test_update_input_settings() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let id = InputId::new("kbd");
        let settings = InputSettings {
            manual_octave_offset: Some(-1),
            reverse_pedal: Some(true),
        };
        let applied = Reconciler::new(&mut store).update_input(&id, settings).unwrap();
        assert!(applied.is_changed());
        let input = store.input(&id).unwrap();
        assert_eq!(input.manual_octave_offset, -1);
        assert!(input.reverse_pedal);
        assert!(!input.pedal_on);

        let bad = InputSettings {
            manual_octave_offset: Some(40),
            reverse_pedal: None,
        };
        assert!(Reconciler::new(&mut store).update_input(&id, bad).is_err());
    }

    #[test]
    fn test_release_all() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, PedalEvent::down("kbd", 1));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.5));
        let _ = apply(&mut store, NoteEvent::note_on("kbd", 5, 40, 0.5));

        let id = InputId::new("kbd");
        assert!(Reconciler::new(&mut store).release_all(&id).is_changed());
        assert!(notes_on(&store, "kbd", 1).is_empty());
        assert!(notes_on(&store, "kbd", 5).is_empty());
        assert!(!store.input(&id).unwrap().pedal_on);
        assert!(!store.note(&id.channel(5).note(40)).unwrap().note_on);
        assert_eq!(Reconciler::new(&mut store).release_all(&id), Applied::Unchanged);
    }

    #[test]
    fn test_remove_then_late_events_are_noops() {
        let mut store = store_with(Input::new("kbd", "Keyboard"));
        let _ = apply(&mut store, DomainEvent::InputRemoved(vec![InputId::new("kbd")]));
        assert!(store.is_empty());
        let applied = apply(&mut store, NoteEvent::note_on("kbd", 1, 60, 0.5));
        assert_eq!(applied, Applied::Ignored(IgnoreReason::UnknownInput));
    }
}
