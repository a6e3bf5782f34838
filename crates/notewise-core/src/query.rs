//! Read-only views over the store with per-channel memoization.
//!
//! Derived values are cached as `(channel revision, Arc<value>)`. While a
//! derived value is unchanged, repeated queries return the same `Arc`, even
//! across revisions of its channel, so consumers can compare results with
//! [`Arc::ptr_eq`] to skip redraws.

use crate::chord::ChordEstimator;
use crate::entity::{Channel, Input, Note};
use crate::store::EntityStore;
use crate::theory::{Accidentals, NoteName};
use crate::types::{ChannelId, InputId, NoteId, NoteNumber, PitchClass, PITCH_CLASSES};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueryKey {
    KeyPrevalence,
    SortedNotesOn,
    NoteNames(Accidentals),
    Chord(Accidentals, String),
}

#[derive(Debug, Clone, PartialEq)]
enum CachedValue {
    Prevalence(Arc<[f32; PITCH_CLASSES]>),
    Notes(Arc<[NoteNumber]>),
    Names(Arc<[NoteName]>),
    Chords(Arc<[String]>),
}

/// Memo table shared by every reader of one store.
#[derive(Debug, Default)]
pub struct SelectorCache {
    entries: DashMap<(ChannelId, QueryKey), (u64, CachedValue)>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every entry of a removed input.
    pub fn invalidate_input(&self, input: &InputId) {
        self.entries.retain(|(channel, _), _| !channel.belongs_to(input));
    }
}

/// Query facade over a borrowed store and its cache.
#[derive(Clone, Copy)]
pub struct Queries<'a> {
    store: &'a EntityStore,
    cache: &'a SelectorCache,
}

impl<'a> Queries<'a> {
    pub fn new(store: &'a EntityStore, cache: &'a SelectorCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &'a EntityStore {
        self.store
    }

    pub fn input(&self, id: &InputId) -> Option<&'a Input> {
        self.store.input(id)
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&'a Channel> {
        self.store.channel(id)
    }

    pub fn note(&self, id: &NoteId) -> Option<&'a Note> {
        self.store.note(id)
    }

    /// Whether every note in `notes` is sounding. False for an unknown
    /// channel; true for an empty list.
    pub fn notes_on_by_channel(&self, channel: &ChannelId, notes: &[NoteNumber]) -> bool {
        self.channel(channel)
            .is_some_and(|channel| channel.notes_on.contains_all(notes))
    }

    /// Whether every note in `notes` is physically held.
    pub fn notes_pressed_by_channel(&self, channel: &ChannelId, notes: &[NoteNumber]) -> bool {
        self.channel(channel)
            .is_some_and(|channel| channel.notes_pressed.contains_all(notes))
    }

    /// Whether some octave of every pitch class in `pcs` is sounding.
    pub fn chromatic_notes_on(&self, channel: &ChannelId, pcs: &[PitchClass]) -> bool {
        self.channel(channel).is_some_and(|channel| {
            pcs.iter().all(|&pc| {
                channel
                    .chromatic
                    .get(pc as usize)
                    .is_some_and(|entry| entry.note_on)
            })
        })
    }

    pub fn chromatic_notes_pressed(&self, channel: &ChannelId, pcs: &[PitchClass]) -> bool {
        self.channel(channel).is_some_and(|channel| {
            pcs.iter().all(|&pc| {
                channel
                    .chromatic
                    .get(pc as usize)
                    .is_some_and(|entry| entry.note_pressed)
            })
        })
    }

    pub fn key_prevalence(&self, channel: &ChannelId) -> Option<Arc<[f32; PITCH_CLASSES]>> {
        self.memo(
            channel,
            QueryKey::KeyPrevalence,
            |value| match value {
                CachedValue::Prevalence(v) => Some(v.clone()),
                _ => None,
            },
            |ch| CachedValue::Prevalence(Arc::new(ch.key_prevalence())),
        )
    }

    pub fn sorted_notes_on(&self, channel: &ChannelId) -> Option<Arc<[NoteNumber]>> {
        self.memo(
            channel,
            QueryKey::SortedNotesOn,
            |value| match value {
                CachedValue::Notes(v) => Some(v.clone()),
                _ => None,
            },
            |ch| CachedValue::Notes(ch.notes_on.as_slice().into()),
        )
    }

    /// Sounding notes spelled for display, ascending.
    pub fn note_names(&self, channel: &ChannelId, accidentals: Accidentals) -> Option<Arc<[NoteName]>> {
        self.memo(
            channel,
            QueryKey::NoteNames(accidentals),
            |value| match value {
                CachedValue::Names(v) => Some(v.clone()),
                _ => None,
            },
            |ch| {
                CachedValue::Names(
                    ch.notes_on
                        .iter()
                        .map(|note| NoteName::new(note, accidentals))
                        .collect(),
                )
            },
        )
    }

    pub fn chord_estimate(
        &self,
        channel: &ChannelId,
        estimator: &dyn ChordEstimator,
        accidentals: Accidentals,
    ) -> Option<Arc<[String]>> {
        let key = QueryKey::Chord(accidentals, estimator.cache_key().into_owned());
        self.memo(
            channel,
            key,
            |value| match value {
                CachedValue::Chords(v) => Some(v.clone()),
                _ => None,
            },
            |ch| {
                let names: Vec<NoteName> = ch
                    .notes_on
                    .iter()
                    .map(|note| NoteName::new(note, accidentals))
                    .collect();
                CachedValue::Chords(estimator.estimate(&names).into())
            },
        )
    }

    fn memo<T: ?Sized>(
        &self,
        channel_id: &ChannelId,
        key: QueryKey,
        extract: impl Fn(&CachedValue) -> Option<Arc<T>>,
        compute: impl FnOnce(&Channel) -> CachedValue,
    ) -> Option<Arc<T>> {
        let channel = self.channel(channel_id)?;
        let revision = channel.revision();
        let key = (channel_id.clone(), key);

        if let Some(entry) = self.cache.entries.get(&key) {
            let (cached_revision, value) = entry.value();
            if *cached_revision == revision {
                if let Some(hit) = extract(value) {
                    return Some(hit);
                }
            }
        }

        // A newer revision can still derive an equal value (a sustained
        // note-off, say); the old Arc is kept so consumers see no change.
        let computed = compute(channel);
        let value = match self.cache.entries.get(&key) {
            Some(entry) if entry.value().1 == computed => entry.value().1.clone(),
            _ => computed,
        };
        let result = extract(&value);
        self.cache.entries.insert(key, (revision, value));
        result
    }
}
