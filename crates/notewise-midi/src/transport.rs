//! Already-shaped records delivered by a transport collaborator.
//!
//! Fields are optional on the wire and checked in
//! [`TransportEvent::into_domain`], so a record missing a field is reported
//! as malformed instead of failing deserialization wholesale.

use crate::error::{NormalizeError, Result};
use crate::normalizer::scale;
use notewise_core::{is_valid_channel, DomainEvent, NoteEvent, NotesOnState, PedalEvent};
use serde::{Deserialize, Serialize};

pub const NOTE_ON: &str = "noteon";
pub const NOTE_OFF: &str = "noteoff";
pub const TURN_OFF_ACTIVE_NOTES: &str = "TURN_OFF_ACTIVE_NOTES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventHandler")]
pub enum TransportEvent {
    #[serde(rename = "note")]
    Note(NoteRecord),
    #[serde(rename = "pedalEvent")]
    Pedal(PedalRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// `[status, note, velocity]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PedalRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_on_state: Option<Vec<bool>>,
    /// Raw switch level; see [`PedalEvent::raw_value`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pedal_on: Option<bool>,
}

impl TransportEvent {
    pub fn into_domain(self) -> std::result::Result<DomainEvent, NormalizeError> {
        match self {
            TransportEvent::Note(record) => record.into_domain(),
            TransportEvent::Pedal(record) => record.into_domain(),
        }
    }
}

fn checked_channel(channel: Option<u8>) -> std::result::Result<u8, NormalizeError> {
    let channel = channel.ok_or(NormalizeError::MissingField("channel"))?;
    if !is_valid_channel(channel) {
        return Err(NormalizeError::ChannelOutOfRange(channel));
    }
    Ok(channel)
}

impl NoteRecord {
    fn into_domain(self) -> std::result::Result<DomainEvent, NormalizeError> {
        let input_id = self.input_id.ok_or(NormalizeError::MissingField("inputId"))?;
        let event_type = self
            .event_type
            .ok_or(NormalizeError::MissingField("eventType"))?;
        let channel = checked_channel(self.channel)?;
        let timestamp = self.timestamp.unwrap_or_default();

        if event_type == TURN_OFF_ACTIVE_NOTES {
            return Ok(NoteEvent::force_off_all(input_id, channel).at(timestamp).into());
        }

        let data = self.event_data.unwrap_or_default();
        let note = *data.get(1).ok_or(NormalizeError::MissingField("eventData"))?;
        let data_velocity = data.get(2).copied().map(scale).unwrap_or_default();

        let event = match event_type.as_str() {
            NOTE_ON => {
                let velocity = self.velocity.unwrap_or(data_velocity);
                NoteEvent::note_on(input_id, channel, note, velocity)
                    .with_attack(self.attack.unwrap_or(velocity))
                    .with_release(self.release.unwrap_or_default())
            }
            NOTE_OFF => NoteEvent::note_off(input_id, channel, note)
                .with_release(self.release.unwrap_or(data_velocity)),
            _ => return Err(NormalizeError::UnknownEventType(event_type.clone())),
        };
        Ok(event.at(timestamp).into())
    }
}

impl PedalRecord {
    fn into_domain(self) -> std::result::Result<DomainEvent, NormalizeError> {
        let input_id = self.input_id.ok_or(NormalizeError::MissingField("inputId"))?;
        let channel = checked_channel(self.channel)?;
        let raw_value = self.pedal_on.ok_or(NormalizeError::MissingField("pedalOn"))?;

        let mut event = PedalEvent::new(input_id, channel, raw_value);
        if let Some(state) = self.notes_on_state {
            let len = state.len();
            let state: NotesOnState = state
                .try_into()
                .map_err(|_| NormalizeError::NotesOnStateLength(len))?;
            event = event.with_notes_on_state(state);
        }
        Ok(event.into())
    }
}

/// Parses and validates one JSON transport record.
pub fn normalize_json(text: &str) -> Result<DomainEvent> {
    let event: TransportEvent = serde_json::from_str(text)?;
    Ok(event.into_domain()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use notewise_core::NoteAction;

    #[test]
    fn test_note_on_record() {
        let json = r#"{
            "eventHandler": "note",
            "inputId": "kbd",
            "eventType": "noteon",
            "eventData": [144, 60, 100],
            "channel": 1,
            "timestamp": 3.25,
            "velocity": 0.5
        }"#;
        let DomainEvent::Note(event) = normalize_json(json).unwrap() else {
            panic!("Expected note event");
        };
        assert_eq!(event.action, NoteAction::NoteOn);
        assert_eq!(event.raw_note, 60);
        assert_eq!(event.velocity, 0.5);
        assert_eq!(event.attack, 0.5);
        assert_eq!(event.timestamp, 3.25);
    }

    #[test]
    fn test_velocity_falls_back_to_event_data() {
        let json = r#"{"eventHandler":"note","inputId":"kbd","eventType":"noteon","eventData":[144,60,127],"channel":2}"#;
        let DomainEvent::Note(event) = normalize_json(json).unwrap() else {
            panic!("Expected note event");
        };
        assert_eq!(event.velocity, 1.0);
        assert_eq!(event.channel, 2);
    }

    #[test]
    fn test_turn_off_active_notes() {
        let json = r#"{"eventHandler":"note","inputId":"player-1","eventType":"TURN_OFF_ACTIVE_NOTES","channel":5}"#;
        let DomainEvent::Note(event) = normalize_json(json).unwrap() else {
            panic!("Expected note event");
        };
        assert_eq!(event.action, NoteAction::ForceOffAll);
        assert_eq!(event.channel, 5);
    }

    #[test]
    fn test_pedal_record_with_state() {
        let mut state = vec![false; 128];
        state[60] = true;
        let record = TransportEvent::Pedal(PedalRecord {
            input_id: Some("kbd".into()),
            channel: Some(1),
            notes_on_state: Some(state),
            pedal_on: Some(true),
        });
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""eventHandler":"pedalEvent""#));

        let DomainEvent::Pedal(event) = normalize_json(&json).unwrap() else {
            panic!("Expected pedal event");
        };
        assert!(event.raw_value);
        let state = event.notes_on_state.unwrap();
        assert!(state[60]);
        assert!(!state[61]);
    }

    #[test]
    fn test_malformed_records() {
        let missing_channel = r#"{"eventHandler":"note","inputId":"kbd","eventType":"noteon","eventData":[144,60,1]}"#;
        assert!(matches!(
            normalize_json(missing_channel),
            Err(Error::Normalize(NormalizeError::MissingField("channel")))
        ));

        let bad_channel = r#"{"eventHandler":"pedalEvent","inputId":"kbd","channel":17,"pedalOn":true}"#;
        assert!(matches!(
            normalize_json(bad_channel),
            Err(Error::Normalize(NormalizeError::ChannelOutOfRange(17)))
        ));

        let short_state = r#"{"eventHandler":"pedalEvent","inputId":"kbd","channel":1,"pedalOn":true,"notesOnState":[true]}"#;
        assert!(matches!(
            normalize_json(short_state),
            Err(Error::Normalize(NormalizeError::NotesOnStateLength(1)))
        ));

        let unknown = r#"{"eventHandler":"note","inputId":"kbd","eventType":"aftertouch","eventData":[160,60,1],"channel":1}"#;
        assert!(matches!(
            normalize_json(unknown),
            Err(Error::Normalize(NormalizeError::UnknownEventType(_)))
        ));

        assert!(matches!(normalize_json("{not json"), Err(Error::Json(_))));
        assert!(matches!(
            normalize_json(r#"{"eventHandler":"mystery"}"#),
            Err(Error::Json(_))
        ));
    }
}
