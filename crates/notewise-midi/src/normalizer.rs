//! Raw MIDI bytes to domain events.

use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, Result};
use crate::transport::TransportEvent;
use midi_msg::{ChannelVoiceMsg, MidiMsg};
use notewise_core::{DomainEvent, InputId, NoteEvent, PedalEvent};

/// CC 120.
const ALL_SOUND_OFF: u8 = 120;
/// CC 123.
const ALL_NOTES_OFF: u8 = 123;

/// Stateless translator from transport callbacks to [`DomainEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Like [`try_normalize_bytes`](Self::try_normalize_bytes), logging and
    /// discarding malformed input.
    pub fn normalize_bytes(&self, input_id: &InputId, bytes: &[u8], timestamp: f64) -> Option<DomainEvent> {
        match self.try_normalize_bytes(input_id, bytes, timestamp) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Dropping MIDI message from {}: {}", input_id, e);
                None
            }
        }
    }

    /// Parses one MIDI 1.0 message. `Ok(None)` for well-formed messages the
    /// note model doesn't track.
    pub fn try_normalize_bytes(
        &self,
        input_id: &InputId,
        bytes: &[u8],
        timestamp: f64,
    ) -> std::result::Result<Option<DomainEvent>, NormalizeError> {
        let (msg, _len) =
            MidiMsg::from_midi(bytes).map_err(|e| NormalizeError::Bytes(format!("{:?}", e)))?;

        let event = match msg {
            MidiMsg::ChannelVoice { channel, msg } => {
                let channel = channel as u8 + 1;
                match msg {
                    ChannelVoiceMsg::NoteOn { note, velocity } if velocity > 0 => Some(
                        NoteEvent::note_on(input_id.clone(), channel, note, scale(velocity))
                            .at(timestamp)
                            .into(),
                    ),
                    ChannelVoiceMsg::NoteOn { note, .. } => Some(
                        NoteEvent::note_off(input_id.clone(), channel, note)
                            .at(timestamp)
                            .into(),
                    ),
                    ChannelVoiceMsg::NoteOff { note, velocity } => Some(
                        NoteEvent::note_off(input_id.clone(), channel, note)
                            .with_release(scale(velocity))
                            .at(timestamp)
                            .into(),
                    ),
                    ChannelVoiceMsg::ControlChange { .. } => {
                        self.control_change(input_id, channel, bytes)
                    }
                    _ => None,
                }
            }
            MidiMsg::ChannelMode { channel, .. } => {
                self.control_change(input_id, channel as u8 + 1, bytes)
            }
            _ => None,
        };

        if event.is_none() {
            tracing::trace!("Ignoring MIDI message {:02X?} from {}", bytes, input_id);
        }
        Ok(event)
    }

    /// Controller number and value come from the status message itself so
    /// every controller is handled the same way, whatever variant the parser
    /// chose for it.
    fn control_change(&self, input_id: &InputId, channel: u8, bytes: &[u8]) -> Option<DomainEvent> {
        let (&control, &value) = (bytes.get(1)?, bytes.get(2)?);
        if control == self.config.sustain_controller {
            let at_rest = value < self.config.pedal_threshold;
            return Some(PedalEvent::new(input_id.clone(), channel, at_rest).into());
        }
        if self.config.all_notes_off && matches!(control, ALL_SOUND_OFF | ALL_NOTES_OFF) {
            return Some(NoteEvent::force_off_all(input_id.clone(), channel).into());
        }
        None
    }

    /// Validates a transport record.
    pub fn normalize_transport(&self, event: TransportEvent) -> Result<DomainEvent> {
        Ok(event.into_domain()?)
    }

    /// Parses and validates one JSON transport record.
    pub fn normalize_json(&self, text: &str) -> Result<DomainEvent> {
        crate::transport::normalize_json(text)
    }
}

/// 7-bit MIDI value to 0.0..=1.0.
#[inline]
pub fn scale(value: u8) -> f32 {
    f32::from(value.min(127)) / 127.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewise_core::NoteAction;

    fn normalize(bytes: &[u8]) -> Option<DomainEvent> {
        Normalizer::default().normalize_bytes(&InputId::new("kbd"), bytes, 1.5)
    }

    fn note(event: Option<DomainEvent>) -> NoteEvent {
        match event {
            Some(DomainEvent::Note(note)) => note,
            other => panic!("Expected note event, got {:?}", other),
        }
    }

    fn pedal(event: Option<DomainEvent>) -> PedalEvent {
        match event {
            Some(DomainEvent::Pedal(pedal)) => pedal,
            other => panic!("Expected pedal event, got {:?}", other),
        }
    }

    #[test]
    fn test_note_on() {
        let event = note(normalize(&[0x90, 60, 127]));
        assert_eq!(event.action, NoteAction::NoteOn);
        assert_eq!(event.channel, 1);
        assert_eq!(event.raw_note, 60);
        assert_eq!(event.velocity, 1.0);
        assert_eq!(event.attack, 1.0);
        assert_eq!(event.timestamp, 1.5);
    }

    #[test]
    fn test_note_on_zero_velocity_is_off() {
        let event = note(normalize(&[0x93, 64, 0]));
        assert_eq!(event.action, NoteAction::NoteOff);
        assert_eq!(event.channel, 4);
    }

    #[test]
    fn test_note_off_carries_release() {
        let event = note(normalize(&[0x8F, 48, 127]));
        assert_eq!(event.action, NoteAction::NoteOff);
        assert_eq!(event.channel, 16);
        assert_eq!(event.release, 1.0);
    }

    #[test]
    fn test_sustain_controller() {
        let pressed = pedal(normalize(&[0xB0, 64, 127]));
        assert!(!pressed.raw_value);
        assert!(pressed.notes_on_state.is_none());
        let released = pedal(normalize(&[0xB0, 64, 0]));
        assert!(released.raw_value);
    }

    #[test]
    fn test_custom_sustain_controller() {
        let normalizer = Normalizer::new(NormalizerConfig {
            sustain_controller: 66,
            pedal_threshold: 10,
            ..Default::default()
        });
        let id = InputId::new("kbd");
        let event = normalizer.normalize_bytes(&id, &[0xB1, 66, 20], 0.0);
        assert!(!pedal(event).raw_value);
        assert!(normalizer.normalize_bytes(&id, &[0xB1, 64, 127], 0.0).is_none());
    }

    #[test]
    fn test_all_notes_off() {
        let event = note(normalize(&[0xB2, 123, 0]));
        assert_eq!(event.action, NoteAction::ForceOffAll);
        assert_eq!(event.channel, 3);
        let event = note(normalize(&[0xB0, 120, 0]));
        assert_eq!(event.action, NoteAction::ForceOffAll);
    }

    #[test]
    fn test_all_notes_off_disabled() {
        let normalizer = Normalizer::new(NormalizerConfig {
            all_notes_off: false,
            ..Default::default()
        });
        assert!(normalizer
            .normalize_bytes(&InputId::new("kbd"), &[0xB0, 123, 0], 0.0)
            .is_none());
    }

    #[test]
    fn test_untracked_messages() {
        assert!(normalize(&[0xB0, 7, 100]).is_none());
        assert!(normalize(&[0xE0, 0, 64]).is_none());
        assert!(normalize(&[0xC0, 5]).is_none());
    }

    #[test]
    fn test_malformed_bytes() {
        let normalizer = Normalizer::default();
        let id = InputId::new("kbd");
        assert!(normalizer.try_normalize_bytes(&id, &[], 0.0).is_err());
        assert!(normalizer.normalize_bytes(&id, &[0x90, 60], 0.0).is_none());
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(0), 0.0);
        assert_eq!(scale(127), 1.0);
        assert_eq!(scale(255), 1.0);
    }
}
