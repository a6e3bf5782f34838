//! Chord estimation seam.
//!
//! The engine hands an estimator a de-duplicated, ascending list of spelled
//! notes and takes back candidate chord names. Anything smarter than the
//! built-in template matcher plugs in through [`ChordEstimator`].

use crate::theory::{Accidentals, NoteName};
use crate::types::{PitchClass, PITCH_CLASSES};
use std::borrow::Cow;

pub trait ChordEstimator: Send + Sync {
    /// Candidate names for the sounding notes, best first. `notes` is
    /// ascending with no duplicates.
    fn estimate(&self, notes: &[NoteName]) -> Vec<String>;

    /// Identity used to memoize results. Estimators whose output depends on
    /// runtime configuration should include it here.
    fn cache_key(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

struct Template {
    suffix: &'static str,
    intervals: &'static [u8],
}

const TEMPLATES: &[Template] = &[
    Template { suffix: "", intervals: &[0, 4, 7] },
    Template { suffix: "m", intervals: &[0, 3, 7] },
    Template { suffix: "dim", intervals: &[0, 3, 6] },
    Template { suffix: "aug", intervals: &[0, 4, 8] },
    Template { suffix: "sus2", intervals: &[0, 2, 7] },
    Template { suffix: "sus4", intervals: &[0, 5, 7] },
    Template { suffix: "7", intervals: &[0, 4, 7, 10] },
    Template { suffix: "maj7", intervals: &[0, 4, 7, 11] },
    Template { suffix: "m7", intervals: &[0, 3, 7, 10] },
    Template { suffix: "m7b5", intervals: &[0, 3, 6, 10] },
    Template { suffix: "dim7", intervals: &[0, 3, 6, 9] },
    Template { suffix: "6", intervals: &[0, 4, 7, 9] },
    Template { suffix: "m6", intervals: &[0, 3, 7, 9] },
    Template { suffix: "5", intervals: &[0, 7] },
];

/// Bit `pc` set for every pitch class present.
fn pitch_class_mask(pcs: impl IntoIterator<Item = PitchClass>) -> u16 {
    pcs.into_iter().fold(0, |mask, pc| mask | 1 << (pc % 12))
}

fn template_mask(root: PitchClass, intervals: &[u8]) -> u16 {
    pitch_class_mask(intervals.iter().map(|interval| (root + interval) % 12))
}

/// Exact pitch-class-set matching against common triads, sevenths and
/// sixths, for every root.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateChordEstimator;

impl TemplateChordEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl ChordEstimator for TemplateChordEstimator {
    fn estimate(&self, notes: &[NoteName]) -> Vec<String> {
        let Some(bass) = notes.iter().min_by_key(|name| name.note) else {
            return Vec::new();
        };
        let mask = pitch_class_mask(notes.iter().map(NoteName::pitch_class));
        if mask.count_ones() < 2 {
            return Vec::new();
        }
        let accidentals: Accidentals = bass.accidentals;
        let bass_pc = bass.pitch_class();

        let mut root_position = Vec::new();
        let mut inversions = Vec::new();
        for template in TEMPLATES {
            for root in 0..PITCH_CLASSES as PitchClass {
                if template_mask(root, template.intervals) != mask {
                    continue;
                }
                let name = format!("{}{}", accidentals.name(root), template.suffix);
                if root == bass_pc {
                    root_position.push(name);
                } else {
                    inversions.push(format!("{}/{}", name, accidentals.name(bass_pc)));
                }
            }
        }
        root_position.extend(inversions);
        root_position.dedup();
        root_position
    }
}
