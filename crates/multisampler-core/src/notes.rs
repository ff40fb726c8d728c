//! Note name to MIDI key resolution.

use crate::error::{Error, Result};
use crate::types::MIDI_MAX;

/// Pitch classes in semitone order starting at C.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave digit `0` in a file name is synthesizer octave 1, so C0 is key 12
/// and C4 is key 60.
const OCTAVE_OFFSET: i32 = 1;

/// Index 0-11 of a pitch class, or `None` if the name is not one of the twelve.
pub fn pitch_class_index(note: &str) -> Option<u8> {
    PITCH_CLASSES
        .iter()
        .position(|&name| name == note)
        .map(|index| index as u8)
}

/// Resolve a note letter and octave to an absolute MIDI key.
///
/// Fails for unknown pitch classes and for keys above 127 (G#9 and up).
pub fn resolve_key(note: &str, octave: u8) -> Result<u8> {
    let index = pitch_class_index(note).ok_or_else(|| Error::InvalidNote {
        note: note.to_string(),
        octave,
        reason: "unknown pitch class".to_string(),
    })?;

    let key = (OCTAVE_OFFSET + octave as i32) * 12 + index as i32;
    if !(0..=MIDI_MAX as i32).contains(&key) {
        return Err(Error::InvalidNote {
            note: note.to_string(),
            octave,
            reason: format!("key {} is outside 0-127", key),
        });
    }

    Ok(key as u8)
}

/// Name of a MIDI key in file name notation, e.g. 48 -> `C3`.
pub fn key_name(key: u8) -> String {
    let octave = (key / 12) as i32 - OCTAVE_OFFSET;
    format!("{}{}", PITCH_CLASSES[(key % 12) as usize], octave)
}
