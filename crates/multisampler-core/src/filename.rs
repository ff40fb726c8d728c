//! Sample file name grammar.
//!
//! A sample name is `<prefix><note><octave>[-<secondary>]<postfix>.<extension>`,
//! for example `Piano C3-64 soft.wav`:
//!
//! - `prefix` and `postfix` are arbitrary text
//! - `note` is a letter `A`-`G` with an optional `#`
//! - `octave` is a single digit
//! - `secondary` is one to three digits in 0-127 (velocity layer or selection)
//!
//! The prefix is greedy. When a name contains several note-like tokens the
//! match settles on the last one that still lets the rest of the grammar
//! match, so `E1 Guitar C3.wav` is a C3 sample with prefix `E1 Guitar `.

use crate::types::{ParsedDescriptor, ValueMode, MIDI_MAX};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Audio file extensions accepted as samples (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["wav", "aif", "mp3", "ogg"];

static SAMPLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)([A-G]#?)(\d)(?:-(\d{1,3}))?(.*)\.([^.]+)$")
        .expect("sample name pattern is valid")
});

/// Why a file was not accepted as a sample.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The name does not follow the sample grammar at all.
    #[error("not a sample name")]
    NoMatch,

    #[error("unsupported extension '{0}'")]
    UnsupportedExtension(String),

    #[error("octave '{0}' is not a number")]
    InvalidOctave(String),

    #[error("{mode} value '{raw}' is not a number")]
    InvalidSecondary { raw: String, mode: ValueMode },

    #[error("{mode} value {value} is outside 0-127")]
    SecondaryOutOfRange { value: u16, mode: ValueMode },
}

impl Rejection {
    /// Whether the rejection should be reported to the user.
    ///
    /// Files that are simply not sample names are skipped quietly.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Rejection::NoMatch)
    }
}

/// Parse a file name into a sample descriptor.
///
/// Rejections are logged here (warnings for malformed sample names, debug for
/// unrelated files) and never abort a batch.
pub fn parse_filename(file_name: &str, mode: ValueMode) -> Result<ParsedDescriptor, Rejection> {
    let result = match_filename(file_name, mode);

    if let Err(rejection) = &result {
        if rejection.is_warning() {
            log::warn!("Skipping '{}': {}", file_name, rejection);
        } else {
            log::debug!("Ignoring '{}': {}", file_name, rejection);
        }
    }

    result
}

fn match_filename(file_name: &str, mode: ValueMode) -> Result<ParsedDescriptor, Rejection> {
    let caps = SAMPLE_NAME.captures(file_name).ok_or(Rejection::NoMatch)?;
    let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

    let extension = group(6);
    let supported = SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension));
    if !supported {
        return Err(Rejection::UnsupportedExtension(extension.to_string()));
    }

    let octave_raw = group(3);
    let octave = octave_raw
        .parse::<u8>()
        .map_err(|_| Rejection::InvalidOctave(octave_raw.to_string()))?;

    let secondary_raw = group(4);
    let secondary = if secondary_raw.is_empty() {
        None
    } else {
        let value = secondary_raw
            .parse::<u16>()
            .map_err(|_| Rejection::InvalidSecondary {
                raw: secondary_raw.to_string(),
                mode,
            })?;
        if value > MIDI_MAX as u16 {
            return Err(Rejection::SecondaryOutOfRange { value, mode });
        }
        Some(value as u8)
    };

    Ok(ParsedDescriptor {
        full_name: file_name.to_string(),
        prefix: group(1).to_string(),
        note: group(2).to_string(),
        octave,
        secondary,
        secondary_group_tag: secondary_raw.to_string(),
        postfix: group(5).to_string(),
        extension: extension.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> Result<ParsedDescriptor, Rejection> {
        parse_filename(name, ValueMode::Velocity)
    }

    #[test]
    fn test_parse_plain_note() {
        let desc = parse("C3.wav").unwrap();
        assert_eq!(desc.prefix, "");
        assert_eq!(desc.note, "C");
        assert_eq!(desc.octave, 3);
        assert_eq!(desc.secondary, None);
        assert_eq!(desc.secondary_or_default(), 127);
        assert_eq!(desc.secondary_group_tag, "");
        assert_eq!(desc.extension, "wav");
    }

    #[test]
    fn test_parse_with_secondary_and_affixes() {
        let desc = parse("Piano F#2-64 soft.AIF").unwrap();
        assert_eq!(desc.full_name, "Piano F#2-64 soft.AIF");
        assert_eq!(desc.prefix, "Piano ");
        assert_eq!(desc.note, "F#");
        assert_eq!(desc.octave, 2);
        assert_eq!(desc.secondary, Some(64));
        assert_eq!(desc.secondary_group_tag, "64");
        assert_eq!(desc.postfix, " soft");
        assert_eq!(desc.extension, "AIF");
    }

    #[test]
    fn test_greedy_prefix_takes_last_note_token() {
        let desc = parse("E1 Guitar C3.wav").unwrap();
        assert_eq!(desc.prefix, "E1 Guitar ");
        assert_eq!(desc.note, "C");
        assert_eq!(desc.octave, 3);
    }

    #[test]
    fn test_no_match_is_silent() {
        assert_eq!(parse("x9.wav"), Err(Rejection::NoMatch));
        assert_eq!(parse("h3.wav"), Err(Rejection::NoMatch));
        assert_eq!(parse("README"), Err(Rejection::NoMatch));
        assert!(!Rejection::NoMatch.is_warning());
    }

    #[test]
    fn test_unsupported_extension() {
        assert_eq!(
            parse("C3.flac"),
            Err(Rejection::UnsupportedExtension("flac".to_string()))
        );
        assert!(parse("C3.OGG").is_ok());
        assert!(parse("C3.mp3").is_ok());
    }

    #[test]
    fn test_secondary_out_of_range() {
        assert_eq!(
            parse("C3-128.wav"),
            Err(Rejection::SecondaryOutOfRange {
                value: 128,
                mode: ValueMode::Velocity
            })
        );
        assert_eq!(parse("C3-127.wav").unwrap().secondary, Some(127));
        assert_eq!(parse("C3-0.wav").unwrap().secondary, Some(0));
    }

    #[test]
    fn test_non_ascii_digit_octave_is_rejected() {
        // U+0663 ARABIC-INDIC DIGIT THREE matches \d but is not a u8
        let result = parse("C\u{0663}.wav");
        assert!(matches!(result, Err(Rejection::InvalidOctave(_))));
        assert!(result.unwrap_err().is_warning());
    }
}
