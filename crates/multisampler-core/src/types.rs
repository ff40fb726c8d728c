//! Multisample type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest MIDI key, velocity and selection value.
pub const MIDI_MAX: u8 = 127;

/// Secondary value assumed when a sample name carries none.
pub const DEFAULT_SECONDARY: u8 = MIDI_MAX;

/// Immutable result of parsing one sample file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDescriptor {
    /// The complete file name, extension included.
    pub full_name: String,
    /// Everything in front of the note token.
    pub prefix: String,
    /// Note letter with optional sharp, e.g. `C` or `F#`.
    pub note: String,
    /// Octave digit as written in the file name.
    pub octave: u8,
    /// Secondary value (velocity layer or selection), if the name has one.
    pub secondary: Option<u8>,
    /// Raw digit group of the secondary value; empty when absent.
    pub secondary_group_tag: String,
    /// Everything between the note token and the extension.
    pub postfix: String,
    /// File extension without the dot.
    pub extension: String,
}

impl ParsedDescriptor {
    /// The secondary value, falling back to 127.
    pub fn secondary_or_default(&self) -> u8 {
        self.secondary.unwrap_or(DEFAULT_SECONDARY)
    }
}

/// Which secondary dimension is driven by the numbers in the file names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Numbers are velocity layers.
    #[default]
    Velocity,
    /// Numbers are selection (round-robin) values.
    Selection,
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Velocity => write!(f, "velocity"),
            Self::Selection => write!(f, "selection"),
        }
    }
}

impl FromStr for ValueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "velocity" | "vel" => Ok(Self::Velocity),
            "selection" | "select" | "sel" => Ok(Self::Selection),
            _ => Err(format!(
                "unknown mode '{}', expected 'velocity' or 'selection'",
                s
            )),
        }
    }
}

/// Inclusive MIDI value range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub low: u8,
    pub high: u8,
}

impl Range {
    /// The full range 0-127.
    pub const FULL: Range = Range {
        low: 0,
        high: MIDI_MAX,
    };

    pub fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Distance between the bounds.
    pub fn width(&self) -> u8 {
        self.high.abs_diff(self.low)
    }

    pub fn contains(&self, value: u8) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Crossfade widths at the two ends of a range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fade {
    pub low: u8,
    pub high: u8,
}

impl Fade {
    pub const NONE: Fade = Fade { low: 0, high: 0 };
}

/// One sample entry of the instrument with its key and secondary ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    /// Sample file this zone plays.
    pub source_name: String,
    /// Root key of the sample.
    pub key: u8,
    /// Keys that trigger this zone.
    pub key_range: Range,
    pub key_fade: Fade,
    pub velocity: Range,
    pub velocity_fade: Fade,
    pub select: Range,
    pub select_fade: Fade,
    /// Raw digit group the sample name carried; empty when absent.
    pub secondary_group_tag: String,
    /// Whether the selection range came from even redistribution.
    pub redistributed: bool,
}

impl Zone {
    /// The range of the dimension driven by file names in `mode`.
    pub fn active(&self, mode: ValueMode) -> Range {
        match mode {
            ValueMode::Velocity => self.velocity,
            ValueMode::Selection => self.select,
        }
    }

    /// Copy of this zone with the active dimension replaced.
    pub fn with_active(self, mode: ValueMode, range: Range, fade: Fade) -> Self {
        match mode {
            ValueMode::Velocity => Zone {
                velocity: range,
                velocity_fade: fade,
                ..self
            },
            ValueMode::Selection => Zone {
                select: range,
                select_fade: fade,
                ..self
            },
        }
    }
}
