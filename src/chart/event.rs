//! Definitions of the events placed on the tracks of a chart.

use super::track::Tick;

/// Tempo used before any tempo event, 120 BPM in the scaled representation.
pub const DEFAULT_TEMPO: u32 = 120_000;

/// Time signature numerator used before any time signature event.
pub const DEFAULT_TIME_SIGNATURE: u32 = 4;

/// Lane of the open note in a note track.
pub const OPEN_LANE: u32 = 7;

/// Lane marking the note group at the same tick as tap notes.
pub const TAP_LANE: u32 = 6;

/// Lane marking the note group at the same tick as forced notes.
pub const FORCED_LANE: u32 = 5;

/// An event on the `[SyncTrack]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncEvent {
    /// `B value`. The tempo in beats per minute multiplied by 1000.
    Tempo(u32),
    /// `TS numerator [denominator_exp]`. The time signature change.
    TimeSignature {
        /// Beats per measure.
        numerator: u32,
        /// The denominator as a power of two, `None` meaning a quarter note (`2`).
        denominator_exp: Option<u32>,
    },
    /// `A micros`. An anchor locking this tick to an absolute time in microseconds.
    Anchor(u64),
}

impl SyncEvent {
    /// Creates a time signature event without explicit denominator.
    #[must_use]
    pub const fn time_signature(numerator: u32) -> Self {
        Self::TimeSignature {
            numerator,
            denominator_exp: None,
        }
    }

    /// The tempo value if this is a tempo event.
    #[must_use]
    pub const fn tempo(&self) -> Option<u32> {
        match *self {
            Self::Tempo(value) => Some(value),
            _ => None,
        }
    }

    /// The numerator if this is a time signature event.
    #[must_use]
    pub const fn numerator(&self) -> Option<u32> {
        match *self {
            Self::TimeSignature { numerator, .. } => Some(numerator),
            _ => None,
        }
    }

    /// The type tag used in the text format.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Tempo(_) => "B",
            Self::TimeSignature { .. } => "TS",
            Self::Anchor(_) => "A",
        }
    }
}

/// An event on the `[Events]` section, such as `section Intro` or `lyric word`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextEvent {
    /// The text of the event.
    pub name: String,
}

impl TextEvent {
    /// Creates a new text event.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Creates a `section <name>` event.
    #[must_use]
    pub fn section(name: &str) -> Self {
        Self::new(format!("section {name}"))
    }

    /// Creates a `lyric <word>` event.
    #[must_use]
    pub fn lyric(word: &str) -> Self {
        Self::new(format!("lyric {word}"))
    }

    /// The section name if this is a `section <name>` event.
    #[must_use]
    pub fn section_name(&self) -> Option<&str> {
        self.name.strip_prefix("section ")
    }
}

/// An event on a note track, such as `[ExpertSingle]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteEvent {
    /// `N lane duration`. A note, or a modifier flag on lanes such as [`FORCED_LANE`].
    Note {
        /// The lane index.
        lane: u32,
        /// The sustain length in ticks, zero for a plain note.
        duration: Tick,
    },
    /// `E name`. A track-local event such as `solo`.
    Event {
        /// The text of the event.
        name: String,
    },
    /// `S kind duration`. A special phrase, `2` being star power.
    StarPower {
        /// The phrase kind.
        kind: u32,
        /// The phrase length in ticks.
        duration: Tick,
    },
}

impl NoteEvent {
    /// Creates a note.
    #[must_use]
    pub const fn note(lane: u32, duration: Tick) -> Self {
        Self::Note { lane, duration }
    }

    /// Creates a track event.
    pub fn event(name: impl Into<String>) -> Self {
        Self::Event { name: name.into() }
    }

    /// Creates a star power phrase of kind `2`.
    #[must_use]
    pub const fn star_power(duration: Tick) -> Self {
        Self::StarPower { kind: 2, duration }
    }

    /// Whether this is a [`NoteEvent::Note`].
    #[must_use]
    pub const fn is_note(&self) -> bool {
        matches!(self, Self::Note { .. })
    }

    /// The type tag used in the text format.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Note { .. } => "N",
            Self::Event { .. } => "E",
            Self::StarPower { .. } => "S",
        }
    }
}
