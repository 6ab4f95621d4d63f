//! Names of the note track sections, such as `[ExpertSingle]` or `[HardDoubleBass]`.
//!
//! A header is the difficulty name followed by the instrument name. Headers outside this
//! scheme are still valid note sections, they are just kept as opaque strings.

use std::{cmp::Ordering, fmt, str::FromStr};

/// The difficulty part of a note section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Difficulty {
    /// `Easy`
    Easy,
    /// `Medium`
    Medium,
    /// `Hard`
    Hard,
    /// `Expert`
    Expert,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Expert];

    /// The name used in section headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
        }
    }
}

/// The instrument part of a note section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instrument {
    /// `Single`, lead guitar.
    Single,
    /// `DoubleGuitar`, co-op guitar.
    DoubleGuitar,
    /// `DoubleBass`
    DoubleBass,
    /// `DoubleRhythm`
    DoubleRhythm,
    /// `Keyboard`
    Keyboard,
    /// `Drums`
    Drums,
    /// `GHLGuitar`, six fret guitar.
    GhlGuitar,
    /// `GHLBass`, six fret bass.
    GhlBass,
}

impl Instrument {
    /// All instruments, in the order editors save them.
    pub const ALL: [Self; 8] = [
        Self::Single,
        Self::DoubleGuitar,
        Self::DoubleBass,
        Self::DoubleRhythm,
        Self::Keyboard,
        Self::Drums,
        Self::GhlGuitar,
        Self::GhlBass,
    ];

    /// The name used in section headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::DoubleGuitar => "DoubleGuitar",
            Self::DoubleBass => "DoubleBass",
            Self::DoubleRhythm => "DoubleRhythm",
            Self::Keyboard => "Keyboard",
            Self::Drums => "Drums",
            Self::GhlGuitar => "GHLGuitar",
            Self::GhlBass => "GHLBass",
        }
    }
}

/// A note section name composed of a [`Difficulty`] and an [`Instrument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackName {
    /// The difficulty.
    pub difficulty: Difficulty,
    /// The instrument.
    pub instrument: Instrument,
}

impl TrackName {
    /// Creates a new track name.
    #[must_use]
    pub const fn new(difficulty: Difficulty, instrument: Instrument) -> Self {
        Self {
            difficulty,
            instrument,
        }
    }

    /// Splits a section header into its difficulty and instrument.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let difficulty = Difficulty::ALL
            .into_iter()
            .find(|difficulty| header.starts_with(difficulty.as_str()))?;
        let rest = &header[difficulty.as_str().len()..];
        let instrument = Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.as_str() == rest)?;
        Some(Self::new(difficulty, instrument))
    }
}

impl fmt::Display for TrackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.difficulty.as_str(),
            self.instrument.as_str()
        )
    }
}

impl FromStr for TrackName {
    type Err = UnknownTrackName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownTrackName(s.to_owned()))
    }
}

impl From<TrackName> for String {
    fn from(value: TrackName) -> Self {
        value.to_string()
    }
}

/// The header is not a difficulty followed by an instrument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a known note section name: {0}")]
pub struct UnknownTrackName(pub String);

/// Orders section headers for saving: known names by instrument then hardest difficulty first,
/// other names after them alphabetically.
#[must_use]
pub fn section_order(a: &str, b: &str) -> Ordering {
    let rank = |header: &str| {
        TrackName::parse(header)
            .map(|name| (name.instrument, std::cmp::Reverse(name.difficulty)))
    };
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for difficulty in Difficulty::ALL {
            for instrument in Instrument::ALL {
                let name = TrackName::new(difficulty, instrument);
                assert_eq!(TrackName::parse(&name.to_string()), Some(name));
            }
        }
        assert_eq!(
            "ExpertGHLBass".parse(),
            Ok(TrackName::new(Difficulty::Expert, Instrument::GhlBass))
        );
        assert!(TrackName::parse("ExpertSinglePlus").is_none());
        assert!(TrackName::parse("Events").is_none());
    }

    #[test]
    fn sections_are_ordered_for_saving() {
        let mut headers = vec![
            "Zebra",
            "EasySingle",
            "ExpertDoubleBass",
            "ExpertSingle",
            "HardSingle",
        ];
        headers.sort_by(|a, b| section_order(a, b));
        assert_eq!(
            headers,
            vec![
                "ExpertSingle",
                "HardSingle",
                "EasySingle",
                "ExpertDoubleBass",
                "Zebra"
            ]
        );
    }
}
