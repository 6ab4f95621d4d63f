//! Parsing [`Chart`] from the chart format text.
//!
//! Raw [String] == [lex](super::lex) ==> [`Token`]s == [`RawChart::from_tokens`] ==> [`RawChart`] ==
//! [`Chart::from_raw`] ==> [`Chart`]
//!
//! [`RawChart`] is the untyped middle layer: sections holding, per key, every entry written with
//! that key in input order. The typed layer reads [`SongMetadata`] fields from it and builds a
//! [`Track`] for every other section.

use std::{borrow::Cow, collections::HashMap, ops::Range, str::FromStr};

use itertools::Itertools;
use thiserror::Error;

use super::{
    Chart,
    event::{NoteEvent, SyncEvent, TextEvent},
    lex::{
        LexError, parse_lex_tokens,
        token::{Token, TokenWithRange, Value},
    },
    mixin::{SourceRangeMixin, SourceRangeMixinExt},
    song::SongMetadata,
    track::{Tick, Track},
};

/// Name of the metadata section.
pub const SONG_SECTION: &str = "Song";
/// Name of the tempo and time signature section.
pub const SYNC_TRACK_SECTION: &str = "SyncTrack";
/// Name of the global events section.
pub const EVENTS_SECTION: &str = "Events";

/// Number of characters of source shown on each side of a parse error.
pub const ERROR_CONTEXT_CHARS: usize = 40;

/// What went wrong while parsing.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParseErrorKind {
    /// A line could not be tokenized.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// Something other than a section header appeared outside of sections.
    #[error("expected a `[section]` header")]
    ExpectedSection,
    /// A section header was not followed by `{`.
    #[error("expected `{{` after the section header")]
    ExpectedOpenBrace,
    /// A section body was not closed before a new one started.
    #[error("expected `}}` to close the section")]
    ExpectedCloseBrace,
    /// The source ended inside a section.
    #[error("unexpected end of input, a section is not closed")]
    UnexpectedEnd,
    /// The `Resolution` field of the Song section is missing.
    #[error("missing `Resolution` in the Song section")]
    MissingResolution,
    /// A field value could not be converted.
    #[error("invalid value `{value}` for `{field}`")]
    InvalidField {
        /// The field name.
        field: String,
        /// The value as written.
        value: String,
    },
    /// The key of an entry in a tick section is not a tick number.
    #[error("invalid tick `{0}`")]
    InvalidTick(String),
    /// The type tag of an event is not known in its section.
    #[error("unknown event type `{tag}` in section `{section}`")]
    UnknownEvent {
        /// The section name.
        section: String,
        /// The type tag.
        tag: String,
    },
    /// The event fields do not match the layout of its type.
    #[error("malformed event, expected `{layout}`")]
    InvalidEvent {
        /// The expected layout.
        layout: &'static str,
    },
}

/// A parse error kind with position information.
pub type ParseErrorWithRange = SourceRangeMixin<ParseErrorKind>;

impl From<SourceRangeMixin<LexError>> for ParseErrorWithRange {
    fn from(value: SourceRangeMixin<LexError>) -> Self {
        value.map(ParseErrorKind::from)
    }
}

/// An error occurred when parsing the chart format, with the surrounding source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("{kind} at line {line}, near `{before} <--- ERROR {after}`")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte range of the failure in the source.
    pub range: Range<usize>,
    /// Line number of the failure, starts with 1.
    pub line: usize,
    /// Up to [`ERROR_CONTEXT_CHARS`] characters before the failure point.
    pub before: String,
    /// Up to [`ERROR_CONTEXT_CHARS`] characters from the failure point.
    pub after: String,
}

impl ParseError {
    /// Attaches the source context to a positioned error.
    #[must_use]
    pub fn new(source: &str, error: ParseErrorWithRange) -> Self {
        let range = error.range();
        let at = floor_char_boundary(source, range.start.min(source.len()));
        let head = &source[..at];
        let before_start = head
            .char_indices()
            .rev()
            .nth(ERROR_CONTEXT_CHARS - 1)
            .map_or(0, |(i, _)| i);
        let after: String = source[at..].chars().take(ERROR_CONTEXT_CHARS).collect();
        Self {
            kind: error.into_content(),
            line: head.matches('\n').count() + 1,
            before: head[before_start..].to_owned(),
            after,
            range,
        }
    }
}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

type Result<T> = core::result::Result<T, ParseErrorWithRange>;

/// One `key = value...` line of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry<'a> {
    /// The value tokens.
    pub values: Vec<Value<'a>>,
    /// Byte range of the line.
    pub range: Range<usize>,
}

/// A section with its entries grouped by key. Keys and entries per key keep input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection<'a> {
    /// The header name.
    pub name: Cow<'a, str>,
    /// Byte range of the header line.
    pub range: Range<usize>,
    keys: Vec<(Cow<'a, str>, Vec<RawEntry<'a>>)>,
    index: HashMap<Cow<'a, str>, usize>,
}

impl<'a> RawSection<'a> {
    /// Creates an empty section.
    pub fn new(name: impl Into<Cow<'a, str>>, range: Range<usize>) -> Self {
        Self {
            name: name.into(),
            range,
            keys: vec![],
            index: HashMap::new(),
        }
    }

    /// Appends an entry under `key`.
    pub fn push(&mut self, key: Cow<'a, str>, entry: RawEntry<'a>) {
        if let Some(&i) = self.index.get(&key) {
            self.keys[i].1.push(entry);
        } else {
            self.index.insert(key.clone(), self.keys.len());
            self.keys.push((key, vec![entry]));
        }
    }

    /// Gets every entry written with `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[RawEntry<'a>]> {
        self.index.get(key).map(|&i| self.keys[i].1.as_slice())
    }

    /// Iterates keys with their entries, in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawEntry<'a>])> {
        self.keys
            .iter()
            .map(|(key, entries)| (key.as_ref(), entries.as_slice()))
    }
}

/// The sections of a chart source before typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChart<'a> {
    /// Sections in order of first appearance. A repeated header is appended to the first one.
    pub sections: Vec<RawSection<'a>>,
}

impl<'a> RawChart<'a> {
    /// Gets the section named `name`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&RawSection<'a>> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Groups tokens into sections, checking the `[name] { ... }` structure.
    ///
    /// # Errors
    ///
    /// Returns the first token breaking the structure. `source_len` positions the error for an
    /// unclosed section at the end of input.
    pub fn from_tokens(
        tokens: impl IntoIterator<Item = TokenWithRange<'a>>,
        source_len: usize,
    ) -> Result<Self> {
        enum State<'a> {
            Outside,
            Header(RawSection<'a>),
            Inside(RawSection<'a>),
        }

        let mut raw = Self::default();
        let mut state = State::Outside;
        for token in tokens {
            let range = token.range();
            state = match (state, token.into_content()) {
                (State::Outside, Token::Section(name)) => {
                    State::Header(RawSection::new(name, range))
                }
                (State::Outside, _) => {
                    return Err(ParseErrorKind::ExpectedSection.into_wrapper_range(range));
                }
                (State::Header(section), Token::Open) => State::Inside(section),
                (State::Header(_), _) => {
                    return Err(ParseErrorKind::ExpectedOpenBrace.into_wrapper_range(range));
                }
                (State::Inside(mut section), Token::Entry { key, values, .. }) => {
                    section.push(key, RawEntry { values, range });
                    State::Inside(section)
                }
                (State::Inside(section), Token::Close) => {
                    raw.append(section);
                    State::Outside
                }
                (State::Inside(_), _) => {
                    return Err(ParseErrorKind::ExpectedCloseBrace.into_wrapper_range(range));
                }
            };
        }
        match state {
            State::Outside => Ok(raw),
            State::Header(_) | State::Inside(_) => Err(ParseErrorKind::UnexpectedEnd
                .into_wrapper_range(source_len..source_len)),
        }
    }

    fn append(&mut self, section: RawSection<'a>) {
        let Some(existing) = self.sections.iter_mut().find(|s| s.name == section.name) else {
            self.sections.push(section);
            return;
        };
        for (key, entries) in section.keys {
            for entry in entries {
                existing.push(key.clone(), entry);
            }
        }
    }
}

impl Chart {
    /// Builds a typed chart from its raw sections.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or zero resolution, malformed fields and malformed events.
    pub fn from_raw(raw: &RawChart<'_>) -> Result<Self> {
        let song = match raw.section(SONG_SECTION) {
            Some(section) => parse_song(section)?,
            None => return Err(ParseErrorKind::MissingResolution.into_wrapper_range(0..0)),
        };
        let mut chart = Chart::new(song);
        for section in &raw.sections {
            match section.name.as_ref() {
                SONG_SECTION => {}
                SYNC_TRACK_SECTION => {
                    chart.sync_track = parse_track(section, parse_sync_event)?;
                }
                EVENTS_SECTION => {
                    chart.events = parse_track(section, parse_text_event)?;
                }
                name => {
                    let track = parse_track(section, parse_note_event)?;
                    chart.tracks.insert(name.to_owned(), track);
                }
            }
        }
        Ok(chart)
    }
}

impl FromStr for Chart {
    type Err = ParseError;

    fn from_str(source: &str) -> core::result::Result<Self, Self::Err> {
        parse(source)
    }
}

/// Parses the chart format text into a [`Chart`].
///
/// # Errors
///
/// Returns the first syntax or typing error with its surrounding source text. No partial chart is
/// produced.
pub fn parse(source: &str) -> core::result::Result<Chart, ParseError> {
    parse_raw(source)
        .and_then(|raw| Chart::from_raw(&raw))
        .map_err(|err| ParseError::new(source, err))
}

/// Parses the chart format text into untyped sections.
///
/// # Errors
///
/// Returns the first lex or structure error.
pub fn parse_raw(source: &str) -> Result<RawChart<'_>> {
    let tokens = parse_lex_tokens(source)?;
    RawChart::from_tokens(tokens, source.len())
}

fn joined_text(values: &[Value<'_>]) -> String {
    values.iter().map(Value::text).join(" ")
}

fn parse_song(section: &RawSection<'_>) -> Result<SongMetadata> {
    fn field<T: FromStr>(key: &str, entry: &RawEntry<'_>) -> Result<T> {
        let text = joined_text(&entry.values);
        text.trim().parse().map_err(|_| {
            ParseErrorKind::InvalidField {
                field: key.to_owned(),
                value: text.clone(),
            }
            .into_wrapper_range(entry.range.clone())
        })
    }

    let mut song = SongMetadata::default();
    let mut resolution = None;
    for (key, entries) in section.iter() {
        let Some(entry) = entries.first() else {
            continue;
        };
        let text = || Some(joined_text(&entry.values));
        match key {
            "Name" => song.name = text(),
            "Artist" => song.artist = text(),
            "ArtistText" => song.artist_text = text(),
            "Charter" => song.charter = text(),
            "Album" => song.album = text(),
            "Year" => song.year = text(),
            "Offset" => song.offset = Some(field(key, entry)?),
            "CountOff" => song.count_off = text(),
            "GuitarVol" => song.guitar_vol = Some(field(key, entry)?),
            "BandVol" => song.band_vol = Some(field(key, entry)?),
            "HoPo" => song.hopo = Some(field(key, entry)?),
            "Singer" => song.singer = text(),
            "OriginalArtist" => {
                let value = joined_text(&entry.values);
                song.original_artist = Some(value.eq_ignore_ascii_case("true"));
            }
            "Resolution" => {
                let value: u32 = field(key, entry)?;
                if value == 0 {
                    return Err(ParseErrorKind::InvalidField {
                        field: key.to_owned(),
                        value: value.to_string(),
                    }
                    .into_wrapper_range(entry.range.clone()));
                }
                resolution = Some(value);
            }
            "Player2" => song.player2 = text(),
            "Difficulty" => song.difficulty = Some(field(key, entry)?),
            "PreviewStart" => song.preview_start = Some(field(key, entry)?),
            "PreviewEnd" => song.preview_end = Some(field(key, entry)?),
            "Genre" => song.genre = text(),
            "MediaType" => song.media_type = text(),
            "MusicStream" => song.music_stream = text(),
            "GuitarStream" => song.guitar_stream = text(),
            "BassStream" => song.bass_stream = text(),
            "RhythmStream" => song.rhythm_stream = text(),
            "DrumStream" => song.drum_stream = text(),
            _ => song
                .extra
                .push((key.to_owned(), entry.values.iter().join(" "))),
        }
    }
    song.resolution = resolution
        .ok_or_else(|| ParseErrorKind::MissingResolution.into_wrapper_range(section.range.clone()))?;
    Ok(song)
}

fn parse_track<T>(
    section: &RawSection<'_>,
    parse_event: impl Fn(&str, &RawEntry<'_>) -> Result<T>,
) -> Result<Track<T>> {
    let mut track = Track::new();
    for (key, entries) in section.iter() {
        let Some(first) = entries.first() else {
            continue;
        };
        let tick: Tick = key.parse().map_err(|_| {
            ParseErrorKind::InvalidTick(key.to_owned()).into_wrapper_range(first.range.clone())
        })?;
        for entry in entries {
            track.push(tick, parse_event(section.name.as_ref(), entry)?);
        }
    }
    Ok(track)
}

/// Splits an entry into its type tag and the remaining fields.
fn tagged<'e, 'a>(entry: &'e RawEntry<'a>, layout: &'static str) -> Result<(&'e str, &'e [Value<'a>])> {
    match entry.values.split_first() {
        Some((tag, rest)) => Ok((tag.text(), rest)),
        None => Err(ParseErrorKind::InvalidEvent { layout }.into_wrapper_range(entry.range.clone())),
    }
}

fn number<T: FromStr>(entry: &RawEntry<'_>, value: &Value<'_>, layout: &'static str) -> Result<T> {
    value
        .text()
        .parse()
        .map_err(|_| ParseErrorKind::InvalidEvent { layout }.into_wrapper_range(entry.range.clone()))
}

fn unknown_event(section: &str, tag: &str, entry: &RawEntry<'_>) -> ParseErrorWithRange {
    ParseErrorKind::UnknownEvent {
        section: section.to_owned(),
        tag: tag.to_owned(),
    }
    .into_wrapper_range(entry.range.clone())
}

fn invalid_event(layout: &'static str, entry: &RawEntry<'_>) -> ParseErrorWithRange {
    ParseErrorKind::InvalidEvent { layout }.into_wrapper_range(entry.range.clone())
}

fn parse_sync_event(section: &str, entry: &RawEntry<'_>) -> Result<SyncEvent> {
    const TEMPO: &str = "B <tempo>";
    const SIGNATURE: &str = "TS <numerator> [<denominator exponent>]";
    const ANCHOR: &str = "A <microseconds>";

    match tagged(entry, TEMPO)? {
        ("B", [value]) => Ok(SyncEvent::Tempo(number(entry, value, TEMPO)?)),
        ("B", _) => Err(invalid_event(TEMPO, entry)),
        ("TS", [numerator]) => Ok(SyncEvent::time_signature(number(entry, numerator, SIGNATURE)?)),
        ("TS", [numerator, exp]) => Ok(SyncEvent::TimeSignature {
            numerator: number(entry, numerator, SIGNATURE)?,
            denominator_exp: Some(number(entry, exp, SIGNATURE)?),
        }),
        ("TS", _) => Err(invalid_event(SIGNATURE, entry)),
        ("A", [value]) => Ok(SyncEvent::Anchor(number(entry, value, ANCHOR)?)),
        ("A", _) => Err(invalid_event(ANCHOR, entry)),
        (tag, _) => Err(unknown_event(section, tag, entry)),
    }
}

fn parse_text_event(section: &str, entry: &RawEntry<'_>) -> Result<TextEvent> {
    const EVENT: &str = "E <name>";

    match tagged(entry, EVENT)? {
        ("E", name @ [_, ..]) => Ok(TextEvent::new(joined_text(name))),
        ("E", _) => Err(invalid_event(EVENT, entry)),
        (tag, _) => Err(unknown_event(section, tag, entry)),
    }
}

fn parse_note_event(section: &str, entry: &RawEntry<'_>) -> Result<NoteEvent> {
    const NOTE: &str = "N <lane> <duration>";
    const EVENT: &str = "E <name>";
    const STAR_POWER: &str = "S <kind> <duration>";

    match tagged(entry, NOTE)? {
        ("N", [lane, duration]) => Ok(NoteEvent::Note {
            lane: number(entry, lane, NOTE)?,
            duration: number(entry, duration, NOTE)?,
        }),
        ("N", _) => Err(invalid_event(NOTE, entry)),
        ("E", name @ [_, ..]) => Ok(NoteEvent::event(joined_text(name))),
        ("E", _) => Err(invalid_event(EVENT, entry)),
        ("S", [kind, duration]) => Ok(NoteEvent::StarPower {
            kind: number(entry, kind, STAR_POWER)?,
            duration: number(entry, duration, STAR_POWER)?,
        }),
        ("S", _) => Err(invalid_event(STAR_POWER, entry)),
        (tag, _) => Err(unknown_event(section, tag, entry)),
    }
}
