//! Building a [`Chart`] from a delta-timed note stream, such as the tracks of a MIDI file.
//!
//! A [`NoteStream`] is a list of tracks, each a list of [`StreamEvent`]s whose `delta` counts
//! ticks since the previous event of the same track. [`crate::midi`] produces one from a
//! Standard MIDI File, but any producer following the same shape works.
//!
//! The mapping follows the Rock Band style MIDI layout:
//!
//! - Tracks are recognized by their name. `EVENTS` holds section markers, and the `PART ...`
//!   tracks hold notes, see [`instrument_of_track`].
//! - Each difficulty uses six keys from a base key: five frets then the forced lane. Key
//!   [`STAR_POWER_KEY`] marks star power phrases.
//! - Phase Shift style SysEx messages toggle open and tap notes per difficulty.
//!
//! Events that cannot be placed are reported as [`ImportWarning`]s beside the chart, never as
//! errors.

use std::cmp::Reverse;

use thiserror::Error;

use crate::chart::{
    Chart,
    event::{
        DEFAULT_TEMPO, DEFAULT_TIME_SIGNATURE, FORCED_LANE, NoteEvent, OPEN_LANE, SyncEvent,
        TAP_LANE, TextEvent,
    },
    song::SongMetadata,
    track::Tick,
    track_name::{Difficulty, Instrument, TrackName},
};

/// Key marking a star power phrase on instrument tracks.
pub const STAR_POWER_KEY: u8 = 116;

/// Number of keys each difficulty uses: five frets and the forced lane.
const KEYS_PER_DIFFICULTY: u8 = 6;

/// Name of the track holding global events.
pub const EVENTS_TRACK: &str = "EVENTS";

/// A delta-timed event stream split into tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteStream {
    /// Ticks per quarter note.
    pub resolution: u32,
    /// The tracks, each in time order.
    pub tracks: Vec<Vec<StreamEvent>>,
}

/// One event of a [`NoteStream`] track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamEvent {
    /// Ticks since the previous event on the same track.
    pub delta: Tick,
    /// What happens.
    pub kind: StreamEventKind,
}

impl StreamEvent {
    /// Creates a new event.
    #[must_use]
    pub const fn new(delta: Tick, kind: StreamEventKind) -> Self {
        Self { delta, kind }
    }
}

/// The content of a [`StreamEvent`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamEventKind {
    /// Tempo change, in microseconds per quarter note.
    Tempo {
        /// Microseconds per quarter note.
        micros_per_beat: u32,
    },
    /// Time signature change.
    TimeSignature {
        /// Beats per measure.
        numerator: u32,
    },
    /// The name of the track.
    TrackName(String),
    /// A text event.
    Text(String),
    /// A lyric syllable.
    Lyric(String),
    /// A key pressed.
    NoteOn {
        /// The key number.
        key: u8,
        /// The channel number.
        channel: u8,
    },
    /// A key released.
    NoteOff {
        /// The key number.
        key: u8,
        /// The channel number.
        channel: u8,
    },
    /// A system exclusive message, without the leading `F0`.
    SysEx(Vec<u8>),
    /// The end of the track.
    EndOfTrack,
    /// Anything else, described for warnings.
    Unsupported(String),
}

/// Options for [`import_note_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportOptions {
    /// Round tempos down as the legacy editors do. Otherwise round to the nearest value.
    pub legacy_compat: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            legacy_compat: true,
        }
    }
}

/// An event of the stream that was not placed into the chart.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportWarning {
    /// The event has no counterpart in the chart.
    #[error("unresolved event on track {track} at tick {tick}: {description}")]
    UnresolvedEvent {
        /// Index of the stream track.
        track: usize,
        /// Absolute tick of the event.
        tick: Tick,
        /// What the event was.
        description: String,
    },
    /// A SysEx message other than the open and tap note toggles.
    #[error("unknown SysEx on track {track} at tick {tick}: {data:02X?}")]
    UnknownSysEx {
        /// Index of the stream track.
        track: usize,
        /// Absolute tick of the event.
        tick: Tick,
        /// The message bytes.
        data: Vec<u8>,
    },
}

/// A chart with the warnings found while loading it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartOutput {
    /// The loaded chart.
    pub chart: Chart,
    /// Warnings that occurred during loading.
    pub warnings: Vec<ImportWarning>,
}

/// The instrument whose notes a stream track carries, by the track name.
#[must_use]
pub fn instrument_of_track(name: &str) -> Option<Instrument> {
    Some(match name {
        "PART GUITAR" => Instrument::Single,
        "PART GUITAR COOP" => Instrument::DoubleGuitar,
        "PART BASS" => Instrument::DoubleBass,
        "PART RHYTHM" => Instrument::DoubleRhythm,
        "PART KEYS" => Instrument::Keyboard,
        _ => return None,
    })
}

/// The lowest key of the notes of `difficulty`.
#[must_use]
pub const fn base_key(difficulty: Difficulty) -> u8 {
    match difficulty {
        Difficulty::Easy => 60,
        Difficulty::Medium => 72,
        Difficulty::Hard => 84,
        Difficulty::Expert => 96,
    }
}

/// The difficulty and lane of a note key.
fn lane_of_key(key: u8) -> Option<(Difficulty, u32)> {
    Difficulty::ALL.into_iter().find_map(|difficulty| {
        let offset = key.checked_sub(base_key(difficulty))?;
        (offset < KEYS_PER_DIFFICULTY).then_some((difficulty, u32::from(offset)))
    })
}

/// Converts a MIDI tempo into the tempo value of a chart.
fn tempo_value(micros_per_beat: u32, options: ImportOptions) -> Option<u32> {
    const SCALED_MICROS_PER_MINUTE: u64 = 60_000_000_000;
    let micros = u64::from(micros_per_beat);
    if micros == 0 {
        return None;
    }
    let value = if options.legacy_compat {
        SCALED_MICROS_PER_MINUTE / micros
    } else {
        (SCALED_MICROS_PER_MINUTE + micros / 2) / micros
    };
    u32::try_from(value).ok()
}

/// Which note kind a difficulty currently writes, toggled by SysEx messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NoteModifiers {
    open: bool,
    tap: bool,
}

/// A toggle carried by a SysEx message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Open,
    Tap,
}

impl NoteModifiers {
    fn set(&mut self, modifier: Modifier, on: bool) {
        match modifier {
            Modifier::Open => self.open = on,
            Modifier::Tap => self.tap = on,
        }
    }
}

/// Which difficulties a SysEx toggle applies to.
fn sysex_difficulties(code: u8) -> Option<&'static [Difficulty]> {
    let difficulties: &'static [Difficulty] = match code {
        0 => &[Difficulty::Easy],
        1 => &[Difficulty::Medium],
        2 => &[Difficulty::Hard],
        3 => &[Difficulty::Expert],
        0xFF => &Difficulty::ALL,
        _ => return None,
    };
    Some(difficulties)
}

/// Placement state of one difficulty within one stream track.
#[derive(Debug, Clone, Copy)]
struct DifficultyState {
    modifiers: NoteModifiers,
    /// Tick of the latest note, or far before the start.
    last_note: i64,
    /// Tick of the note before the latest one.
    last_timed_note: i64,
    has_notes: bool,
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self {
            modifiers: NoteModifiers::default(),
            last_note: -2000,
            last_timed_note: -2000,
            has_notes: false,
        }
    }
}

struct TrackImporter<'c> {
    chart: &'c mut Chart,
    warnings: &'c mut Vec<ImportWarning>,
    options: ImportOptions,
    index: usize,
    name: Option<String>,
    difficulties: [DifficultyState; 4],
    star_power: Vec<(Tick, Tick)>,
}

impl TrackImporter<'_> {
    fn resolution(&self) -> i64 {
        i64::from(self.chart.song.resolution)
    }

    fn instrument(&self) -> Option<Instrument> {
        self.name.as_deref().and_then(instrument_of_track)
    }

    fn run(mut self, events: &[StreamEvent]) {
        let mut tick: Tick = 0;
        for (index, event) in events.iter().enumerate() {
            tick += event.delta;
            match &event.kind {
                &StreamEventKind::Tempo { micros_per_beat } => {
                    if let Some(value) = tempo_value(micros_per_beat, self.options) {
                        self.chart.sync_track.push(tick, SyncEvent::Tempo(value));
                    } else {
                        self.unresolved(tick, format!("tempo of {micros_per_beat} us per beat"));
                    }
                }
                &StreamEventKind::TimeSignature { numerator } => {
                    self.chart
                        .sync_track
                        .push(tick, SyncEvent::time_signature(numerator));
                }
                StreamEventKind::TrackName(name) => self.name = Some(name.clone()),
                StreamEventKind::Text(text) => {
                    if self.name.as_deref() == Some(EVENTS_TRACK) {
                        self.chart.events.push(tick, TextEvent::new(event_name(text)));
                    }
                }
                StreamEventKind::Lyric(text) => {
                    self.chart.events.push(tick, TextEvent::lyric(text));
                }
                &StreamEventKind::NoteOn { key, channel } => {
                    let rest = events.get(index + 1..).unwrap_or_default();
                    self.note_on(tick, key, sustain_length(rest, key, channel));
                }
                StreamEventKind::SysEx(data) => self.sysex(tick, data),
                StreamEventKind::NoteOff { .. } | StreamEventKind::EndOfTrack => {}
                StreamEventKind::Unsupported(description) => {
                    self.unresolved(tick, description.clone());
                }
            }
        }
        self.attach_star_power();
    }

    fn note_on(&mut self, tick: Tick, key: u8, length: Tick) {
        let Some(instrument) = self.instrument() else {
            return;
        };
        let resolution = self.resolution();
        let sustain = |lane: Option<u32>| {
            if lane == Some(FORCED_LANE) || 3 * length as i64 <= resolution {
                0
            } else {
                length
            }
        };

        if key == STAR_POWER_KEY {
            self.star_power.push((tick, sustain(None)));
            return;
        }
        let Some((difficulty, lane)) = lane_of_key(key) else {
            return;
        };
        let duration = sustain(Some(lane));
        let state = &mut self.difficulties[difficulty as usize];
        let now = tick as i64;
        let since_last = now - state.last_timed_note;
        if lane == FORCED_LANE && 3 * since_last <= resolution + 6 {
            return;
        }

        let track = self
            .chart
            .track_mut(TrackName::new(difficulty, instrument));
        if state.modifiers.open {
            track.push(tick, NoteEvent::note(OPEN_LANE, duration));
        } else {
            if state.modifiers.tap && state.last_note != now {
                track.push(tick, NoteEvent::note(TAP_LANE, 0));
            }
            track.push(tick, NoteEvent::note(lane, duration));
        }
        if now > state.last_note {
            state.last_timed_note = state.last_note;
            state.last_note = now;
        }
        state.has_notes = true;
    }

    /// Applies a `50 53 00 00 <difficulty> <type> <on> F7` toggle.
    fn sysex(&mut self, tick: Tick, data: &[u8]) {
        let (code, kind, on) = match *data {
            [0x50, 0x53, 0x00, 0x00, code, kind, on]
            | [0x50, 0x53, 0x00, 0x00, code, kind, on, 0xF7] => (code, kind, on),
            _ => {
                self.unknown_sysex(tick, data);
                return;
            }
        };
        let Some(difficulties) = sysex_difficulties(code) else {
            self.unknown_sysex(tick, data);
            return;
        };
        let modifier = match kind {
            1 => Modifier::Open,
            4 => Modifier::Tap,
            _ => return,
        };
        for &difficulty in difficulties {
            self.difficulties[difficulty as usize]
                .modifiers
                .set(modifier, on == 1);
        }
    }

    /// Adds the star power phrases to every difficulty that got notes, or to Expert if none did.
    fn attach_star_power(&mut self) {
        let Some(instrument) = self.instrument() else {
            return;
        };
        if self.star_power.is_empty() {
            return;
        }
        let mut targets: Vec<_> = Difficulty::ALL
            .into_iter()
            .filter(|&difficulty| self.difficulties[difficulty as usize].has_notes)
            .collect();
        if targets.is_empty() {
            targets.push(Difficulty::Expert);
        }
        for difficulty in targets {
            let track = self
                .chart
                .track_mut(TrackName::new(difficulty, instrument));
            for &(tick, duration) in &self.star_power {
                track.push(tick, NoteEvent::star_power(duration));
            }
        }
    }

    fn unresolved(&mut self, tick: Tick, description: String) {
        tracing::warn!(track = self.index, tick, %description, "unresolved stream event");
        self.warnings.push(ImportWarning::UnresolvedEvent {
            track: self.index,
            tick,
            description,
        });
    }

    fn unknown_sysex(&mut self, tick: Tick, data: &[u8]) {
        tracing::warn!(track = self.index, tick, ?data, "unknown SysEx message");
        self.warnings.push(ImportWarning::UnknownSysEx {
            track: self.index,
            tick,
            data: data.to_vec(),
        });
    }
}

/// Ticks until the note-off of `key` on `channel`, or until the end of the track.
fn sustain_length(rest: &[StreamEvent], key: u8, channel: u8) -> Tick {
    let mut length = 0;
    for event in rest {
        length += event.delta;
        if event.kind == (StreamEventKind::NoteOff { key, channel }) {
            break;
        }
    }
    length
}

/// `[name]` markers name their content, other texts are kept whole.
fn event_name(text: &str) -> &str {
    text.find('[')
        .and_then(|open| {
            let inner = &text[open + 1..];
            inner.rfind(']').map(|close| &inner[..close])
        })
        .filter(|name| !name.is_empty())
        .unwrap_or(text)
}

fn imported_song(resolution: u32) -> SongMetadata {
    let mut song = SongMetadata::new(resolution);
    song.offset = Some(0.0);
    song.player2 = Some("bass".to_owned());
    song.difficulty = Some(0);
    song.preview_start = Some(0.0);
    song.preview_end = Some(0.0);
    song.genre = Some("rock".to_owned());
    song.media_type = Some("cd".to_owned());
    song
}

/// Fills in the sync events every chart starts with, and orders events on shared ticks: notes
/// before other note events, global events by name descending, ignoring case.
fn finalize(chart: &mut Chart) {
    let mut at_zero = chart.sync_track.remove(0).unwrap_or_default();
    if !at_zero
        .iter()
        .any(|event| matches!(event, SyncEvent::TimeSignature { .. }))
    {
        at_zero.insert(0, SyncEvent::time_signature(DEFAULT_TIME_SIGNATURE));
    }
    if !at_zero.iter().any(|event| event.tempo().is_some()) {
        at_zero.push(SyncEvent::Tempo(DEFAULT_TEMPO));
    }
    chart.sync_track.insert(0, at_zero);

    for track in chart.tracks.values_mut() {
        for events in track.lists_mut() {
            events.sort_by_key(|event| !event.is_note());
        }
    }
    for events in chart.events.lists_mut() {
        events.sort_by_cached_key(|event| Reverse(event.name.to_lowercase()));
    }
}

/// Builds a chart from `stream`.
///
/// The song metadata gets the defaults legacy editors write for imported songs, and tick 0 of
/// the sync track always holds a time signature and a tempo.
#[must_use]
pub fn import_note_stream(stream: &NoteStream, options: ImportOptions) -> ChartOutput {
    let mut chart = Chart::new(imported_song(stream.resolution));
    let mut warnings = vec![];
    for (index, events) in stream.tracks.iter().enumerate() {
        TrackImporter {
            chart: &mut chart,
            warnings: &mut warnings,
            options,
            index,
            name: None,
            difficulties: Default::default(),
            star_power: vec![],
        }
        .run(events);
    }
    finalize(&mut chart);
    ChartOutput { chart, warnings }
}
