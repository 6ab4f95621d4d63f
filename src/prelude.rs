//! Prelude module for the crate.
//!
//! You can use `use chart_rs::prelude::*;` to import the model, the codec and the loaders at once.

#[cfg(feature = "diagnostics")]
pub use crate::diagnostics::{SimpleSource, ToAriadne, emit_parse_error};
#[cfg(feature = "midi")]
pub use crate::midi::{MidiError, import_midi, parse_midi};
pub use crate::{
    chart::{
        Chart, ChartError, MergeOptions, NamedTracks,
        event::{
            DEFAULT_TEMPO, DEFAULT_TIME_SIGNATURE, FORCED_LANE, NoteEvent, OPEN_LANE, SyncEvent,
            TAP_LANE, TextEvent,
        },
        lex::{
            LexError, LexErrorWithRange, parse_lex_tokens,
            token::{Token, TokenWithRange, Value},
        },
        mixin::{SourceRangeMixin, SourceRangeMixinExt},
        parse::{ParseError, ParseErrorKind, RawChart, parse, parse_raw},
        song::{DEFAULT_RESOLUTION, SongMetadata},
        tempo::TempoMap,
        track::{Tick, Track, rescale_tick},
        track_name::{Difficulty, Instrument, TrackName, section_order},
        unparse::{StringifyOptions, stringify},
    },
    import::{
        ChartOutput, EVENTS_TRACK, ImportOptions, ImportWarning, NoteStream, STAR_POWER_KEY,
        StreamEvent, StreamEventKind, base_key, import_note_stream, instrument_of_track,
    },
    io::{ChartFormat, LoadError, load, resolve_chart_path, save},
};
