//! Reading Standard MIDI Files into a [`NoteStream`] with `midly`.
//!
//! Only metrical timing is supported, as the ticks per quarter note become the chart
//! resolution. A note-on with velocity zero is read as a note-off.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use thiserror::Error;

use crate::{
    chart::track::Tick,
    import::{
        ChartOutput, ImportOptions, NoteStream, StreamEvent, StreamEventKind, import_note_stream,
    },
};

/// An error occurred when reading a MIDI file.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum MidiError {
    /// The bytes are not a valid Standard MIDI File.
    #[error("invalid MIDI file: {0}")]
    Parse(String),
    /// The file uses timecode timing or zero ticks per quarter note.
    #[error("unsupported MIDI timing, expected ticks per quarter note")]
    UnsupportedTiming,
}

/// Parses a Standard MIDI File into a [`NoteStream`].
///
/// # Errors
///
/// Returns [`MidiError::Parse`] for malformed files and [`MidiError::UnsupportedTiming`] for
/// files not timed in ticks per quarter note.
pub fn parse_midi(bytes: &[u8]) -> Result<NoteStream, MidiError> {
    let smf = Smf::parse(bytes).map_err(|err| MidiError::Parse(err.to_string()))?;
    let resolution = match smf.header.timing {
        Timing::Metrical(ticks) if ticks.as_int() > 0 => u32::from(ticks.as_int()),
        _ => return Err(MidiError::UnsupportedTiming),
    };
    let tracks = smf
        .tracks
        .iter()
        .map(|track| track.iter().map(stream_event).collect())
        .collect();
    Ok(NoteStream { resolution, tracks })
}

/// Parses a Standard MIDI File and builds a chart from it.
///
/// # Errors
///
/// Returns the errors of [`parse_midi`]. Events that cannot be placed are warnings in the output.
pub fn import_midi(bytes: &[u8], options: ImportOptions) -> Result<ChartOutput, MidiError> {
    let stream = parse_midi(bytes)?;
    tracing::debug!(
        resolution = stream.resolution,
        tracks = stream.tracks.len(),
        "importing MIDI"
    );
    Ok(import_note_stream(&stream, options))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn stream_event(event: &TrackEvent<'_>) -> StreamEvent {
    let kind = match event.kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => StreamEventKind::NoteOn {
                    key: key.as_int(),
                    channel,
                },
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    StreamEventKind::NoteOff {
                        key: key.as_int(),
                        channel,
                    }
                }
                other => StreamEventKind::Unsupported(format!("{other:?} on channel {channel}")),
            }
        }
        TrackEventKind::SysEx(data) => StreamEventKind::SysEx(data.to_vec()),
        TrackEventKind::Escape(data) => StreamEventKind::Unsupported(format!("escape {data:02X?}")),
        TrackEventKind::Meta(meta) => match meta {
            MetaMessage::Tempo(micros) => StreamEventKind::Tempo {
                micros_per_beat: micros.as_int(),
            },
            MetaMessage::TimeSignature(numerator, ..) => StreamEventKind::TimeSignature {
                numerator: u32::from(numerator),
            },
            MetaMessage::TrackName(name) => StreamEventKind::TrackName(text(name)),
            MetaMessage::Text(body) => StreamEventKind::Text(text(body)),
            MetaMessage::Lyric(body) => StreamEventKind::Lyric(text(body)),
            MetaMessage::EndOfTrack => StreamEventKind::EndOfTrack,
            other => StreamEventKind::Unsupported(format!("{other:?}")),
        },
    };
    StreamEvent::new(Tick::from(event.delta.as_int()), kind)
}
