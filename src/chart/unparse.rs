//! Unparse [`Chart`] into [`Token`]s and the chart format text.
//!
//! The tokens are built directly from the model, so writing never goes through the parser. The
//! text is the [`Display`](std::fmt::Display) of each token on its own line.

use std::borrow::Cow;

use itertools::Itertools;

use super::{
    Chart,
    event::{FORCED_LANE, NoteEvent, SyncEvent},
    lex::token::{Token, Value, is_bare_safe},
    parse::{EVENTS_SECTION, SONG_SECTION, SYNC_TRACK_SECTION},
    song::SongMetadata,
    track::Track,
    track_name::section_order,
};

/// Options for [`Chart::stringify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringifyOptions {
    /// Write `N 5 <duration>` lines with one trailing space, as the legacy editors do. Some
    /// tools compare files byte by byte against their output.
    pub legacy_compat: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        Self {
            legacy_compat: true,
        }
    }
}

fn number<'a>(value: impl ToString) -> Value<'a> {
    Value::plain(value.to_string())
}

fn bare_or_quoted(text: &str) -> Value<'_> {
    if is_bare_safe(text) {
        Value::plain(text)
    } else {
        Value::quoted(text)
    }
}

impl Chart {
    /// Converts the chart into tokens in saving order: `Song`, `SyncTrack`, `Events`, then the
    /// note tracks ordered by [`section_order`].
    #[must_use]
    pub fn unparse<'a>(&'a self, options: StringifyOptions) -> Vec<Token<'a>> {
        let mut tokens = vec![Token::section(SONG_SECTION), Token::Open];
        unparse_song(&self.song, &mut tokens);
        tokens.push(Token::Close);

        tokens.push(Token::section(SYNC_TRACK_SECTION));
        tokens.push(Token::Open);
        unparse_track(&self.sync_track, &mut tokens, |event| {
            let values = match *event {
                SyncEvent::Tempo(value) => vec![number(value)],
                SyncEvent::TimeSignature {
                    numerator,
                    denominator_exp: None,
                } => vec![number(numerator)],
                SyncEvent::TimeSignature {
                    numerator,
                    denominator_exp: Some(exp),
                } => vec![number(numerator), number(exp)],
                SyncEvent::Anchor(micros) => vec![number(micros)],
            };
            (event.tag(), values, false)
        });
        tokens.push(Token::Close);

        tokens.push(Token::section(EVENTS_SECTION));
        tokens.push(Token::Open);
        unparse_track(&self.events, &mut tokens, |event| {
            ("E", vec![Value::quoted(event.name.as_str())], false)
        });
        tokens.push(Token::Close);

        for (name, track) in self
            .tracks
            .iter()
            .sorted_by(|(a, _), (b, _)| section_order(a, b))
        {
            tokens.push(Token::section(name.as_str()));
            tokens.push(Token::Open);
            unparse_track(track, &mut tokens, |event| match event {
                &NoteEvent::Note { lane, duration } => (
                    event.tag(),
                    vec![number(lane), number(duration)],
                    options.legacy_compat && lane == FORCED_LANE,
                ),
                NoteEvent::Event { name } => (event.tag(), vec![bare_or_quoted(name)], false),
                &NoteEvent::StarPower { kind, duration } => {
                    (event.tag(), vec![number(kind), number(duration)], false)
                }
            });
            tokens.push(Token::Close);
        }
        tokens
    }

    /// Writes the chart in the chart format. [`parse`](super::parse::parse) reads the result back
    /// into an equal chart.
    #[must_use]
    pub fn stringify(&self, options: StringifyOptions) -> String {
        self.unparse(options)
            .iter()
            .map(|token| format!("{token}\n"))
            .collect()
    }
}

/// Writes the chart in the chart format, see [`Chart::stringify`].
#[must_use]
pub fn stringify(chart: &Chart, options: StringifyOptions) -> String {
    chart.stringify(options)
}

fn unparse_song<'a>(song: &'a SongMetadata, tokens: &mut Vec<Token<'a>>) {
    let mut text = |key: &'static str, value: &'a Option<String>| {
        if let Some(value) = value {
            tokens.push(Token::entry(key, vec![Value::quoted(value.as_str())]));
        }
    };
    text("Name", &song.name);
    text("Artist", &song.artist);
    text("ArtistText", &song.artist_text);
    text("Charter", &song.charter);
    text("Album", &song.album);
    text("Year", &song.year);
    text("CountOff", &song.count_off);

    let mut entry = |key: &'static str, value: Option<Value<'a>>| {
        if let Some(value) = value {
            tokens.push(Token::entry(key, vec![value]));
        }
    };
    entry("Offset", song.offset.map(number));
    entry("Resolution", Some(number(song.resolution)));
    entry("Player2", song.player2.as_deref().map(bare_or_quoted));
    entry("Difficulty", song.difficulty.map(number));
    entry("PreviewStart", song.preview_start.map(number));
    entry("PreviewEnd", song.preview_end.map(number));
    entry("GuitarVol", song.guitar_vol.map(number));
    entry("BandVol", song.band_vol.map(number));
    entry("HoPo", song.hopo.map(number));
    entry("Singer", song.singer.as_deref().map(Value::quoted));
    entry("OriginalArtist", song.original_artist.map(number));
    entry("Genre", song.genre.as_deref().map(Value::quoted));
    entry("MediaType", song.media_type.as_deref().map(Value::quoted));
    entry("MusicStream", song.music_stream.as_deref().map(Value::quoted));
    entry("GuitarStream", song.guitar_stream.as_deref().map(Value::quoted));
    entry("BassStream", song.bass_stream.as_deref().map(Value::quoted));
    entry("RhythmStream", song.rhythm_stream.as_deref().map(Value::quoted));
    entry("DrumStream", song.drum_stream.as_deref().map(Value::quoted));

    // Kept as read, including any quotes.
    for (key, raw) in &song.extra {
        let values = if raw.is_empty() {
            vec![]
        } else {
            vec![Value::Bare(Cow::Borrowed(raw.as_str()))]
        };
        tokens.push(Token::entry(key.as_str(), values));
    }
}

fn unparse_track<'a, T>(
    track: &'a Track<T>,
    tokens: &mut Vec<Token<'a>>,
    mut fields: impl FnMut(&'a T) -> (&'static str, Vec<Value<'a>>, bool),
) {
    for (tick, event) in track.events() {
        let (tag, values, trailing_space) = fields(event);
        tokens.push(Token::Entry {
            key: Cow::Owned(tick.to_string()),
            values: std::iter::once(Value::plain(tag)).chain(values).collect(),
            trailing_space,
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chart::{event::TextEvent, parse::parse};

    fn sample() -> Chart {
        let mut song = SongMetadata::new(192);
        song.name = Some("Say \"Hi\"".to_owned());
        song.offset = Some(0.0);
        song.player2 = Some("bass".to_owned());
        song.original_artist = Some(false);
        song.extra.push(("Icon".to_owned(), "custom".to_owned()));
        let mut chart = Chart::new(song);
        chart.sync_track.push(0, SyncEvent::time_signature(4));
        chart.sync_track.push(0, SyncEvent::Tempo(120_000));
        chart.events.push(0, TextEvent::section("Intro"));
        let track = chart.track_mut("ExpertSingle");
        track.push(192, NoteEvent::note(0, 96));
        track.push(192, NoteEvent::note(FORCED_LANE, 0));
        track.push(384, NoteEvent::event("solo"));
        track.push(384, NoteEvent::star_power(192));
        chart.track_mut("EasySingle").push(0, NoteEvent::note(1, 0));
        chart
    }

    #[test]
    fn writes_sections_in_order() {
        let expected = r#"[Song]
{
  Name = "Say \"Hi\""
  Offset = 0
  Resolution = 192
  Player2 = bass
  OriginalArtist = false
  Icon = custom
}
[SyncTrack]
{
  0 = TS 4
  0 = B 120000
}
[Events]
{
  0 = E "section Intro"
}
[ExpertSingle]
{
  192 = N 0 96
  192 = N 5 0
  384 = E solo
  384 = S 2 192
}
[EasySingle]
{
  0 = N 1 0
}
"#;
        let options = StringifyOptions {
            legacy_compat: false,
        };
        assert_eq!(sample().stringify(options), expected);
    }

    #[test]
    fn legacy_trailing_space() {
        let text = sample().stringify(StringifyOptions::default());
        assert!(text.contains("  192 = N 5 0 \n"));
        assert!(text.contains("  192 = N 0 96\n"));
    }

    #[test]
    fn round_trips() {
        let chart = sample();
        let text = stringify(&chart, StringifyOptions::default());
        assert_eq!(parse(&text).unwrap(), chart);
    }

    #[test]
    fn quotes_spaced_track_events() {
        let mut chart = Chart::default();
        chart
            .track_mut("ExpertDrums")
            .push(0, NoteEvent::event("crowd clap"));
        let text = chart.stringify(StringifyOptions::default());
        assert!(text.contains("  0 = E \"crowd clap\"\n"));
        assert_eq!(parse(&text).unwrap(), chart);
    }
}
