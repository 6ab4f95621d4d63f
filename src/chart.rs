//! The model of `.chart` note charts and its text codec.
//!
//! This module consists of the model, the tempo map and the codec:
//!
//! - [`Chart`] owns the [`SongMetadata`], the sync track, the global events track and the note
//!   tracks named by their section header. Every track is a [`Track`], and the whole-chart
//!   transforms here apply the track algebra to all of them at once.
//! - [`tempo`] provides the point queries and the conversion between ticks and seconds.
//! - [`lex`], [`parse`] and [`unparse`] convert between the text format and [`Chart`].
//!
//! In detail, our policies are:
//!
//! - Support only UTF-8 (as required `&str` to input).
//! - Keep every track ordered by tick, and events on one tick in their written order.
//! - Reject malformed input as a whole, never returning a partial chart.

pub mod event;
pub mod lex;
pub mod mixin;
pub mod parse;
pub mod song;
pub mod tempo;
pub mod track;
pub mod track_name;
pub mod unparse;

use std::collections::BTreeMap;

use thiserror::Error;

use self::{
    event::{NoteEvent, SyncEvent, TextEvent},
    song::SongMetadata,
    track::{Tick, Track},
};

/// Note tracks keyed by their section header, such as `ExpertSingle`.
pub type NamedTracks = BTreeMap<String, Track<NoteEvent>>;

/// An error from a whole-chart operation.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChartError {
    /// Two charts with different resolutions cannot share tick positions. Convert one with
    /// [`Chart::convert_resolution`] first.
    #[error("resolution mismatch: {left} and {right}")]
    ResolutionMismatch {
        /// Resolution of the receiving chart.
        left: u32,
        /// Resolution of the other chart.
        right: u32,
    },
}

/// Which tracks [`Chart::merge_with`] leaves untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MergeOptions {
    /// Do not merge the sync track.
    pub ignore_sync: bool,
    /// Do not merge the global events track.
    pub ignore_events: bool,
}

/// A note chart.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    /// `[Song]`. The metadata, including the resolution of every tick in this chart.
    pub song: SongMetadata,
    /// `[SyncTrack]`. Tempo and time signature changes.
    pub sync_track: Track<SyncEvent>,
    /// `[Events]`. Sections, lyrics and other global cues.
    pub events: Track<TextEvent>,
    /// Every other section, keyed by its header.
    pub tracks: NamedTracks,
}

impl Chart {
    /// Creates an empty chart with the metadata.
    #[must_use]
    pub fn new(song: SongMetadata) -> Self {
        Self {
            song,
            sync_track: Track::new(),
            events: Track::new(),
            tracks: BTreeMap::new(),
        }
    }

    /// The ticks per quarter note of this chart.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.song.resolution
    }

    /// Gets the note track of the section named `name`.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&Track<NoteEvent>> {
        self.tracks.get(name)
    }

    /// Gets or creates the note track of the section named `name`.
    pub fn track_mut(&mut self, name: impl Into<String>) -> &mut Track<NoteEvent> {
        self.tracks.entry(name.into()).or_default()
    }

    /// Keeps only the entries whose tick satisfies `predicate`, on every track.
    #[must_use]
    pub fn filter_positions(&self, mut predicate: impl FnMut(Tick) -> bool) -> Self {
        Self {
            song: self.song.clone(),
            sync_track: self.sync_track.filter(&mut predicate),
            events: self.events.filter(&mut predicate),
            tracks: self
                .tracks
                .iter()
                .map(|(name, track)| (name.clone(), track.filter(&mut predicate)))
                .collect(),
        }
    }

    /// Moves every entry to `f(tick)`, on every track.
    ///
    /// On each track an entry landing on an occupied tick replaces it, see
    /// [`Track::map_positions`].
    #[must_use]
    pub fn map_positions(&self, mut f: impl FnMut(Tick) -> Tick) -> Self {
        Self {
            song: self.song.clone(),
            sync_track: self.sync_track.map_positions(&mut f),
            events: self.events.map_positions(&mut f),
            tracks: self
                .tracks
                .iter()
                .map(|(name, track)| (name.clone(), track.map_positions(&mut f)))
                .collect(),
        }
    }

    /// Joins the tracks of `other` into a new chart with the metadata of `self`, splicing the
    /// event lists on shared ticks. A note track present on only one side is joined with an empty
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::ResolutionMismatch`] if the resolutions differ.
    pub fn concat(&self, other: &Self) -> Result<Self, ChartError> {
        self.check_resolution(other)?;
        let empty = Track::new();
        let mut tracks = NamedTracks::new();
        for name in self.tracks.keys().chain(other.tracks.keys()) {
            if tracks.contains_key(name) {
                continue;
            }
            let left = self.tracks.get(name).unwrap_or(&empty);
            let right = other.tracks.get(name).unwrap_or(&empty);
            tracks.insert(name.clone(), left.concat(right));
        }
        Ok(Self {
            song: self.song.clone(),
            sync_track: self.sync_track.concat(&other.sync_track),
            events: self.events.concat(&other.events),
            tracks,
        })
    }

    /// Places the content of `other` into this chart at the ticks given by `remap`.
    ///
    /// An entry from `other` replaces the whole entry of `self` on the same target tick. Note
    /// tracks missing in `self` are created. Both charts are assumed to share a resolution.
    pub fn merge_with(
        &mut self,
        other: &Self,
        mut remap: impl FnMut(Tick) -> Tick,
        options: MergeOptions,
    ) {
        fn overwrite<T: Clone>(
            target: &mut Track<T>,
            source: &Track<T>,
            remap: &mut impl FnMut(Tick) -> Tick,
        ) {
            for (tick, events) in source {
                target.insert(remap(tick), events.to_vec());
            }
        }

        if !options.ignore_sync {
            overwrite(&mut self.sync_track, &other.sync_track, &mut remap);
        }
        if !options.ignore_events {
            overwrite(&mut self.events, &other.events, &mut remap);
        }
        for (name, track) in &other.tracks {
            overwrite(self.track_mut(name.as_str()), track, &mut remap);
        }
    }

    /// Rescales every track to `resolution` ticks per quarter note, in place.
    ///
    /// Ticks are rounded half up, and entries collapsing onto one tick keep only the later one,
    /// see [`Track::rescale`].
    ///
    /// # Panics
    ///
    /// Panics if `resolution` or the current resolution is zero.
    pub fn convert_resolution(&mut self, resolution: u32) {
        assert_ne!(resolution, 0, "resolution must be positive");
        let old = self.song.resolution;
        assert_ne!(old, 0, "chart resolution must be positive to convert from");
        if old == resolution {
            return;
        }
        self.sync_track = self.sync_track.rescale(old, resolution);
        self.events = self.events.rescale(old, resolution);
        for track in self.tracks.values_mut() {
            *track = track.rescale(old, resolution);
        }
        self.song.resolution = resolution;
    }

    /// The lowest tick occupied on any note track, or `0` if there is none.
    #[must_use]
    pub fn first_note_position(&self) -> Tick {
        self.tracks
            .values()
            .filter_map(Track::first_tick)
            .min()
            .unwrap_or(0)
    }

    /// The highest tick occupied on any note track, or `0` if there is none.
    #[must_use]
    pub fn last_note_position(&self) -> Tick {
        self.tracks
            .values()
            .filter_map(Track::last_tick)
            .max()
            .unwrap_or(0)
    }

    /// Finds the tick of the first `section <name>` event, comparing case-insensitively and
    /// treating `_` as a space.
    #[must_use]
    pub fn find_section_position(&self, name: &str) -> Option<Tick> {
        let wanted = normalize_section_name(&format!("section {name}"));
        self.events
            .events()
            .find(|(_, event)| normalize_section_name(&event.name) == wanted)
            .map(|(tick, _)| tick)
    }

    fn check_resolution(&self, other: &Self) -> Result<(), ChartError> {
        if self.song.resolution == other.song.resolution {
            Ok(())
        } else {
            Err(ChartError::ResolutionMismatch {
                left: self.song.resolution,
                right: other.song.resolution,
            })
        }
    }
}

fn normalize_section_name(name: &str) -> String {
    name.to_lowercase().replace('_', " ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample(resolution: u32) -> Chart {
        let mut chart = Chart::new(SongMetadata::new(resolution));
        chart.sync_track.push(0, SyncEvent::Tempo(120_000));
        chart.events.push(0, TextEvent::section("Intro"));
        chart.events.push(768, TextEvent::section("Verse 1"));
        let expert = chart.track_mut("ExpertSingle");
        expert.push(192, NoteEvent::note(0, 0));
        expert.push(384, NoteEvent::note(1, 0));
        chart
    }

    #[test]
    fn note_positions() {
        let mut chart = sample(192);
        chart.track_mut("HardSingle").push(96, NoteEvent::note(2, 0));
        assert_eq!(chart.first_note_position(), 96);
        assert_eq!(chart.last_note_position(), 384);
        assert_eq!(Chart::default().first_note_position(), 0);
        assert_eq!(Chart::default().last_note_position(), 0);
    }

    #[test]
    #[should_panic(expected = "chart resolution must be positive")]
    fn converting_from_zero_resolution_panics() {
        let mut chart = sample(0);
        chart.convert_resolution(192);
    }

    #[test]
    fn section_lookup_is_loose() {
        let chart = sample(192);
        assert_eq!(chart.find_section_position("Verse_1"), Some(768));
        assert_eq!(chart.find_section_position("intro"), Some(0));
        assert_eq!(chart.find_section_position("Chorus"), None);
    }

    #[test]
    fn concat_rejects_mixed_resolutions() {
        assert_eq!(
            sample(192).concat(&sample(480)),
            Err(ChartError::ResolutionMismatch {
                left: 192,
                right: 480
            })
        );
    }

    #[test]
    fn concat_unions_named_tracks() {
        let mut other = sample(192);
        other.tracks.clear();
        other.track_mut("ExpertDrums").push(0, NoteEvent::note(0, 0));
        let joined = sample(192).concat(&other).unwrap();
        assert_eq!(
            joined.tracks.keys().collect::<Vec<_>>(),
            vec!["ExpertDrums", "ExpertSingle"]
        );
        assert_eq!(
            joined.sync_track.get(0),
            Some(&[SyncEvent::Tempo(120_000), SyncEvent::Tempo(120_000)][..])
        );
    }

    #[test]
    fn merge_overwrites_target_ticks() {
        let mut base = sample(192);
        let mut phrase = Chart::new(SongMetadata::new(192));
        phrase.sync_track.push(0, SyncEvent::Tempo(150_000));
        phrase.track_mut("ExpertSingle").push(0, NoteEvent::note(4, 0));
        phrase.track_mut("ExpertKeyboard").push(0, NoteEvent::note(3, 0));

        base.merge_with(
            &phrase,
            |tick| tick + 192,
            MergeOptions {
                ignore_sync: true,
                ..Default::default()
            },
        );
        assert_eq!(
            base.track("ExpertSingle").unwrap().get(192),
            Some(&[NoteEvent::note(4, 0)][..])
        );
        assert_eq!(
            base.track("ExpertKeyboard").unwrap().get(192),
            Some(&[NoteEvent::note(3, 0)][..])
        );
        assert_eq!(base.sync_track.get(192), None);
    }

    #[test]
    fn convert_resolution_rescales_everything() {
        let mut chart = sample(192);
        chart.convert_resolution(480);
        assert_eq!(chart.resolution(), 480);
        assert_eq!(chart.find_section_position("Verse 1"), Some(1920));
        let ticks: Vec<_> = chart.tracks["ExpertSingle"]
            .iter()
            .map(|(tick, _)| tick)
            .collect();
        assert_eq!(ticks, vec![480, 960]);
    }

    #[test]
    fn filter_and_map_keep_metadata() {
        let mut chart = sample(192);
        chart.song.name = Some("Song".to_owned());
        let shifted = chart
            .filter_positions(|tick| tick >= 192)
            .map_positions(|tick| tick - 192);
        assert_eq!(shifted.song, chart.song);
        assert!(shifted.sync_track.is_empty());
        assert_eq!(shifted.find_section_position("Verse 1"), Some(576));
        assert_eq!(shifted.first_note_position(), 0);
    }

    #[test]
    fn copies_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Chart>();

        let chart = sample(192);
        let copy = chart.clone();
        let handle = std::thread::spawn(move || copy.last_note_position());
        assert_eq!(handle.join().unwrap(), chart.last_note_position());
    }
}
