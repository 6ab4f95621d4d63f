//! Queries over the sync track: values effective at a tick, and the conversion between ticks and
//! seconds under a variable tempo.
//!
//! Every query is a forward scan from tick 0. Charts hold at most a few hundred sync events, so
//! nothing is cached and a [`TempoMap`] is only a borrowed view.

use super::{
    Chart,
    event::{DEFAULT_TEMPO, SyncEvent, TextEvent},
    track::{Tick, Track},
};

/// A read-only view of the tracks the tempo queries need.
#[derive(Debug, Clone, Copy)]
pub struct TempoMap<'a> {
    sync_track: &'a Track<SyncEvent>,
    events: &'a Track<TextEvent>,
    resolution: u32,
}

impl<'a> TempoMap<'a> {
    /// Creates a view over the tracks, measured in `resolution` ticks per quarter note.
    #[must_use]
    pub const fn new(
        sync_track: &'a Track<SyncEvent>,
        events: &'a Track<TextEvent>,
        resolution: u32,
    ) -> Self {
        Self {
            sync_track,
            events,
            resolution,
        }
    }

    /// The tempo value in effect at `position`, or `None` before the first tempo event.
    #[must_use]
    pub fn bps_at(&self, position: Tick) -> Option<u32> {
        self.sync_track
            .range(..=position)
            .flat_map(|(_, events)| events)
            .filter_map(SyncEvent::tempo)
            .last()
    }

    /// The time signature numerator in effect at `position`, or `None` before the first one.
    #[must_use]
    pub fn signature_at(&self, position: Tick) -> Option<u32> {
        self.sync_track
            .range(..=position)
            .flat_map(|(_, events)| events)
            .filter_map(SyncEvent::numerator)
            .last()
    }

    /// The name of the last global event at or before `position`.
    #[must_use]
    pub fn event_at(&self, position: Tick) -> Option<&'a str> {
        self.events
            .range(..=position)
            .flat_map(|(_, events)| events)
            .last()
            .map(|event| event.name.as_str())
    }

    /// Ticks where the tempo changes, with the tempo from there on. Zero tempos are skipped.
    fn tempo_changes(&self) -> impl Iterator<Item = (Tick, u32)> + 'a {
        self.sync_track.iter().filter_map(|(tick, events)| {
            events
                .iter()
                .filter_map(SyncEvent::tempo)
                .filter(|&tempo| tempo != 0)
                .last()
                .map(|tempo| (tick, tempo))
        })
    }

    fn seconds_per_tick(&self, tempo: u32) -> f64 {
        60_000.0 / f64::from(tempo) / f64::from(self.resolution)
    }

    /// Elapsed seconds from tick 0 to `position`. The tempo is [`DEFAULT_TEMPO`] until the first
    /// tempo event.
    #[must_use]
    pub fn position_to_seconds(&self, position: Tick) -> f64 {
        let mut tempo = DEFAULT_TEMPO;
        let mut last = 0;
        let mut elapsed = 0.0;
        for (tick, next) in self.tempo_changes() {
            if tick >= position {
                break;
            }
            elapsed += (tick - last) as f64 * self.seconds_per_tick(tempo);
            tempo = next;
            last = tick;
        }
        elapsed + (position - last) as f64 * self.seconds_per_tick(tempo)
    }

    /// The fractional tick reached after `seconds`, the inverse of
    /// [`TempoMap::position_to_seconds`]. Negative input is treated as zero.
    #[must_use]
    pub fn seconds_to_position(&self, seconds: f64) -> f64 {
        let seconds = seconds.max(0.0);
        let mut tempo = DEFAULT_TEMPO;
        let mut last = 0;
        let mut elapsed = 0.0;
        for (tick, next) in self.tempo_changes() {
            let end = elapsed + (tick - last) as f64 * self.seconds_per_tick(tempo);
            if end > seconds {
                break;
            }
            elapsed = end;
            tempo = next;
            last = tick;
        }
        last as f64 + (seconds - elapsed) / self.seconds_per_tick(tempo)
    }
}

impl Chart {
    /// Views the sync and events tracks as a [`TempoMap`].
    #[must_use]
    pub const fn tempo_map(&self) -> TempoMap<'_> {
        TempoMap::new(&self.sync_track, &self.events, self.song.resolution)
    }

    /// See [`TempoMap::bps_at`].
    #[must_use]
    pub fn bps_at(&self, position: Tick) -> Option<u32> {
        self.tempo_map().bps_at(position)
    }

    /// See [`TempoMap::signature_at`].
    #[must_use]
    pub fn signature_at(&self, position: Tick) -> Option<u32> {
        self.tempo_map().signature_at(position)
    }

    /// See [`TempoMap::event_at`].
    #[must_use]
    pub fn event_at(&self, position: Tick) -> Option<&str> {
        self.tempo_map().event_at(position)
    }

    /// See [`TempoMap::position_to_seconds`].
    #[must_use]
    pub fn position_to_seconds(&self, position: Tick) -> f64 {
        self.tempo_map().position_to_seconds(position)
    }

    /// See [`TempoMap::seconds_to_position`].
    #[must_use]
    pub fn seconds_to_position(&self, seconds: f64) -> f64 {
        self.tempo_map().seconds_to_position(seconds)
    }
}
