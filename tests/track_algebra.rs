use chart_rs::prelude::*;
use pretty_assertions::assert_eq;

fn notes(entries: &[(Tick, u32)]) -> Track<NoteEvent> {
    let mut track = Track::new();
    track.extend(
        entries
            .iter()
            .map(|&(tick, lane)| (tick, NoteEvent::note(lane, 0))),
    );
    track
}

#[test]
fn test_iteration_is_ascending() {
    let track = notes(&[(768, 0), (0, 1), (384, 2), (0, 3)]);
    let ticks: Vec<_> = track.iter().map(|(tick, _)| tick).collect();
    assert_eq!(ticks, vec![0, 384, 768]);
    assert_eq!(
        track.get(0),
        Some(&[NoteEvent::note(1, 0), NoteEvent::note(3, 0)][..])
    );
}

#[test]
fn test_concat_splices_but_map_overwrites() {
    let left = notes(&[(0, 0), (192, 1)]);
    let right = notes(&[(192, 2), (384, 3)]);

    let joined = left.concat(&right);
    assert_eq!(
        joined.get(192),
        Some(&[NoteEvent::note(1, 0), NoteEvent::note(2, 0)][..])
    );
    assert_eq!(joined.len(), 3);

    let collapsed = joined.map_positions(|tick| tick / 384 * 384);
    assert_eq!(collapsed.get(0), joined.get(192));
    assert_eq!(collapsed.get(384), joined.get(384));
    assert_eq!(collapsed.len(), 2);
}

#[test]
fn test_rescale_drops_collapsed_entries() {
    let track = notes(&[(0, 0), (1, 1), (2, 2)]);
    let halved = track.rescale(192, 96);
    assert_eq!(rescale_tick(1, 192, 96), 1);
    assert_eq!(halved.get(0), Some(&[NoteEvent::note(0, 0)][..]));
    assert_eq!(halved.get(1), Some(&[NoteEvent::note(2, 0)][..]));
    assert_eq!(halved.len(), 2);
}

#[test]
fn test_rescale_rounds_half_up() {
    assert_eq!(rescale_tick(1, 2, 1), 1);
    assert_eq!(rescale_tick(3, 2, 1), 2);
    assert_eq!(rescale_tick(100, 192, 480), 250);
    assert_eq!(rescale_tick(1, 480, 192), 0);
    assert_eq!(rescale_tick(2, 480, 192), 1);
}

#[test]
fn test_rescale_round_trip_converges() {
    const PAIRS: [(u32, u32); 5] = [(192, 192), (192, 480), (120, 192), (192, 200), (480, 960)];
    for (low, high) in PAIRS {
        for tick in 0..5000 {
            let back = rescale_tick(rescale_tick(tick, low, high), high, low);
            assert!(
                back.abs_diff(tick) <= 1,
                "{tick} via {low} -> {high} came back as {back}"
            );
        }
    }

    let sparse = notes(&[(0, 0), (96, 1), (193, 2), (1000, 3)]);
    assert_eq!(sparse.rescale(192, 480).rescale(480, 192), sparse);
}

#[test]
fn test_concat_requires_same_resolution() {
    let left = Chart::new(SongMetadata::new(192));
    let right = Chart::new(SongMetadata::new(480));
    assert_eq!(
        left.concat(&right),
        Err(ChartError::ResolutionMismatch {
            left: 192,
            right: 480
        })
    );
}

#[test]
fn test_chart_concat_and_merge() {
    let mut left = Chart::new(SongMetadata::new(192));
    left.track_mut("ExpertSingle").push(0, NoteEvent::note(0, 0));
    left.events.push(0, TextEvent::section("Intro"));
    let mut right = Chart::new(SongMetadata::new(192));
    right.track_mut("ExpertSingle").push(0, NoteEvent::note(4, 0));
    right.track_mut("HardSingle").push(96, NoteEvent::note(1, 0));
    right.events.push(0, TextEvent::section("Outro"));

    let joined = left.concat(&right).unwrap();
    assert_eq!(
        joined.track("ExpertSingle").unwrap().get(0),
        Some(&[NoteEvent::note(0, 0), NoteEvent::note(4, 0)][..])
    );
    assert_eq!(joined.events.get(0).map(<[_]>::len), Some(2));
    assert!(joined.track("HardSingle").is_some());

    let mut merged = left.clone();
    merged.merge_with(
        &right,
        |tick| tick,
        MergeOptions {
            ignore_sync: false,
            ignore_events: true,
        },
    );
    assert_eq!(
        merged.track("ExpertSingle").unwrap().get(0),
        Some(&[NoteEvent::note(4, 0)][..])
    );
    assert_eq!(merged.events, left.events);
    assert_eq!(
        merged.track("HardSingle").unwrap().get(96),
        Some(&[NoteEvent::note(1, 0)][..])
    );
}

#[test]
fn test_convert_resolution_keeps_musical_time() {
    let mut chart = Chart::new(SongMetadata::new(192));
    chart.sync_track.push(0, SyncEvent::Tempo(DEFAULT_TEMPO));
    chart.sync_track.push(384, SyncEvent::Tempo(60_000));
    chart.track_mut("ExpertSingle").push(576, NoteEvent::note(0, 0));
    let before = chart.position_to_seconds(576);

    chart.convert_resolution(480);
    assert_eq!(chart.resolution(), 480);
    assert_eq!(chart.last_note_position(), 1440);
    assert!((chart.position_to_seconds(1440) - before).abs() < 1e-9);
}
