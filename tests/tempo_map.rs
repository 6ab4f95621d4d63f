use chart_rs::prelude::*;
use pretty_assertions::assert_eq;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn chart_with_sync(events: &[(Tick, SyncEvent)]) -> Chart {
    let mut chart = Chart::new(SongMetadata::new(192));
    chart.sync_track.extend(events.iter().copied());
    chart
}

#[test]
fn test_single_tempo_converts_both_ways() {
    let chart = chart_with_sync(&[(0, SyncEvent::Tempo(120_000))]);
    assert_close(chart.position_to_seconds(192), 0.5);
    assert_close(chart.seconds_to_position(0.5), 192.0);
    assert_close(chart.position_to_seconds(0), 0.0);
}

#[test]
fn test_default_tempo_before_first_event() {
    let chart = Chart::new(SongMetadata::new(480));
    assert_eq!(chart.bps_at(0), None);
    assert_close(chart.position_to_seconds(480), 0.5);
    assert_close(chart.seconds_to_position(1.0), 960.0);
}

#[test]
fn test_queries_are_inclusive_at_position() {
    let chart = chart_with_sync(&[
        (0, SyncEvent::Tempo(120_000)),
        (100, SyncEvent::Tempo(150_000)),
        (100, SyncEvent::time_signature(3)),
    ]);
    assert_eq!(chart.bps_at(99), Some(120_000));
    assert_eq!(chart.bps_at(100), Some(150_000));
    assert_eq!(chart.signature_at(99), None);
    assert_eq!(chart.signature_at(100), Some(3));

    let late = chart_with_sync(&[(100, SyncEvent::Tempo(150_000))]);
    assert_eq!(late.bps_at(99), None);
    assert_eq!(late.bps_at(100), Some(150_000));
}

#[test]
fn test_conversion_across_tempo_changes() {
    let chart = chart_with_sync(&[
        (0, SyncEvent::Tempo(60_000)),
        (192, SyncEvent::time_signature(3)),
        (192, SyncEvent::Tempo(240_000)),
    ]);
    assert_close(chart.position_to_seconds(192), 1.0);
    assert_close(chart.position_to_seconds(384), 1.25);
    assert_close(chart.seconds_to_position(1.0), 192.0);
    assert_close(chart.seconds_to_position(1.125), 288.0);
    assert_close(chart.seconds_to_position(2.0), 192.0 + 4.0 * 192.0);

    for tick in [0, 50, 191, 192, 193, 1000] {
        assert_close(
            chart.seconds_to_position(chart.position_to_seconds(tick)),
            tick as f64,
        );
    }
}

#[test]
fn test_tempo_map_view_matches_chart() {
    let mut chart = chart_with_sync(&[(0, SyncEvent::Tempo(90_000))]);
    chart.events.push(10, TextEvent::section("Intro"));
    let map = chart.tempo_map();
    assert_eq!(map.bps_at(500), chart.bps_at(500));
    assert_eq!(map.event_at(9), None);
    assert_eq!(map.event_at(10), Some("section Intro"));
    assert_close(map.position_to_seconds(777), chart.position_to_seconds(777));
}

#[test]
fn test_find_section_position_is_loose() {
    let mut chart = Chart::new(SongMetadata::new(192));
    chart.events.push(0, TextEvent::new("Section Intro"));
    chart.events.push(384, TextEvent::new("Section Verse 1"));
    chart.events.push(768, TextEvent::new("section verse_1"));

    assert_eq!(chart.find_section_position("Verse_1"), Some(384));
    assert_eq!(chart.find_section_position("INTRO"), Some(0));
    assert_eq!(chart.find_section_position("Outro"), None);
}
