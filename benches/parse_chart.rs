//! Benchmark for `.chart` parsing, writing and the tempo map.

use chart_rs::prelude::*;
use criterion::{Criterion, Throughput};

struct ChartFile {
    name: String,
    source: String,
}

fn scan_chart_files() -> Vec<ChartFile> {
    std::fs::read_dir("tests/files")
        .expect("Failed to read directory")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "chart"))
        .filter_map(|path| {
            let name = path.file_stem()?.to_str().map(String::from)?;
            let source = std::fs::read_to_string(&path).expect("Failed to load test file");
            Some(ChartFile { name, source })
        })
        .collect()
}

fn bench_parse_chart(c: &mut Criterion, files: &[ChartFile]) {
    let mut group = c.benchmark_group("parse_chart");
    for file in files {
        group.throughput(Throughput::Bytes(file.source.len() as u64));
        group.bench_function(&file.name, |b| {
            b.iter(|| parse(std::hint::black_box(&file.source)));
        });
    }
    group.finish();
}

fn bench_stringify_chart(c: &mut Criterion, files: &[ChartFile]) {
    let mut group = c.benchmark_group("stringify_chart");
    for file in files {
        let chart = parse(&file.source).expect("Failed to parse test file");
        group.bench_function(&file.name, |b| {
            b.iter(|| std::hint::black_box(&chart).stringify(StringifyOptions::default()));
        });
    }
    group.finish();
}

fn bench_tempo_map(c: &mut Criterion, files: &[ChartFile]) {
    let mut group = c.benchmark_group("tempo_map");
    for file in files {
        let chart = parse(&file.source).expect("Failed to parse test file");
        let last = chart.last_note_position();
        group.bench_function(&file.name, |b| {
            b.iter(|| {
                let seconds = chart.position_to_seconds(std::hint::black_box(last));
                chart.seconds_to_position(seconds)
            });
        });
    }
    group.finish();
}

fn main() {
    let files = scan_chart_files();
    let mut criterion = Criterion::default();
    bench_parse_chart(&mut criterion, &files);
    bench_stringify_chart(&mut criterion, &files);
    bench_tempo_map(&mut criterion, &files);
}
