//! Loading and saving charts on the file system.
//!
//! The file kind is chosen by extension: `.chart` files go through the text parser, and `.mid`
//! files through the MIDI importer when the `midi` feature is enabled. A path without either
//! extension is probed for a sibling with one.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[cfg(feature = "midi")]
use crate::midi::{MidiError, import_midi};
use crate::{
    chart::{
        Chart,
        parse::{ParseError, parse},
        unparse::StringifyOptions,
    },
    import::{ChartOutput, ImportOptions},
};

/// An error occurred when loading a chart file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither the path nor a `.chart` or `.mid` sibling of it is a chart file.
    #[error("no suitable chart found for {}", .0.display())]
    NotFound(PathBuf),
    /// The file could not be read.
    #[error("failed to read chart file: {0}")]
    Io(#[from] std::io::Error),
    /// The text chart is malformed.
    #[error("failed to parse chart: {0}")]
    Parse(#[from] ParseError),
    /// The MIDI file is malformed.
    #[cfg(feature = "midi")]
    #[error("failed to read MIDI chart: {0}")]
    Midi(#[from] MidiError),
}

/// The kind of a chart file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartFormat {
    /// The `.chart` text format.
    Chart,
    /// A Standard MIDI File.
    #[cfg(feature = "midi")]
    Midi,
}

impl ChartFormat {
    fn of_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "chart" => Some(Self::Chart),
            #[cfg(feature = "midi")]
            "mid" => Some(Self::Midi),
            _ => None,
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            #[cfg(feature = "midi")]
            Self::Midi => "mid",
        }
    }
}

#[cfg(feature = "midi")]
const PROBE_ORDER: &[ChartFormat] = &[ChartFormat::Chart, ChartFormat::Midi];
#[cfg(not(feature = "midi"))]
const PROBE_ORDER: &[ChartFormat] = &[ChartFormat::Chart];

fn with_extra_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Decides which file to load for `path` and how to read it.
///
/// A path with a known extension (compared case-insensitively) is used as is. Otherwise
/// `<path>.chart` and then `<path>.mid` are tried.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if no candidate exists.
pub fn resolve_chart_path(path: &Path) -> Result<(PathBuf, ChartFormat), LoadError> {
    if let Some(format) = ChartFormat::of_extension(path) {
        return Ok((path.to_path_buf(), format));
    }
    PROBE_ORDER
        .iter()
        .map(|&format| (with_extra_extension(path, format.extension()), format))
        .find(|(candidate, _)| candidate.is_file())
        .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
}

/// Loads the chart at `path`, see [`resolve_chart_path`] for the file selection.
///
/// # Errors
///
/// Returns an error if no file is found, it cannot be read, or its content is malformed.
pub fn load(path: impl AsRef<Path>, options: ImportOptions) -> Result<ChartOutput, LoadError> {
    #[cfg(not(feature = "midi"))]
    let _ = options;
    let (path, format) = resolve_chart_path(path.as_ref())?;
    tracing::debug!(path = %path.display(), ?format, "loading chart");
    match format {
        ChartFormat::Chart => {
            let source = fs::read_to_string(&path)?;
            let chart = parse(&source)?;
            Ok(ChartOutput {
                chart,
                warnings: vec![],
            })
        }
        #[cfg(feature = "midi")]
        ChartFormat::Midi => {
            let bytes = fs::read(&path)?;
            let output = import_midi(&bytes, options)?;
            if !output.warnings.is_empty() {
                tracing::debug!(count = output.warnings.len(), "MIDI import left warnings");
            }
            Ok(output)
        }
    }
}

/// Writes `chart` to `path` in the chart format.
///
/// # Errors
///
/// Returns the error of writing the file.
pub fn save(
    chart: &Chart,
    path: impl AsRef<Path>,
    options: StringifyOptions,
) -> std::io::Result<()> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), tracks = chart.tracks.len(), "saving chart");
    fs::write(path, chart.stringify(options))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chart::{event::NoteEvent, song::SongMetadata};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chart-rs-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn probes_for_chart_file() {
        let dir = scratch_dir("probe");
        let base = dir.join("notes");
        fs::write(dir.join("notes.chart"), "[Song]\n{\n  Resolution = 192\n}\n").unwrap();

        let (path, format) = resolve_chart_path(&base).unwrap();
        assert_eq!(path, dir.join("notes.chart"));
        assert_eq!(format, ChartFormat::Chart);

        let (path, format) = resolve_chart_path(&dir.join("other.CHART")).unwrap();
        assert_eq!(path, dir.join("other.CHART"));
        assert_eq!(format, ChartFormat::Chart);

        assert!(matches!(
            resolve_chart_path(&dir.join("missing")),
            Err(LoadError::NotFound(_))
        ));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn saves_and_loads() {
        let dir = scratch_dir("save");
        let mut chart = Chart::new(SongMetadata::new(480));
        chart.track_mut("ExpertSingle").push(480, NoteEvent::note(2, 0));

        save(&chart, dir.join("song.chart"), StringifyOptions::default()).unwrap();
        let output = load(dir.join("song"), ImportOptions::default()).unwrap();
        assert_eq!(output.chart, chart);
        assert!(output.warnings.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn reports_parse_failures() {
        let dir = scratch_dir("broken");
        fs::write(dir.join("broken.chart"), "[Song]\n{\n").unwrap();
        assert!(matches!(
            load(dir.join("broken.chart"), ImportOptions::default()),
            Err(LoadError::Parse(_))
        ));
        fs::remove_dir_all(dir).unwrap();
    }
}
