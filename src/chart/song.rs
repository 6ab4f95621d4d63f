//! The `[Song]` section metadata.

/// Resolution assumed by editors for a fresh chart.
pub const DEFAULT_RESOLUTION: u32 = 192;

/// Descriptive metadata of a song, and the chart-global [`SongMetadata::resolution`].
///
/// Every field except `resolution` is optional and is written back only when present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongMetadata {
    /// `Name`. The song title.
    pub name: Option<String>,
    /// `Artist`.
    pub artist: Option<String>,
    /// `ArtistText`, a display prefix such as `by`.
    pub artist_text: Option<String>,
    /// `Charter`.
    pub charter: Option<String>,
    /// `Album`.
    pub album: Option<String>,
    /// `Year`, kept as written (often `", 2008"`).
    pub year: Option<String>,
    /// `Offset`. Audio offset in seconds.
    pub offset: Option<f64>,
    /// `CountOff`.
    pub count_off: Option<String>,
    /// `GuitarVol`.
    pub guitar_vol: Option<i64>,
    /// `BandVol`.
    pub band_vol: Option<i64>,
    /// `HoPo`. Hammer-on threshold.
    pub hopo: Option<i64>,
    /// `Singer`.
    pub singer: Option<String>,
    /// `OriginalArtist`.
    pub original_artist: Option<bool>,
    /// `Resolution`. Ticks per quarter note, shared by every track of the chart.
    pub resolution: u32,
    /// `Player2`. The instrument of the second player, written unquoted.
    pub player2: Option<String>,
    /// `Difficulty`. Intensity rating.
    pub difficulty: Option<i64>,
    /// `PreviewStart`. In seconds.
    pub preview_start: Option<f64>,
    /// `PreviewEnd`. In seconds.
    pub preview_end: Option<f64>,
    /// `Genre`.
    pub genre: Option<String>,
    /// `MediaType`.
    pub media_type: Option<String>,
    /// `MusicStream`. Audio file of the backing track.
    pub music_stream: Option<String>,
    /// `GuitarStream`.
    pub guitar_stream: Option<String>,
    /// `BassStream`.
    pub bass_stream: Option<String>,
    /// `RhythmStream`.
    pub rhythm_stream: Option<String>,
    /// `DrumStream`.
    pub drum_stream: Option<String>,
    /// Unrecognized fields as `(key, raw value)`, in input order.
    pub extra: Vec<(String, String)>,
}

impl SongMetadata {
    /// Creates metadata with only the resolution set.
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        Self {
            name: None,
            artist: None,
            artist_text: None,
            charter: None,
            album: None,
            year: None,
            offset: None,
            count_off: None,
            guitar_vol: None,
            band_vol: None,
            hopo: None,
            singer: None,
            original_artist: None,
            resolution,
            player2: None,
            difficulty: None,
            preview_start: None,
            preview_end: None,
            genre: None,
            media_type: None,
            music_stream: None,
            guitar_stream: None,
            bass_stream: None,
            rhythm_stream: None,
            drum_stream: None,
            extra: Vec::new(),
        }
    }
}

impl Default for SongMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}
