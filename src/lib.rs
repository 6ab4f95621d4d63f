//! The `.chart` rhythm game note chart library.
//!
//! `.chart` files describe the notes of Guitar Hero style games: a `[Song]` section of metadata,
//! a `[SyncTrack]` of tempo and time signature changes, an `[Events]` track of section markers
//! and lyrics, and one section of notes per difficulty and instrument. Every event is placed on an
//! integer tick, measured against the resolution of the song.
//!
//! - [`chart`] holds the model, the tick algebra over it, the tempo map and the text codec.
//! - [`import`] builds charts from delta-timed note streams, and [`midi`] reads such streams
//!   from Standard MIDI Files.
//! - [`io`] loads and saves chart files, choosing the format by extension.
//!
//! # Example
//!
//! ```
//! use chart_rs::prelude::*;
//!
//! let source = "[Song]\n{\n  Resolution = 192\n}\n[SyncTrack]\n{\n  0 = B 120000\n}\n";
//! let mut chart = parse(source).unwrap();
//! assert!((chart.position_to_seconds(192) - 0.5).abs() < 1e-9);
//!
//! chart.convert_resolution(480);
//! let text = chart.stringify(StringifyOptions::default());
//! assert!(text.contains("Resolution = 480"));
//! ```
//!
//! # Features
//!
//! - `midi` (default): [`midi`] and `.mid` support in [`io`], with `midly`.
//! - `diagnostics` (default): [`diagnostics`], rendering parse errors with `ariadne`.
//! - `serde`: `Serialize` and `Deserialize` for the model.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chart;
#[cfg(feature = "diagnostics")]
#[cfg_attr(docsrs, doc(cfg(feature = "diagnostics")))]
pub mod diagnostics;
pub mod import;
pub mod io;
#[cfg(feature = "midi")]
#[cfg_attr(docsrs, doc(cfg(feature = "midi")))]
pub mod midi;
pub mod prelude;
