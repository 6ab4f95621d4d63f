//! Fancy diagnostics support using `ariadne`.
//!
//! Parse errors carry the byte range of the failing line, so ariadne computes the row and column
//! for display by itself.
//!
//! # Usage Example
//!
//! ```rust
//! use chart_rs::{chart::parse::parse, diagnostics::emit_parse_error};
//!
//! let source = "[Song]\n{\n  Resolution = 192\n}\n[SyncTrack]\n{\n  0 = B fast\n}\n";
//! if let Err(err) = parse(source) {
//!     emit_parse_error("song.chart", source, &err);
//! }
//! ```

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::chart::parse::{ParseError, ParseErrorWithRange};

/// Simple source container that holds the filename and source text.
pub struct SimpleSource<'a> {
    /// Name of the source file.
    name: &'a str,
    /// Source text content.
    text: &'a str,
}

impl<'a> SimpleSource<'a> {
    /// Create a new source container instance.
    #[must_use]
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    /// Get source text content.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Get source file name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }
}

/// Trait for converting positioned errors to `ariadne::Report`.
pub trait ToAriadne {
    /// Convert error to ariadne Report.
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)>;
}

/// Builds a styled error report labelling `range` of `src`.
#[must_use]
pub fn build_report<'a>(
    src: &SimpleSource<'a>,
    range: Range<usize>,
    title: &str,
    label_message: impl ToString,
    color: Color,
) -> Report<'a, (String, Range<usize>)> {
    let filename = src.name().to_string();
    Report::build(ReportKind::Error, (filename.clone(), range.clone()))
        .with_message(title)
        .with_label(
            Label::new((filename, range))
                .with_message(label_message.to_string())
                .with_color(color),
        )
        .finish()
}

impl ToAriadne for ParseErrorWithRange {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        build_report(src, self.range(), "parse error", self.content(), Color::Red)
    }
}

impl ToAriadne for ParseError {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        build_report(
            src,
            self.range.clone(),
            &format!("parse error at line {}", self.line),
            &self.kind,
            Color::Red,
        )
    }
}

/// Renders the parse error of `source` to the standard error.
pub fn emit_parse_error(name: &str, source: &str, error: &ParseError) {
    let simple = SimpleSource::new(name, source);
    let report = error.to_report(&simple);
    let _ = report.eprint((name.to_string(), Source::from(source)));
}
