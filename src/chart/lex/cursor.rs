use std::ops::Range;

/// A line cursor over the chart source, skipping blank lines.
pub struct Cursor<'a> {
    /// The byte index of the next unread line.
    index: usize,
    /// The source str.
    source: &'a str,
}

/// Whitespace around lines, including the byte order mark some editors write.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

impl<'a> Cursor<'a> {
    pub const fn new(source: &'a str) -> Self {
        Self {
            index: 0,
            source,
        }
    }

    pub fn is_end(&self) -> bool {
        self.source[self.index..].trim_matches(is_blank).is_empty()
    }

    /// Moves through and returns the next non-blank line, trimmed, with its byte range.
    ///
    /// A trailing `\r` of CRLF line endings is trimmed as whitespace.
    pub fn next_line(&mut self) -> Option<(Range<usize>, &'a str)> {
        while self.index < self.source.len() {
            let rest = &self.source[self.index..];
            let line_len = rest.find('\n').unwrap_or(rest.len());
            let raw = &rest[..line_len];
            let line_start = self.index;
            self.index += (line_len + 1).min(rest.len());

            let content = raw.trim_matches(is_blank);
            if content.is_empty() {
                continue;
            }
            let start = line_start + (raw.len() - raw.trim_start_matches(is_blank).len());
            return Some((start..start + content.len(), content));
        }
        None
    }
}

#[test]
fn skips_blank_lines() {
    let mut cursor = Cursor::new(
        r"
            [Song]

            {
        ",
    );

    assert_eq!(cursor.next_line().map(|(_, line)| line), Some("[Song]"));
    assert!(!cursor.is_end());
    assert_eq!(cursor.next_line().map(|(_, line)| line), Some("{"));
    assert!(cursor.is_end());
    assert_eq!(cursor.next_line(), None);
}

#[test]
fn handles_crlf_and_bom() {
    const SOURCE: &str = "\u{feff}[Song]\r\n{\r\n  Name = \"x\"\r\n}";

    let mut cursor = Cursor::new(SOURCE);

    let (range, line) = cursor.next_line().unwrap();
    assert_eq!(line, "[Song]");
    assert_eq!(&SOURCE[range], "[Song]");
    assert_eq!(cursor.next_line().map(|(_, line)| line), Some("{"));
    let (range, line) = cursor.next_line().unwrap();
    assert_eq!(line, "Name = \"x\"");
    assert_eq!(&SOURCE[range], "Name = \"x\"");
    assert_eq!(cursor.next_line().map(|(_, line)| line), Some("}"));
    assert!(cursor.is_end());
    assert_eq!(cursor.next_line(), None);
}
