use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(NonZeroU32);

/// Half-open `[from, to)` byte range within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub from: u32,
    pub to: u32,
}

/// A declaration or reference site: one span inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub span: Span,
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Span {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Span covering a tree-sitter byte range.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Self {
            from: range.start as u32,
            to: range.end as u32,
        }
    }

    pub fn len(&self) -> u32 {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.from && offset < self.to
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

impl Location {
    pub fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.file, self.span)
    }
}

/// Maps byte offsets of one source text to lines.
///
/// Snippets shown next to usages are whole source lines, so the index only keeps
/// the byte offset at which every line starts.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    /// Zero-based line number containing `offset`.
    pub fn line_of(&self, offset: u32) -> usize {
        let offset = offset as usize;
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Zero-based (line, column) of `offset`, column counted in bytes.
    pub fn position_of(&self, offset: u32) -> (usize, usize) {
        let line = self.line_of(offset);
        (line, offset as usize - self.line_starts[line])
    }

    /// Text of the line containing `offset`, without its line terminator.
    pub fn line_text(&self, offset: u32) -> &'a str {
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let line = self.text.get(start..end).unwrap_or_default();
        line.strip_suffix('\r').unwrap_or(line)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_creation() {
        assert!(FileId::new(0).is_none());

        let id = FileId::new(100).unwrap();
        assert_eq!(id.value(), 100);
    }

    #[test]
    fn test_span_contains_is_half_open() {
        let span = Span::new(10, 15);
        assert!(span.contains(10));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert!(!span.contains(9));
        assert_eq!(span.len(), 5);
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_location_equality_and_hash() {
        use std::collections::HashSet;

        let file = FileId::new(1).unwrap();
        let a = Location::new(file, Span::new(1, 4));
        let b = Location::new(file, Span::new(1, 4));
        let c = Location::new(FileId::new(2).unwrap(), Span::new(1, 4));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_line_index_snippets() {
        let text = "package p;\r\nclass A {\n  void m() {}\n}";
        let lines = LineIndex::new(text);

        assert_eq!(lines.line_count(), 4);
        assert_eq!(lines.line_text(0), "package p;");
        let m = text.find("m()").unwrap() as u32;
        assert_eq!(lines.line_of(m), 2);
        assert_eq!(lines.line_text(m), "  void m() {}");
        assert_eq!(lines.position_of(m), (2, 7));
        let last = text.len() as u32 - 1;
        assert_eq!(lines.line_text(last), "}");
    }
}
