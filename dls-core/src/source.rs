// Source positions, ranges and spans for DML analysis
//
// Positions are (line, column) pairs tagged with their indexing system:
// zero-indexed everywhere inside the analysis core, one-indexed at the
// presentation boundary (LSP, CLI output). The tag is a zero-sized type
// parameter so mixing the two systems is a compile error, and conversion
// happens exactly where `to_one_indexed` / `to_zero_indexed` is called.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Marker for zero-based line/column numbering (internal representation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZeroIndexed;

/// Marker for one-based line/column numbering (presentation boundary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OneIndexed;

/// A position in a text document, tagged with its indexing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position<I> {
    pub line: u32,
    pub column: u32,
    #[serde(skip)]
    _indexing: PhantomData<I>,
}

impl<I> Position<I> {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            _indexing: PhantomData,
        }
    }
}

impl Position<ZeroIndexed> {
    pub fn to_one_indexed(self) -> Position<OneIndexed> {
        Position::new(self.line + 1, self.column + 1)
    }
}

impl Position<OneIndexed> {
    pub fn to_zero_indexed(self) -> Position<ZeroIndexed> {
        Position::new(self.line.saturating_sub(1), self.column.saturating_sub(1))
    }
}

impl<I> fmt::Display for Position<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An ordered pair of positions; `start <= end` by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range<I> {
    pub start: Position<I>,
    pub end: Position<I>,
}

impl<I> Range<I>
where
    I: Copy + PartialOrd,
{
    pub fn new(start: Position<I>, end: Position<I>) -> Self {
        debug_assert!(start <= end, "range start must not follow its end");
        Self { start, end }
    }

    /// Check whether a position falls inside this range (end inclusive)
    pub fn contains(&self, pos: Position<I>) -> bool {
        if pos.line < self.start.line || pos.line > self.end.line {
            return false;
        }
        if pos.line == self.start.line && pos.column < self.start.column {
            return false;
        }
        if pos.line == self.end.line && pos.column > self.end.column {
            return false;
        }
        true
    }
}

impl Range<ZeroIndexed> {
    pub fn to_one_indexed(self) -> Range<OneIndexed> {
        Range {
            start: self.start.to_one_indexed(),
            end: self.end.to_one_indexed(),
        }
    }
}

impl Range<OneIndexed> {
    pub fn to_zero_indexed(self) -> Range<ZeroIndexed> {
        Range {
            start: self.start.to_zero_indexed(),
            end: self.end.to_zero_indexed(),
        }
    }
}

impl<I> fmt::Display for Range<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A range plus the file it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span<I> {
    pub file: Option<PathBuf>,
    pub range: Range<I>,
}

impl<I> Span<I>
where
    I: Copy + PartialOrd,
{
    pub fn new(range: Range<I>) -> Self {
        Self { file: None, range }
    }

    pub fn in_file(file: impl Into<PathBuf>, range: Range<I>) -> Self {
        Self {
            file: Some(file.into()),
            range,
        }
    }

    pub fn start(&self) -> Position<I> {
        self.range.start
    }

    pub fn end(&self) -> Position<I> {
        self.range.end
    }

    pub fn contains(&self, pos: Position<I>) -> bool {
        self.range.contains(pos)
    }

    /// Span from the start of `self` to the end of `other`
    pub fn extend_to(&self, other: &Span<I>) -> Span<I> {
        Span {
            file: self.file.clone(),
            range: Range {
                start: self.range.start,
                end: other.range.end,
            },
        }
    }
}

impl Span<ZeroIndexed> {
    pub fn to_one_indexed(&self) -> Span<OneIndexed> {
        Span {
            file: self.file.clone(),
            range: self.range.to_one_indexed(),
        }
    }
}

impl<I> fmt::Display for Span<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
        }
        write!(f, "{}", self.range)
    }
}

pub type ZeroPosition = Position<ZeroIndexed>;
pub type OnePosition = Position<OneIndexed>;
pub type ZeroRange = Range<ZeroIndexed>;
pub type OneRange = Range<OneIndexed>;
pub type ZeroSpan = Span<ZeroIndexed>;
pub type OneSpan = Span<OneIndexed>;

/// Merge spans from the same file into one covering span
pub fn merge_spans(spans: &[ZeroSpan]) -> Option<ZeroSpan> {
    let first = spans.first()?;
    let mut start = first.range.start;
    let mut end = first.range.end;
    for span in &spans[1..] {
        start = start.min(span.range.start);
        end = end.max(span.range.end);
    }
    Some(ZeroSpan {
        file: first.file.clone(),
        range: Range { start, end },
    })
}

/// Line start table for a source text, used to relate byte offsets and
/// positions and to extract line text for rendered diagnostics
pub struct LineMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a zero-indexed position
    pub fn position(&self, offset: usize) -> ZeroPosition {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        Position::new(line as u32, (offset - self.line_starts[line]) as u32)
    }

    /// Byte offset of a zero-indexed line start
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Text of a zero-indexed line, without its trailing newline
    pub fn line_text<'a>(&self, line: usize, source: &'a str) -> Option<&'a str> {
        let start = self.line_start(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => next.saturating_sub(1),
            None => self.len,
        };
        source.get(start..end)
    }
}

/// Shorthand for a span covering a whole file of `line_count` lines
pub fn file_span(file: &Path, line_count: u32) -> ZeroSpan {
    ZeroSpan::in_file(
        file,
        ZeroRange::new(Position::new(0, 0), Position::new(line_count, 0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_conversion() {
        let zero: ZeroPosition = Position::new(0, 7);
        let one = zero.to_one_indexed();
        assert_eq!(one, Position::new(1, 8));
        assert_eq!(one.to_zero_indexed(), zero);
    }

    #[test]
    fn test_position_ordering() {
        let a: ZeroPosition = Position::new(1, 9);
        let b: ZeroPosition = Position::new(2, 0);
        assert!(a < b);
        assert!(Position::<ZeroIndexed>::new(2, 1) > b);
    }

    #[test]
    fn test_range_contains() {
        let range = ZeroRange::new(Position::new(1, 4), Position::new(3, 2));
        assert!(range.contains(Position::new(1, 4)));
        assert!(range.contains(Position::new(2, 100)));
        assert!(range.contains(Position::new(3, 2)));
        assert!(!range.contains(Position::new(1, 3)));
        assert!(!range.contains(Position::new(3, 3)));
    }

    #[test]
    fn test_merge_spans() {
        let a = ZeroSpan::in_file("a.dml", ZeroRange::new(Position::new(2, 0), Position::new(2, 5)));
        let b = ZeroSpan::in_file("a.dml", ZeroRange::new(Position::new(0, 3), Position::new(1, 1)));
        let merged = merge_spans(&[a, b]).unwrap();
        assert_eq!(merged.range.start, Position::new(0, 3));
        assert_eq!(merged.range.end, Position::new(2, 5));
        assert!(merge_spans(&[]).is_none());
    }

    #[test]
    fn test_line_map() {
        let source = "dml 1.4;\ndevice foo;\n";
        let map = LineMap::new(source);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.position(0), Position::new(0, 0));
        assert_eq!(map.position(9), Position::new(1, 0));
        assert_eq!(map.position(16), Position::new(1, 7));
        assert_eq!(map.line_text(0, source), Some("dml 1.4;"));
        assert_eq!(map.line_text(1, source), Some("device foo;"));
        assert_eq!(map.line_text(2, source), Some(""));
    }
}
