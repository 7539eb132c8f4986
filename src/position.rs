/// Position in a text file (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

/// Byte span in a text file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Starting byte offset
    pub start: usize,
    /// Length in bytes
    pub length: usize,
}

impl Span {
    /// Create a span from a start offset and length
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Convert a byte offset to line and column position
///
/// Lines are split on `\n`; a preceding `\r` counts as part of the line.
/// Offsets past the end clamp to the end of the content.
///
/// # Arguments
/// * `content` - The file content as a string
/// * `byte_offset` - The byte offset to convert
///
/// # Returns
/// * `Position` with line and column (both 1-indexed)
pub fn byte_to_position(content: &str, byte_offset: usize) -> Position {
    let mut line = 1;
    let mut column = 1;

    for (offset, ch) in content.char_indices() {
        if offset >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    Position { line, column }
}
