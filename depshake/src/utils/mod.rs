//! Utilities shared across the crate.

mod paths;

pub use paths::{
    find_module_file, module_relative_path, normalize_display_path, validate_path_within_root,
};

/// A utility struct to convert byte offsets to line numbers.
///
/// Header parse errors are reported with line numbers, which are easier to
/// act on than byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        // '\n' is always a single byte in UTF-8
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Byte offset where the 1-indexed `line` starts, if the line exists.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|i| self.line_starts.get(i))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("import A\nimport B\n\ndef x");
        assert_eq!(index.line_index(0), 1);
        assert_eq!(index.line_index(8), 1);
        assert_eq!(index.line_index(9), 2);
        assert_eq!(index.line_index(18), 3);
        assert_eq!(index.line_index(20), 4);
        assert_eq!(index.line_start(2), Some(9));
        assert_eq!(index.line_start(0), None);
        assert_eq!(index.line_start(9), None);
    }
}
