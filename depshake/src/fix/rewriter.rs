//! Byte-range rewriter for source files.
//!
//! Edits are expressed as byte ranges over the original text and applied in
//! one pass, so every offset computed from the original header stays valid.
//!
//! # Usage
//!
//! ```
//! use depshake::fix::{ByteRangeRewriter, TextEdit};
//!
//! let source = "import A\nimport B\n";
//! let mut rewriter = ByteRangeRewriter::new(source);
//! rewriter.add_edit(TextEdit::delete(0, 9));
//! rewriter.add_edit(TextEdit::insert(18, "import C\n"));
//! let fixed = rewriter.apply().expect("should apply");
//! assert_eq!(fixed, "import B\nimport C\n");
//! ```

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
}

impl TextEdit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create a deletion edit
    #[must_use]
    pub fn delete(start_byte: usize, end_byte: usize) -> Self {
        Self::new(start_byte, end_byte, "")
    }

    /// Create an insertion edit (insert before position)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Check if this edit overlaps with another
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// Error during rewriting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Two or more edits have overlapping ranges
    #[error("Overlapping edits at indices {edit_a} and {edit_b}")]
    OverlappingEdits {
        /// Index of first overlapping edit
        edit_a: usize,
        /// Index of second overlapping edit
        edit_b: usize,
    },
    /// Edit range is out of bounds or not on a character boundary
    #[error("Edit {edit_index} out of bounds: range {start_byte}..{end_byte} in source of length {source_len}")]
    OutOfBounds {
        /// Index of the bad edit
        edit_index: usize,
        /// Start byte of the edit
        start_byte: usize,
        /// End byte of the edit
        end_byte: usize,
        /// Length of the source
        source_len: usize,
    },
}

/// Safe code rewriter using byte ranges
///
/// This rewriter applies edits in reverse order to preserve byte positions,
/// and validates that edits don't overlap.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter {
    /// Original source code
    source: String,
    /// Pending edits
    edits: Vec<TextEdit>,
}

impl ByteRangeRewriter {
    /// Create a new rewriter for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Add an edit to the pending list
    pub fn add_edit(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    /// Add multiple edits
    pub fn add_edits(&mut self, edits: impl IntoIterator<Item = TextEdit>) {
        self.edits.extend(edits);
    }

    /// Check if there are any pending edits
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Validate edits without applying them
    ///
    /// # Errors
    /// Returns error if edits overlap or are out of bounds
    pub fn validate(&self) -> Result<(), RewriteError> {
        for (i, edit) in self.edits.iter().enumerate() {
            if edit.start_byte > edit.end_byte
                || edit.end_byte > self.source.len()
                || !self.source.is_char_boundary(edit.start_byte)
                || !self.source.is_char_boundary(edit.end_byte)
            {
                return Err(RewriteError::OutOfBounds {
                    edit_index: i,
                    start_byte: edit.start_byte,
                    end_byte: edit.end_byte,
                    source_len: self.source.len(),
                });
            }
        }

        for i in 0..self.edits.len() {
            for j in (i + 1)..self.edits.len() {
                if self.edits[i].overlaps(&self.edits[j]) {
                    return Err(RewriteError::OverlappingEdits {
                        edit_a: i,
                        edit_b: j,
                    });
                }
            }
        }

        Ok(())
    }

    /// Apply all edits and return the modified source
    ///
    /// Edits are applied from the end of the text to the start. At equal
    /// start offsets the wider edit goes first, so an insertion never lands
    /// inside a range that is deleted afterwards.
    ///
    /// # Errors
    /// Returns error if edits overlap or are out of bounds
    pub fn apply(self) -> Result<String, RewriteError> {
        self.validate()?;

        let mut result = self.source;
        let mut sorted_edits = self.edits;
        sorted_edits.sort_by(|a, b| {
            b.start_byte
                .cmp(&a.start_byte)
                .then(b.end_byte.cmp(&a.end_byte))
        });

        for edit in sorted_edits {
            result.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_replacement() {
        let mut rewriter = ByteRangeRewriter::new("import Old\n");
        rewriter.add_edit(TextEdit::new(7, 10, "New"));
        assert_eq!(rewriter.apply().unwrap(), "import New\n");
    }

    #[test]
    fn test_overlapping_edits_error() {
        let mut rewriter = ByteRangeRewriter::new("import A\nimport B\n");
        rewriter.add_edit(TextEdit::delete(0, 12));
        rewriter.add_edit(TextEdit::delete(9, 18));
        assert!(matches!(
            rewriter.apply(),
            Err(RewriteError::OverlappingEdits { edit_a: 0, edit_b: 1 })
        ));
    }

    #[test]
    fn test_out_of_bounds_error() {
        let mut rewriter = ByteRangeRewriter::new("short");
        rewriter.add_edit(TextEdit::new(0, 100, "long"));
        assert!(matches!(
            rewriter.apply(),
            Err(RewriteError::OutOfBounds { .. })
        ));

        let mut rewriter = ByteRangeRewriter::new("é");
        rewriter.add_edit(TextEdit::delete(1, 2));
        assert!(matches!(
            rewriter.apply(),
            Err(RewriteError::OutOfBounds { edit_index: 0, .. })
        ));
    }

    #[test]
    fn test_insertion_at_deletion_start_survives() {
        let source = "import A\nimport B\n";
        let mut rewriter = ByteRangeRewriter::new(source);
        rewriter.add_edit(TextEdit::insert(9, "import C\n"));
        rewriter.add_edit(TextEdit::delete(9, 18));
        assert_eq!(rewriter.apply().unwrap(), "import A\nimport C\n");
    }

    #[test]
    fn test_untouched_text_is_preserved() {
        let source = "import A\nimport B\n\ntheorem t : True := trivial\n";
        let mut rewriter = ByteRangeRewriter::new(source);
        assert!(!rewriter.has_edits());
        rewriter.add_edits([TextEdit::delete(0, 9)]);
        assert!(rewriter.has_edits());
        assert_eq!(
            rewriter.apply().unwrap(),
            "import B\n\ntheorem t : True := trivial\n"
        );
    }
}
