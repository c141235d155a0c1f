//! Import header parser.
//!
//! A module header is everything before the first command: whitespace,
//! `--` line comments, nested `/- ... -/` block comments, an optional
//! `prelude` keyword, then `import Name` statements. Statements may share a
//! line and may carry a trailing comment. Parsing stops at the first token
//! that is neither a comment nor part of an import statement.

use std::ops::Range;

use crate::constants::MODULE_NAME_RE;
use crate::utils::LineIndex;

/// Errors in a module header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// A `/-` comment is never closed.
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment {
        /// 1-indexed line of the comment opener.
        line: usize,
    },
    /// `import` is the last token of the file.
    #[error("`import` without a module name on line {line}")]
    MissingModuleName {
        /// 1-indexed line of the `import` keyword.
        line: usize,
    },
    /// The token after `import` is not a dotted module name.
    #[error("invalid module name `{name}` on line {line}")]
    InvalidModuleName {
        /// The offending token.
        name: String,
        /// 1-indexed line of the token.
        line: usize,
    },
}

/// One `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStmt {
    /// Imported module name.
    pub module: String,
    /// Byte range from the `import` keyword to the end of the name.
    pub span: Range<usize>,
    /// Byte range to delete when the statement is removed: the whole line
    /// when the statement is alone on it, otherwise the statement and the
    /// blanks after it.
    pub remove_span: Range<usize>,
}

/// Parsed module header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportHeader {
    /// Whether the header starts with `prelude`.
    pub prelude: bool,
    /// Import statements in source order, duplicates included.
    pub imports: Vec<ImportStmt>,
    /// Byte offset where new import lines go: the start of the line after
    /// the last import, or after `prelude`, or the start of the file.
    pub insert_at: usize,
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.rest().chars().next() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace and comments. On an unterminated block comment,
    /// returns the comment's start offset.
    fn skip_trivia(&mut self) -> Result<(), usize> {
        loop {
            let rest = self.rest();
            if rest.starts_with(char::is_whitespace) {
                self.bump_char();
            } else if rest.starts_with("--") {
                self.pos = rest.find('\n').map_or(self.text.len(), |i| self.pos + i);
            } else if rest.starts_with("/-") {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), usize> {
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(start);
            }
            if rest.starts_with("/-") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("-/") {
                depth -= 1;
                self.pos += 2;
            } else {
                self.bump_char();
            }
        }
        Ok(())
    }

    /// The token at the cursor, without consuming it.
    fn peek_word(&self) -> Option<Range<usize>> {
        let rest = self.rest();
        let mut len = 0;
        for (i, c) in rest.char_indices() {
            let tail = &rest[i..];
            if c.is_whitespace() || tail.starts_with("--") || tail.starts_with("/-") {
                break;
            }
            len = i + c.len_utf8();
        }
        (len > 0).then(|| self.pos..self.pos + len)
    }
}

/// End of the line containing `offset`, just past its newline when there is
/// one.
fn line_end_inclusive(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map_or(text.len(), |i| offset + i + 1)
}

fn remove_span(text: &str, span: &Range<usize>) -> Range<usize> {
    let line_start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = line_end_inclusive(text, span.end);
    let before = &text[line_start..span.start];
    let after = text[span.end..line_end].trim_start();
    if before.trim().is_empty() && (after.is_empty() || after.starts_with("--")) {
        return line_start..line_end;
    }
    let blanks = text[span.end..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    span.start..span.end + blanks
}

/// Parse the header of `text`.
///
/// # Errors
///
/// Returns an error on an unterminated block comment, an `import` with no
/// name, or a name that is not a dotted identifier.
pub fn parse_header(text: &str) -> Result<ImportHeader, HeaderError> {
    let lines = LineIndex::new(text);
    let unterminated = |offset: usize| HeaderError::UnterminatedComment {
        line: lines.line_index(offset),
    };

    let mut scanner = Scanner { text, pos: 0 };
    let mut prelude_end = None;
    let mut imports = Vec::new();
    loop {
        scanner.skip_trivia().map_err(unterminated)?;
        let Some(word) = scanner.peek_word() else {
            break;
        };
        match &text[word.clone()] {
            "prelude" if prelude_end.is_none() && imports.is_empty() => {
                scanner.pos = word.end;
                prelude_end = Some(word.end);
            }
            "import" => {
                scanner.pos = word.end;
                scanner.skip_trivia().map_err(unterminated)?;
                let Some(name) = scanner.peek_word() else {
                    return Err(HeaderError::MissingModuleName {
                        line: lines.line_index(word.start),
                    });
                };
                let module = &text[name.clone()];
                if !MODULE_NAME_RE().is_match(module) {
                    return Err(HeaderError::InvalidModuleName {
                        name: module.to_owned(),
                        line: lines.line_index(name.start),
                    });
                }
                scanner.pos = name.end;
                let span = word.start..name.end;
                imports.push(ImportStmt {
                    module: module.to_owned(),
                    remove_span: remove_span(text, &span),
                    span,
                });
            }
            _ => break,
        }
    }

    let insert_at = imports
        .last()
        .map(|stmt| stmt.span.end)
        .or(prelude_end)
        .map_or(0, |end| line_end_inclusive(text, end));
    Ok(ImportHeader {
        prelude: prelude_end.is_some(),
        imports,
        insert_at,
    })
}
