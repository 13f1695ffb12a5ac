use crate::utils::{PeekN, PeekNIterator, TextPosition};
use std::str::Chars;

/// Character stream over a source body that knows where it is.
///
/// Running past the end is not an error: `peek` and `advance` keep returning `None`.
pub struct SourceBuffer<'a> {
    iter: PeekNIterator<Chars<'a>>,
    filename: Option<&'a str>,
    line: usize,
    col: usize,
    offset: usize,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(body: &'a str, filename: Option<&'a str>) -> Self {
        Self {
            iter: body.chars().peekable_n(),
            filename,
            line: 1,
            col: 1,
            offset: 0,
        }
    }

    #[inline]
    pub fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    #[inline]
    pub fn peek_nth(&mut self, n: usize) -> Option<char> {
        self.iter.peek_nth(n).copied()
    }

    pub fn starts_with(&mut self, s: &str) -> bool {
        self.iter.starts_with(s.chars())
    }

    /// Consume one character, updating the line/column bookkeeping.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.iter.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Consume `n` characters. Used once a multi-char token has been recognized by peeking.
    #[inline]
    pub fn skip_n(&mut self, n: usize) {
        for _ in 0..n {
            let _ = self.advance();
        }
    }

    /// Position of the next unconsumed character.
    pub fn position(&self) -> TextPosition {
        TextPosition::new(self.line, self.col, self.offset, self.filename)
    }
}
