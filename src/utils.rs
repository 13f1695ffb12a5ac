use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;

/// Represents a position in a text file.
/// Useful for error reporting during parsing, as the errors will occur in a specific position.
///
/// `line` and `col` start at 1. `offset` is the number of bytes preceding the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPosition {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
    pub filename: Option<String>,
}

impl TextPosition {
    pub fn new(line: usize, col: usize, offset: usize, filename: Option<&str>) -> Self {
        Self {
            line,
            col,
            offset,
            filename: filename.map(|s| s.to_string()),
        }
    }

    /// Position of the first character of a buffer.
    pub fn start(filename: Option<&str>) -> Self {
        Self::new(1, 1, 0, filename)
    }

    pub fn new_without_file(line: usize, col: usize, offset: usize) -> Self {
        Self { line, col, offset, filename: None }
    }

    /// Same line, `n` characters further right. Only meaningful for positions that don't
    /// cross a newline, which is how the error reporting uses it.
    pub fn add_offset(&self, n: usize) -> Self {
        Self { line: self.line, col: self.col + n, offset: self.offset + n, filename: self.filename.clone() }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{}:{}:{}", name, self.line, self.col),
            None => write!(f, "{}:{}", self.line, self.col),
        }
    }
}

/// Trait for creating iterators that can peek ahead multiple entries.
pub trait PeekN: Iterator + Sized {
    fn peekable_n(self) -> PeekNIterator<Self>;
}

impl<I: Iterator> PeekN for I {
    fn peekable_n(self) -> PeekNIterator<I> {
        PeekNIterator {
            iterator: self,
            queue: VecDeque::new(),
        }
    }
}

/// Iterator that allows for peeking multiple values ahead without consuming a value.
/// This is needed for lexing certain symbols, such as `>>=` or `...`, which consume 3 characters and thus cannot
/// be recognized with a single `char` lookahead.
///
/// Peeked elements are buffered in a queue; once an element is consumed it is dequeued.
pub struct PeekNIterator<I: Iterator> {
    iterator: I,
    /// Elements pulled from the underlying iterator that have not been consumed yet.
    /// `None` entries mark the end of the underlying iterator.
    queue: VecDeque<Option<I::Item>>,
}

impl<I: Iterator> PeekNIterator<I> {
    /// Get a reference to the next element without consuming it.
    #[inline]
    pub fn peek(&mut self) -> Option<&I::Item> {
        self.peek_nth(0)
    }

    /// Peek at the nth unconsumed element. `peek_nth(0)` is equivalent to `peek()`.
    #[inline]
    pub fn peek_nth(&mut self, n: usize) -> Option<&I::Item> {
        self.fill_queue(n);
        self.queue.get(n).and_then(|v| v.as_ref())
    }

    /// Check if the unconsumed part of the iterator starts with the items in `collection`.
    ///
    /// This function does not consume the underlying elements.
    ///
    /// ```rust
    /// use cfront::utils::PeekN;
    ///
    /// let string = "/* comment */";
    /// let mut iter = string.chars().peekable_n();
    ///
    /// assert!(iter.starts_with("/*".chars()));
    /// assert!(!iter.starts_with("//".chars()));
    /// ```
    pub fn starts_with<T>(&mut self, collection: T) -> bool
        where T: IntoIterator<Item = I::Item>,
              I::Item: PartialEq
    {
        for (n, v) in collection.into_iter().enumerate() {
            match self.peek_nth(n) {
                Some(x) if *x == v => (),
                _ => return false,
            }
        }
        true
    }

    /// Fills the queue up to index `n`, inclusively.
    #[inline]
    fn fill_queue(&mut self, n: usize) {
        while self.queue.len() <= n {
            let item = self.iterator.next();
            self.queue.push_back(item);
        }
    }
}

impl<I: Iterator> Iterator for PeekNIterator<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.queue.pop_front() {
            Some(item) => item,
            None => self.iterator.next(),
        }
    }
}

impl<I: FusedIterator> FusedIterator for PeekNIterator<I> {}
