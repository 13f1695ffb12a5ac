///Utility type for pulling tokens out of the lexer on demand.
use crate::err::ParseRes;
use crate::lex::{Lexer, Token, TokenKind};
use crate::symbols::SymbolTable;
use std::collections::VecDeque;

/// Saved cursor position, handed back to [`TokenCursor::reset`] or [`TokenCursor::release`].
#[must_use]
#[derive(Debug)]
pub struct Mark(usize);

/// Lazily filled token buffer sitting between the lexer and the parser.
///
/// Tokens are only lexed when the parser looks at them, so an identifier is classified against
/// the symbol table as it stands at that moment. Consumed tokens are dropped straight away unless
/// a [`Mark`] is outstanding, in which case they are kept so that the parser can rewind to it.
pub struct TokenCursor<'a> {
    lexer: Lexer<'a>,
    buffer: VecDeque<Token>,
    cursor: usize,
    marks: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self { lexer, buffer: VecDeque::new(), cursor: 0, marks: 0 }
    }

    /// Fills the buffer up to index `cursor + n`, inclusively.
    fn fill(&mut self, n: usize, syms: &SymbolTable) -> ParseRes<()> {
        while self.buffer.len() <= self.cursor + n {
            let tok = self.lexer.next_token(syms)?;
            self.buffer.push_back(tok);
        }
        Ok(())
    }

    pub fn peek(&mut self, syms: &SymbolTable) -> ParseRes<&Token> {
        self.peek_nth(0, syms)
    }

    /// Look `n` tokens past the cursor without consuming anything. Only done under a mark, or for
    /// tokens that cannot be typedef names, since the lookahead is classified now.
    pub fn peek_nth(&mut self, n: usize, syms: &SymbolTable) -> ParseRes<&Token> {
        self.fill(n, syms)?;
        Ok(&self.buffer[self.cursor + n])
    }

    /// Consume and return the next token. At the end of input this keeps returning `EOF`.
    pub fn advance(&mut self, syms: &SymbolTable) -> ParseRes<Token> {
        self.fill(0, syms)?;
        if self.marks == 0 {
            //nothing can rewind past this point, so the token can be moved out
            self.cursor = 0;
            match self.buffer.pop_front() {
                Some(tok) => Ok(tok),
                None => self.lexer.next_token(syms),
            }
        } else {
            let tok = self.buffer[self.cursor].clone();
            self.cursor += 1;
            Ok(tok)
        }
    }

    pub fn mark(&mut self) -> Mark {
        self.marks += 1;
        Mark(self.cursor)
    }

    /// Rewind to `mark`, so that the tokens consumed since are handed out again.
    pub fn reset(&mut self, mark: Mark) {
        self.cursor = mark.0;
        self.release_inner();
    }

    /// Give up the ability to rewind to `mark`, keeping the current position.
    pub fn release(&mut self, mark: Mark) {
        let _ = mark;
        self.release_inner();
    }

    fn release_inner(&mut self) {
        self.marks = self.marks.saturating_sub(1);
        if self.marks == 0 {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    /// Classify again every token that was lexed but not consumed yet. Called after the table
    /// changes under buffered lookahead, e.g. when a scope closes behind a peeked `else`.
    pub fn reclassify(&mut self, syms: &SymbolTable) {
        for tok in self.buffer.iter_mut().skip(self.cursor) {
            let name = match &tok.token_type {
                TokenKind::Ident(name) | TokenKind::TypeName(name) => name.clone(),
                _ => continue,
            };
            tok.token_type = if syms.is_type_name(&name) {
                TokenKind::TypeName(name)
            } else {
                TokenKind::Ident(name)
            };
        }
    }

    pub fn is_marked(&self) -> bool {
        self.marks > 0
    }
}
