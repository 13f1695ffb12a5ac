use ariadne::{Label, Report, ReportKind, Source};
use crate::utils::TextPosition;
use crate::lex::{Keyword, TokenKind};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Generic error type used throughout the front end.
/// The `TextPositions` indicate where they occur in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErr {
    position: TextPosition,
    position_end: TextPosition,
    message: ParseErrMsg,
}

/// Errors for the lexer and parser.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrMsg {
    //lexical errors
    InvalidSymbol(char),
    UnterminatedString,
    UnterminatedChar,
    EmptyCharLiteral,
    UnterminatedComment,
    IntegerOverflow,
    MalformedNumber(String),

    //syntax errors
    ExpectedSymbol { expected: TokenKind, found: TokenKind },
    ExpectedOneOfSymbols { expected: Vec<TokenKind>, found: TokenKind },
    ExpectedExpression(TokenKind),
    ExpectedDeclarator(TokenKind),
    ExpectedTypeSpecifier(TokenKind),
    ExpectedIdentifier(TokenKind),
    InvalidTypeSpecifier(String),
    DuplicateStorageClass(Keyword),
    InvalidFunctionDefinition(String),

    //scope push/pop imbalance, should never reach a user
    InternalError(u32), //line number
}

/// Which part of the pipeline rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexical,
    Syntactic,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Lexical => write!(f, "lexical error"),
            Stage::Syntactic => write!(f, "syntax error"),
            Stage::Internal => write!(f, "internal error"),
        }
    }
}

/// Flat, owned description of a failed parse, suitable for handing to tooling that doesn't
/// want to depend on the error enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseErrMsg {
    pub fn stage(&self) -> Stage {
        match self {
            ParseErrMsg::InvalidSymbol(_) |
            ParseErrMsg::UnterminatedString |
            ParseErrMsg::UnterminatedChar |
            ParseErrMsg::EmptyCharLiteral |
            ParseErrMsg::UnterminatedComment |
            ParseErrMsg::IntegerOverflow |
            ParseErrMsg::MalformedNumber(_) => Stage::Lexical,
            ParseErrMsg::InternalError(_) => Stage::Internal,
            _ => Stage::Syntactic,
        }
    }
}

impl fmt::Display for ParseErrMsg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseErrMsg::InvalidSymbol(c) => write!(f, "unrecognized character {:?}", c),
            ParseErrMsg::UnterminatedString => write!(f, "unterminated string literal"),
            ParseErrMsg::UnterminatedChar => write!(f, "unterminated character literal"),
            ParseErrMsg::EmptyCharLiteral => write!(f, "empty character literal"),
            ParseErrMsg::UnterminatedComment => write!(f, "unterminated block comment"),
            ParseErrMsg::IntegerOverflow => write!(f, "integer literal is too large"),
            ParseErrMsg::MalformedNumber(s) => write!(f, "malformed number `{}`", s),
            ParseErrMsg::ExpectedSymbol { expected, found } => write!(f, "expected `{}`, found `{}`", expected, found),
            ParseErrMsg::ExpectedOneOfSymbols { expected, found } => {
                let expected = expected.iter()
                    .map(|tk| format!("`{}`", tk))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "expected one of {}, found `{}`", expected, found)
            },
            ParseErrMsg::ExpectedExpression(found) => write!(f, "expected expression, found `{}`", found),
            ParseErrMsg::ExpectedDeclarator(found) => write!(f, "expected declarator, found `{}`", found),
            ParseErrMsg::ExpectedTypeSpecifier(found) => write!(f, "expected type specifier, found `{}`", found),
            ParseErrMsg::ExpectedIdentifier(found) => write!(f, "expected identifier, found `{}`", found),
            ParseErrMsg::InvalidTypeSpecifier(s) => write!(f, "invalid combination of type specifiers `{}`", s),
            ParseErrMsg::DuplicateStorageClass(kw) => write!(f, "more than one storage class specifier (`{}`)", kw.as_str()),
            ParseErrMsg::InvalidFunctionDefinition(name) => write!(f, "`{}` cannot be defined as a function here", name),
            ParseErrMsg::InternalError(line) => write!(f, "internal parser error (raised at {}:{})", file!(), line),
        }
    }
}

pub type ParseRes<T> = Result<T, ParseErr>;

impl ParseErr {
    pub fn new(pos: TextPosition, pos_end: TextPosition, msg: ParseErrMsg) -> Self {
        ParseErr { position: pos, position_end: pos_end, message: msg }
    }

    pub fn position(&self) -> &TextPosition {
        &self.position
    }

    pub fn message(&self) -> &ParseErrMsg {
        &self.message
    }

    pub fn stage(&self) -> Stage {
        self.message.stage()
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            stage: self.stage(),
            message: self.message.to_string(),
            line: self.position.line,
            column: self.position.col,
        }
    }

    /// Pretty-print the error to stderr, with the offending span of `source` underlined.
    pub fn report_single(&self, source: &str) -> io::Result<()> {
        let filename = self.position.filename.as_deref().unwrap_or("<input>");

        //ariadne counts characters, not bytes
        let start = char_index(source, self.position.offset);
        let end = char_index(source, self.position_end.offset).max(start + 1);

        Report::build(ReportKind::Error, filename, start)
            .with_message(self.stage().to_string())
            .with_label(Label::new((filename, start..end)).with_message(self.message.to_string()))
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

fn char_index(source: &str, byte_offset: usize) -> usize {
    let byte_offset = byte_offset.min(source.len());
    source.char_indices().take_while(|(i, _)| *i < byte_offset).count()
}

impl std::error::Error for ParseErr {}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}: {}", self.position, self.stage(), self.message)
    }
}

/// Failures of the thin I/O layer around the parser.
#[derive(Debug)]
pub enum IOErr {
    Read { path: Option<PathBuf>, source: io::Error },
}

impl std::error::Error for IOErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IOErr::Read { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for IOErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IOErr::Read { path: Some(path), source } => write!(f, "could not read {}: {}", path.display(), source),
            IOErr::Read { path: None, source } => write!(f, "could not read input: {}", source),
        }
    }
}
