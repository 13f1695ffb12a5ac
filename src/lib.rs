//! A lexer and recursive-descent parser for a practical subset of C.
//!
//! The lexer and parser share a scoped symbol table, so identifiers declared with `typedef` are
//! tokenized as type names from the point of their declaration to the end of their scope. That is
//! what lets `T * x;` parse as a declaration after `typedef int T;` and as a multiplication
//! otherwise.
//!
//! ```rust
//! use cfront::ast::{ExternalDecl, Type};
//!
//! let unit = cfront::parse_source("typedef int T; T * x;", None).unwrap();
//! match &unit.decls[1] {
//!     ExternalDecl::Declaration(group) => assert_eq!(group.decls[0].ty, Type::named("T").pointer_to()),
//!     _ => unreachable!(),
//! }
//! ```

pub mod ast;
pub mod err;
pub mod lex;
pub mod parse;
pub mod symbols;
pub mod utils;

use std::error::Error;
use std::io::Read;
use std::path::Path;

use ast::TranslationUnit;
use err::{IOErr, ParseRes};
use parse::Parser;

/// Parse a whole source body. `filename` is only used to label positions.
pub fn parse_source(body: &str, filename: Option<&str>) -> ParseRes<TranslationUnit> {
    Parser::new(body, filename).parse()
}

/// Read everything from `reader`, then parse it.
pub fn parse_reader(mut reader: impl Read, filename: Option<&str>) -> Result<TranslationUnit, Box<dyn Error>> {
    let mut body = String::new();
    reader.read_to_string(&mut body)
        .map_err(|source| IOErr::Read { path: filename.map(Into::into), source })?;
    Ok(parse_source(&body, filename)?)
}

pub fn parse_file(path: &Path) -> Result<TranslationUnit, Box<dyn Error>> {
    let body = std::fs::read_to_string(path)
        .map_err(|source| IOErr::Read { path: Some(path.to_path_buf()), source })?;
    let filename = path.to_string_lossy();
    Ok(parse_source(&body, Some(&filename))?)
}
