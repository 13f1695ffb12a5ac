use crate::err::{ParseErrMsg, ParseRes, ParseErr};
use crate::lex::{Token, TokenKind};
use crate::utils::TextPosition;

/// Error spanning the whole of `token`.
#[inline]
pub fn gen_parser_err(msg: ParseErrMsg, token: &Token) -> ParseErr {
    let len = match &token.token_type {
        TokenKind::EOF => 1,
        _ => token.spelling().chars().count().max(1),
    };
    ParseErr::new(token.pos.clone(), token.pos.add_offset(len), msg)
}

#[inline]
pub fn gen_expected_error<T>(tk: &Token, expected: TokenKind) -> ParseRes<T> {
    Err(gen_parser_err(ParseErrMsg::ExpectedSymbol { expected, found: tk.token_type.clone() }, tk))
}

#[inline]
pub fn gen_expected_one_of_error<T>(tk: &Token, expected: Vec<TokenKind>) -> ParseRes<T> {
    Err(gen_parser_err(ParseErrMsg::ExpectedOneOfSymbols { expected, found: tk.token_type.clone() }, tk))
}

#[inline]
pub fn gen_expected_expression_error<T>(tk: &Token) -> ParseRes<T> {
    Err(gen_parser_err(ParseErrMsg::ExpectedExpression(tk.token_type.clone()), tk))
}

#[inline]
pub fn gen_internal_error<T>(tk: &Token, line: u32) -> ParseRes<T> {
    Err(gen_parser_err(ParseErrMsg::InternalError(line), tk))
}

#[inline]
pub fn gen_internal_error_pos<T>(pos: &TextPosition, line: u32) -> ParseRes<T> {
    Err(gen_parser_err_pos(ParseErrMsg::InternalError(line), pos))
}

#[inline]
pub fn gen_parser_err_pos(msg: ParseErrMsg, pos: &TextPosition) -> ParseErr {
    ParseErr::new(pos.clone(), pos.add_offset(1), msg)
}
