mod source;

pub mod token;

pub use token::{Token, TokenKind, Keyword, Punct};
use source::SourceBuffer;
use crate::err::{ParseErr, ParseErrMsg, ParseRes};
use crate::symbols::SymbolTable;
use crate::utils::TextPosition;

/// Pull-based lexer over a single source body.
///
/// Classifying an identifier as a typedef name depends on what the parser has declared so far,
/// so the symbol table is handed in on every pull instead of being owned here. The lexer never
/// reads ahead of the token it returns: a typedef declared between two pulls is seen by the
/// second one.
pub struct Lexer<'a> {
    src: SourceBuffer<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(body: &'a str, filename: Option<&'a str>) -> Self {
        Self { src: SourceBuffer::new(body, filename) }
    }

    /// Produce the next token. After the end of input every call returns an `EOF` token.
    pub fn next_token(&mut self, syms: &SymbolTable) -> ParseRes<Token> {
        self.skip_whitespace_and_comments()?;

        let pos = self.src.position();
        let kind = match self.src.peek() {
            None => TokenKind::EOF,
            Some(c) => match c {
                'a'..='z' | 'A'..='Z' | '_' => self.read_identifier_or_keyword(syms),
                '0'..='9' => self.read_numeric_literal(&pos)?,
                '.' if matches!(self.src.peek_nth(1), Some('0'..='9')) => self.read_numeric_literal(&pos)?,
                '"' => self.read_string_literal(&pos)?,
                '\'' => self.read_char_literal(&pos)?,
                _ => self.read_symbol(&pos)?,
            },
        };

        log::trace!("{}: {:?}", pos, kind);
        Ok(Token::new(kind, pos))
    }

    fn gen_lex_err(&self, start: &TextPosition, msg: ParseErrMsg) -> ParseErr {
        let end = self.src.position();
        let end = if end.offset > start.offset { end } else { start.add_offset(1) };
        ParseErr::new(start.clone(), end, msg)
    }

    fn skip_whitespace_and_comments(&mut self) -> ParseRes<()> {
        loop {
            match self.src.peek() {
                Some(c) if c.is_whitespace() => {
                    self.src.advance();
                },
                Some('/') if self.src.starts_with("//") => {
                    while let Some(c) = self.src.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                },
                Some('/') if self.src.starts_with("/*") => {
                    let start = self.src.position();
                    self.src.skip_n(2);
                    loop {
                        if self.src.starts_with("*/") {
                            self.src.skip_n(2);
                            break;
                        }
                        if self.src.advance().is_none() {
                            return Err(ParseErr::new(start.clone(), start.add_offset(2), ParseErrMsg::UnterminatedComment));
                        }
                    }
                },
                _ => return Ok(()),
            }
        }
    }

    fn read_identifier_or_keyword(&mut self, syms: &SymbolTable) -> TokenKind {
        let mut identifier = String::new();

        while let Some(c) = self.src.peek() {
            match c {
                'a'..='z' | 'A'..='Z' | '_' | '0'..='9' => {
                    identifier.push(c);
                    self.src.advance();
                },
                _ => break,
            }
        }

        if syms.is_type_name(&identifier) {
            TokenKind::TypeName(identifier)
        } else if let Some(kw) = Keyword::lookup(&identifier) {
            TokenKind::Keyword(kw)
        } else {
            TokenKind::Ident(identifier)
        }
    }

    /// Integer and floating constants.
    ///
    /// Integers are decimal, octal (leading `0`), hexadecimal (`0x`) or binary (`0b`), with any
    /// `u`/`l` suffixes dropped. Floats are decimal with a fraction and/or an exponent and an
    /// optional `f`/`l` suffix, which is dropped too.
    fn read_numeric_literal(&mut self, start: &TextPosition) -> ParseRes<TokenKind> {
        let prefix = match (self.src.peek(), self.src.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => "0x",
            (Some('0'), Some('b' | 'B')) => "0b",
            _ => "",
        };
        self.src.skip_n(prefix.len());

        let text = self.read_digits(if prefix == "0x" { 16 } else { 10 });
        if prefix.is_empty() && matches!(self.src.peek(), Some('.' | 'e' | 'E')) {
            return self.read_float_literal(start, text);
        }

        let radix = match prefix {
            "0x" => 16,
            "0b" => 2,
            _ if text.len() > 1 && text.starts_with('0') => 8,
            _ => 10,
        };
        while let Some('u' | 'U' | 'l' | 'L') = self.src.peek() {
            self.src.advance();
        }
        if text.is_empty() || self.is_glued_to_number() {
            return Err(self.malformed_number(start, format!("{}{}", prefix, text)));
        }

        let mut num: u64 = 0;
        for c in text.chars() {
            //a decimal digit out of range for octal or binary, e.g. `09` or `0b12`
            let digit = match c.to_digit(radix) {
                Some(d) => d as u64,
                None => return Err(self.malformed_number(start, format!("{}{}", prefix, text))),
            };
            num = match num.checked_mul(radix as u64).and_then(|n| n.checked_add(digit)) {
                Some(n) => n,
                None => return Err(self.gen_lex_err(start, ParseErrMsg::IntegerOverflow)),
            };
        }

        Ok(TokenKind::Int(num))
    }

    /// The rest of a floating constant once its integer part has been read. `text` may be empty
    /// for constants like `.5`.
    fn read_float_literal(&mut self, start: &TextPosition, mut text: String) -> ParseRes<TokenKind> {
        if self.src.peek() == Some('.') {
            self.src.advance();
            text.push('.');
            text.push_str(&self.read_digits(10));
        }
        if let Some(e @ ('e' | 'E')) = self.src.peek() {
            self.src.advance();
            text.push(e);
            if let Some(sign @ ('+' | '-')) = self.src.peek() {
                self.src.advance();
                text.push(sign);
            }
            let exponent = self.read_digits(10);
            if exponent.is_empty() {
                return Err(self.malformed_number(start, text));
            }
            text.push_str(&exponent);
        }
        if let Some('f' | 'F' | 'l' | 'L') = self.src.peek() {
            self.src.advance();
        }

        if self.is_glued_to_number() || text.parse::<f64>().is_err() {
            return Err(self.malformed_number(start, text));
        }
        Ok(TokenKind::Float(text))
    }

    fn read_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(c) = self.src.peek() {
            if !c.is_digit(radix) {
                break;
            }
            digits.push(c);
            self.src.advance();
        }
        digits
    }

    fn is_glued_to_number(&mut self) -> bool {
        matches!(self.src.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.')
    }

    /// Swallow whatever identifier-like text is glued to a bad number, so that the error shows
    /// all of it.
    fn malformed_number(&mut self, start: &TextPosition, mut text: String) -> ParseErr {
        while self.is_glued_to_number() {
            if let Some(c) = self.src.advance() {
                text.push(c);
            }
        }
        self.gen_lex_err(start, ParseErrMsg::MalformedNumber(text))
    }

    /// Reads the text between two `delim` characters. Escapes are kept as written; only their
    /// extent matters, so that `\"` does not end a string.
    fn read_quoted(&mut self, start: &TextPosition, delim: char, unterminated: ParseErrMsg) -> ParseRes<String> {
        self.src.advance(); //opening quote
        let mut literal = String::new();
        loop {
            match self.src.advance() {
                Some(c) if c == delim => return Ok(literal),
                Some('\\') => {
                    literal.push('\\');
                    match self.src.advance() {
                        Some(c) if c != '\n' => literal.push(c),
                        _ => return Err(self.gen_lex_err(start, unterminated)),
                    }
                },
                Some('\n') | None => return Err(self.gen_lex_err(start, unterminated)),
                Some(c) => literal.push(c),
            }
        }
    }

    fn read_string_literal(&mut self, start: &TextPosition) -> ParseRes<TokenKind> {
        self.read_quoted(start, '"', ParseErrMsg::UnterminatedString).map(TokenKind::Str)
    }

    fn read_char_literal(&mut self, start: &TextPosition) -> ParseRes<TokenKind> {
        let literal = self.read_quoted(start, '\'', ParseErrMsg::UnterminatedChar)?;
        if literal.is_empty() {
            return Err(self.gen_lex_err(start, ParseErrMsg::EmptyCharLiteral));
        }
        Ok(TokenKind::Char(literal))
    }

    /// Longest match over the punctuators.
    fn read_symbol(&mut self, start: &TextPosition) -> ParseRes<TokenKind> {
        let c = match self.src.advance() {
            Some(c) => c,
            None => return Err(ParseErr::new(start.clone(), start.add_offset(1), ParseErrMsg::InternalError(line!()))),
        };
        let next = self.src.peek().unwrap_or(' ');

        let symbol = match c {
            '[' => Punct::OpenBoxBracket,
            ']' => Punct::CloseBoxBracket,
            '{' => Punct::OpenBrace,
            '}' => Punct::CloseBrace,
            '(' => Punct::OpenParen,
            ')' => Punct::CloseParen,
            ';' => Punct::Semicolon,
            '?' => Punct::Question,
            ':' => Punct::Colon,
            '~' => Punct::BitwiseNot,
            ',' => Punct::Comma,
            '!' => match next {
                '=' => {self.src.advance(); Punct::Ne},
                _ => Punct::Not,
            },
            '&' => match next {
                '&' => {self.src.advance(); Punct::LAnd},
                '=' => {self.src.advance(); Punct::AssignAnd},
                _ => Punct::Ampersand,
            },
            '=' => match next {
                '=' => {self.src.advance(); Punct::Eq},
                _ => Punct::Assign,
            },
            //`**` stays two tokens; the parser decides between pointer, deref and multiplication
            '*' => match next {
                '=' => {self.src.advance(); Punct::AssignMul},
                _ => Punct::Asterisk,
            },
            //`a+++b` lexes as `a ++ + b`
            '+' => match next {
                '+' => {self.src.advance(); Punct::Inc},
                '=' => {self.src.advance(); Punct::AssignAdd},
                _ => Punct::Add,
            },
            '-' => match next {
                '-' => {self.src.advance(); Punct::Dec},
                '=' => {self.src.advance(); Punct::AssignSub},
                '>' => {self.src.advance(); Punct::Arrow},
                _ => Punct::Sub,
            },
            '%' => match next {
                '=' => {self.src.advance(); Punct::AssignMod},
                _ => Punct::Mod,
            },
            '^' => match next {
                '=' => {self.src.advance(); Punct::AssignXor},
                _ => Punct::Xor,
            },
            '>' => match next {
                '>' => {
                    self.src.advance();
                    match self.src.peek() {
                        Some('=') => {self.src.advance(); Punct::AssignShr},
                        _ => Punct::Shr,
                    }
                },
                '=' => {self.src.advance(); Punct::Ge},
                _ => Punct::Gt,
            },
            '<' => match next {
                '<' => {
                    self.src.advance();
                    match self.src.peek() {
                        Some('=') => {self.src.advance(); Punct::AssignShl},
                        _ => Punct::Shl,
                    }
                },
                '=' => {self.src.advance(); Punct::Le},
                _ => Punct::Lt,
            },
            '|' => match next {
                '|' => {self.src.advance(); Punct::LOr},
                '=' => {self.src.advance(); Punct::AssignOr},
                _ => Punct::Or,
            },
            '/' => match next {
                '=' => {self.src.advance(); Punct::AssignDiv},
                _ => Punct::Div,
            },
            '.' => {
                if next == '.' && self.src.peek_nth(1) == Some('.') {
                    self.src.skip_n(2);
                    Punct::Vararg
                } else {
                    Punct::Point
                }
            },
            _ => return Err(self.gen_lex_err(start, ParseErrMsg::InvalidSymbol(c))),
        };

        Ok(TokenKind::Punct(symbol))
    }
}

/// Lex a whole buffer against an empty symbol table. The trailing `EOF` is not included.
///
/// Without a parser feeding typedefs back, every identifier comes out as `Ident`.
pub fn tokenize(body: &str) -> ParseRes<Vec<Token>> {
    let syms = SymbolTable::new();
    let mut lexer = Lexer::new(body, None);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token(&syms)?;
        if tok.is_eof() {
            return Ok(tokens);
        }
        tokens.push(tok);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::Type;
    use crate::err::Stage;

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code).unwrap().into_iter().map(|tk| tk.token_type).collect()
    }

    fn tokenstream_to_c_code(tokens: Vec<Token>) -> String {
        tokens.into_iter().map(|token| token.spelling()).collect::<String>()
    }

    #[test]
    fn tokenize_assignment() {
        assert_eq!(kinds("my_variable2 = 3;"),
            vec![TokenKind::Ident("my_variable2".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Int(3),
                TokenKind::Punct(Punct::Semicolon)]);
    }

    #[test]
    fn read_symbol_is_longest_match() {
        assert_eq!(kinds(">>= ... -> ** <<= &&& a+++b"),
            vec![
                TokenKind::Punct(Punct::AssignShr),
                TokenKind::Punct(Punct::Vararg),
                TokenKind::Punct(Punct::Arrow),
                TokenKind::Punct(Punct::Asterisk),
                TokenKind::Punct(Punct::Asterisk),
                TokenKind::Punct(Punct::AssignShl),
                TokenKind::Punct(Punct::LAnd),
                TokenKind::Punct(Punct::Ampersand),
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct(Punct::Inc),
                TokenKind::Punct(Punct::Add),
                TokenKind::Ident("b".to_string()),
            ]);
    }

    #[test]
    fn tokenize_function() {
        let funcdef = "int func(){\n\
            int x = 0;\n\
            for(int i = 0; i < 4; i++){\n\
                x++;\n\
            }\n\
            return x;\n\
        }";
        assert_eq!(kinds(funcdef),
            vec![
                //int func(){
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Ident("func".to_string()),
                TokenKind::Punct(Punct::OpenParen),
                TokenKind::Punct(Punct::CloseParen),
                TokenKind::Punct(Punct::OpenBrace),
                //int x = 0;
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Ident("x".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Int(0),
                TokenKind::Punct(Punct::Semicolon),
                //for(int i = 0; i < 4; i++)
                TokenKind::Keyword(Keyword::For),
                TokenKind::Punct(Punct::OpenParen),
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::Assign),
                TokenKind::Int(0),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::Lt),
                TokenKind::Int(4),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Ident("i".to_string()),
                TokenKind::Punct(Punct::Inc),
                TokenKind::Punct(Punct::CloseParen),
                //{ x++; }
                TokenKind::Punct(Punct::OpenBrace),
                TokenKind::Ident("x".to_string()),
                TokenKind::Punct(Punct::Inc),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Punct(Punct::CloseBrace),
                //return x;
                TokenKind::Keyword(Keyword::Return),
                TokenKind::Ident("x".to_string()),
                TokenKind::Punct(Punct::Semicolon),
                //}
                TokenKind::Punct(Punct::CloseBrace)
            ]
        );
    }

    #[test]
    fn compare_tokenization_roundtrip() {
        let code = "void main(int argc, char** argv){\n\
            int x = 0;\n\
            x >>= y & 2 | 3;\n\
            int arr[] = {1,2,3,4,5};\n\
            printf(\"%d\\n\", arr[1]);\n\
            return 0;\n\
        }";
        let tokens = tokenize(code).unwrap();
        let code_processed = code.split_ascii_whitespace().collect::<String>();
        assert_eq!(code_processed, tokenstream_to_c_code(tokens));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("a // line\n/* block\n * more */ b"),
            vec![TokenKind::Ident("a".to_string()), TokenKind::Ident("b".to_string())]);
    }

    #[test]
    fn literals() {
        assert_eq!(kinds("0x1F 42UL 'a' '\\n' \"a\\\"b\""),
            vec![
                TokenKind::Int(31),
                TokenKind::Int(42),
                TokenKind::Char("a".to_string()),
                TokenKind::Char("\\n".to_string()),
                TokenKind::Str("a\\\"b".to_string()),
            ]);
    }

    #[test]
    fn positions_are_token_starts() {
        let tokens = tokenize("int\n  x;").unwrap();
        assert_eq!(tokens[1].pos, TextPosition::new_without_file(2, 3, 6));
        assert_eq!(tokens[2].pos, TextPosition::new_without_file(2, 4, 7));
    }

    #[test]
    fn typedef_names_come_from_the_table() {
        let mut syms = SymbolTable::new();
        syms.declare_typedef("image_t", Type::Named("int".to_string()));
        let mut lexer = Lexer::new("image_t img", None);
        assert_eq!(lexer.next_token(&syms).unwrap().token_type, TokenKind::TypeName("image_t".to_string()));
        assert_eq!(lexer.next_token(&syms).unwrap().token_type, TokenKind::Ident("img".to_string()));
        assert!(lexer.next_token(&syms).unwrap().is_eof());
        assert!(lexer.next_token(&syms).unwrap().is_eof());
    }

    #[test]
    fn unterminated_string_reports_its_start() {
        let err = tokenize("int x;\nchar *s = \"abc;\nint y;").unwrap_err();
        assert_eq!(err.message(), &ParseErrMsg::UnterminatedString);
        assert_eq!(err.stage(), Stage::Lexical);
        assert_eq!((err.position().line, err.position().col), (2, 11));
    }

    #[test]
    fn lexical_errors() {
        assert_eq!(tokenize("a @ b").unwrap_err().message(), &ParseErrMsg::InvalidSymbol('@'));
        assert_eq!(tokenize("/* never closed").unwrap_err().message(), &ParseErrMsg::UnterminatedComment);
        assert_eq!(tokenize("''").unwrap_err().message(), &ParseErrMsg::EmptyCharLiteral);
        assert_eq!(tokenize("99999999999999999999").unwrap_err().message(), &ParseErrMsg::IntegerOverflow);
        assert_eq!(tokenize("12abc").unwrap_err().message(), &ParseErrMsg::MalformedNumber("12abc".to_string()));
        assert_eq!(tokenize("09").unwrap_err().message(), &ParseErrMsg::MalformedNumber("09".to_string()));
        assert_eq!(tokenize("0b12").unwrap_err().message(), &ParseErrMsg::MalformedNumber("0b12".to_string()));
        assert_eq!(tokenize("0x;").unwrap_err().message(), &ParseErrMsg::MalformedNumber("0x".to_string()));
        assert_eq!(tokenize("1e+;").unwrap_err().message(), &ParseErrMsg::MalformedNumber("1e+".to_string()));
        assert_eq!(tokenize("0x1p3").unwrap_err().message(), &ParseErrMsg::MalformedNumber("0x1p3".to_string()));
    }

    #[test]
    fn integer_bases_and_floats() {
        assert_eq!(kinds("010 0 0b101 0xFFFFFFFFFFFFFFFFu 18446744073709551615"),
            vec![
                TokenKind::Int(8),
                TokenKind::Int(0),
                TokenKind::Int(5),
                TokenKind::Int(u64::MAX),
                TokenKind::Int(u64::MAX),
            ]);
        assert_eq!(kinds("1.5 .5 3. 1e10 2.5E-3f 09.5 x.y"),
            vec![
                TokenKind::Float("1.5".to_string()),
                TokenKind::Float(".5".to_string()),
                TokenKind::Float("3.".to_string()),
                TokenKind::Float("1e10".to_string()),
                TokenKind::Float("2.5E-3".to_string()),
                TokenKind::Float("09.5".to_string()),
                TokenKind::Ident("x".to_string()),
                TokenKind::Punct(Punct::Point),
                TokenKind::Ident("y".to_string()),
            ]);
    }

    #[test]
    fn spelling_is_normalized_for_numbers() {
        let tokens = tokenize("0x1F 42UL 1.5f").unwrap();
        let spelled = tokens.iter().map(|t| t.spelling()).collect::<Vec<_>>();
        assert_eq!(spelled, vec!["31", "42", "1.5"]);
    }
}
