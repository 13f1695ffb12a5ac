use super::parse_err::{gen_internal_error, gen_parser_err};
use crate::err::{ParseErrMsg, ParseRes};
use crate::lex::{Keyword, Token};

/// Tallies the builtin type keywords of a declaration specifier list, which may come in any order
/// (`int long unsigned` is `unsigned long`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeCounter {
    void: u8,
    char: u8,
    short: u8,
    int: u8,
    long: u8,
    float: u8,
    double: u8,
    signed: u8,
    unsigned: u8,
    seen: Vec<Keyword>,
}

impl TypeCounter {
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Count `kw`, failing on `token` as soon as the combination can no longer name a type.
    pub fn add(&mut self, kw: Keyword, token: &Token) -> ParseRes<()> {
        match kw {
            Keyword::Void => self.void += 1,
            Keyword::Char => self.char += 1,
            Keyword::Short => self.short += 1,
            Keyword::Int => self.int += 1,
            Keyword::Long => self.long += 1,
            Keyword::Float => self.float += 1,
            Keyword::Double => self.double += 1,
            Keyword::Signed => self.signed += 1,
            Keyword::Unsigned => self.unsigned += 1,
            _ => return gen_internal_error(token, line!()),
        }
        self.seen.push(kw);
        self.check_consistency(token)
    }

    pub fn check_consistency(&self, token: &Token) -> ParseRes<()> {
        if self.canonical().is_none() {
            let spelled = self.seen.iter().map(|kw| kw.as_str()).collect::<Vec<_>>().join(" ");
            return Err(gen_parser_err(ParseErrMsg::InvalidTypeSpecifier(spelled), token));
        }
        Ok(())
    }

    /// Normalized spelling of the counted type, e.g. `"unsigned int"` for a lone `unsigned`.
    pub fn spelling(&self) -> Option<String> {
        self.canonical().map(|s| s.to_string())
    }

    fn canonical(&self) -> Option<&'static str> {
        if self.signed > 1 || self.unsigned > 1 || (self.signed > 0 && self.unsigned > 0) {
            //signed and unsigned are mutually exclusive
            return None;
        }
        if self.void > 1 || self.char > 1 || self.short > 1 || self.int > 1 ||
            self.float > 1 || self.double > 1 || self.long > 2 {
            //exceptionally, `long long` is acceptable
            return None;
        }

        let has_sign = self.signed > 0 || self.unsigned > 0;
        let uns = self.unsigned > 0;
        let name = match (self.void, self.char, self.short, self.long, self.float, self.double) {
            (1, 0, 0, 0, 0, 0) if !has_sign && self.int == 0 => "void",
            (0, 1, 0, 0, 0, 0) if self.int == 0 => {
                if uns {
                    "unsigned char"
                } else if has_sign {
                    "signed char"
                } else {
                    "char"
                }
            },
            (0, 0, 1, 0, 0, 0) => if uns { "unsigned short" } else { "short" },
            (0, 0, 0, 0, 0, 0) if has_sign || self.int == 1 => if uns { "unsigned int" } else { "int" },
            (0, 0, 0, 1, 0, 0) => if uns { "unsigned long" } else { "long" },
            (0, 0, 0, 2, 0, 0) => if uns { "unsigned long long" } else { "long long" },
            (0, 0, 0, 0, 1, 0) if !has_sign && self.int == 0 => "float",
            (0, 0, 0, 0, 0, 1) if !has_sign && self.int == 0 => "double",
            (0, 0, 0, 1, 0, 1) if !has_sign && self.int == 0 => "long double",
            _ => return None,
        };
        Some(name)
    }
}
