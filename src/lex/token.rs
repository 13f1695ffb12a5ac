use crate::utils::TextPosition;
use std::fmt;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Keyword {
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
    Const,
    Volatile,
    Void,
    Signed,
    Unsigned,
    Char,
    Int,
    Short,
    Long,
    Float,
    Double,
    Struct,
    Enum,
    Union,
    If,
    Else,
    For,
    Do,
    While,
    Switch,
    Case,
    Default,
    Sizeof,
    Goto,
    Break,
    Continue,
    Return,
}

impl Keyword {
    /// See section 6.4.1 for a list of all keywords in the C language. Only the C89 set is
    /// recognized; everything else lexes as an identifier.
    pub fn lookup(identifier: &str) -> Option<Keyword> {
        let kw = match identifier {
            "auto" => Keyword::Auto,
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "char" => Keyword::Char,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "default" => Keyword::Default,
            "do" => Keyword::Do,
            "double" => Keyword::Double,
            "else" => Keyword::Else,
            "enum" => Keyword::Enum,
            "extern" => Keyword::Extern,
            "float" => Keyword::Float,
            "for" => Keyword::For,
            "goto" => Keyword::Goto,
            "if" => Keyword::If,
            "int" => Keyword::Int,
            "long" => Keyword::Long,
            "register" => Keyword::Register,
            "return" => Keyword::Return,
            "short" => Keyword::Short,
            "signed" => Keyword::Signed,
            "sizeof" => Keyword::Sizeof,
            "static" => Keyword::Static,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "typedef" => Keyword::Typedef,
            "union" => Keyword::Union,
            "unsigned" => Keyword::Unsigned,
            "void" => Keyword::Void,
            "volatile" => Keyword::Volatile,
            "while" => Keyword::While,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Typedef => "typedef",
            Keyword::Extern => "extern",
            Keyword::Static => "static",
            Keyword::Auto => "auto",
            Keyword::Register => "register",
            Keyword::Const => "const",
            Keyword::Volatile => "volatile",
            Keyword::Void => "void",
            Keyword::Signed => "signed",
            Keyword::Unsigned => "unsigned",
            Keyword::Char => "char",
            Keyword::Int => "int",
            Keyword::Short => "short",
            Keyword::Long => "long",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::Struct => "struct",
            Keyword::Enum => "enum",
            Keyword::Union => "union",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::Do => "do",
            Keyword::While => "while",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Default => "default",
            Keyword::Sizeof => "sizeof",
            Keyword::Goto => "goto",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Return => "return",
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Punct {
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBoxBracket,
    CloseBoxBracket,
    Comma,
    Semicolon,
    Colon,
    Question,
    Point,
    Arrow, // ->
    Inc, // ++
    Dec, // --
    Add,
    Sub,
    //asterisk has multiple possible meanings: pointer type, dereference operator, multiplication.
    //the parser decides which one from context.
    Asterisk,
    Div,
    Mod,
    Not,
    BitwiseNot,
    Ampersand, //bitwise and or address-of
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Xor,
    Or,
    LAnd,
    LOr,
    Assign,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignShl,
    AssignShr,
    AssignAnd,
    AssignXor,
    AssignOr,
    Vararg, // ...
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punct::OpenParen => "(",
            Punct::CloseParen => ")",
            Punct::OpenBrace => "{",
            Punct::CloseBrace => "}",
            Punct::OpenBoxBracket => "[",
            Punct::CloseBoxBracket => "]",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Colon => ":",
            Punct::Question => "?",
            Punct::Point => ".",
            Punct::Arrow => "->",
            Punct::Inc => "++",
            Punct::Dec => "--",
            Punct::Add => "+",
            Punct::Sub => "-",
            Punct::Asterisk => "*",
            Punct::Div => "/",
            Punct::Mod => "%",
            Punct::Not => "!",
            Punct::BitwiseNot => "~",
            Punct::Ampersand => "&",
            Punct::Shl => "<<",
            Punct::Shr => ">>",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::Eq => "==",
            Punct::Ne => "!=",
            Punct::Xor => "^",
            Punct::Or => "|",
            Punct::LAnd => "&&",
            Punct::LOr => "||",
            Punct::Assign => "=",
            Punct::AssignAdd => "+=",
            Punct::AssignSub => "-=",
            Punct::AssignMul => "*=",
            Punct::AssignDiv => "/=",
            Punct::AssignMod => "%=",
            Punct::AssignShl => "<<=",
            Punct::AssignShr => ">>=",
            Punct::AssignAnd => "&=",
            Punct::AssignXor => "^=",
            Punct::AssignOr => "|=",
            Punct::Vararg => "...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String), // identifiers
    TypeName(String), // identifiers declared by a visible `typedef`
    Punct(Punct), // punctuators
    Keyword(Keyword), // keywords
    Str(String), //string literals, raw text between the quotes
    Char(String), //char literals, raw text between the quotes
    Int(u64), //integer literals, any base
    Float(String), //floating literals, digits and exponent as written without the suffix
    EOF, //end of file
}

impl TokenKind {
    /// True for tokens that can start a declaration: storage classes, qualifiers, type keywords
    /// and typedef names.
    pub fn is_declaration_start(&self) -> bool {
        match self {
            TokenKind::TypeName(_) => true,
            TokenKind::Keyword(kw) => matches!(kw,
                Keyword::Typedef | Keyword::Extern | Keyword::Static | Keyword::Auto |
                Keyword::Register | Keyword::Const | Keyword::Volatile | Keyword::Void |
                Keyword::Signed | Keyword::Unsigned | Keyword::Char | Keyword::Int |
                Keyword::Short | Keyword::Long | Keyword::Float | Keyword::Double |
                Keyword::Struct | Keyword::Union | Keyword::Enum),
            _ => false,
        }
    }

    /// Like [`TokenKind::is_declaration_start`] but without storage class specifiers, i.e. what may
    /// begin a `type-name` in a cast or `sizeof`.
    pub fn is_type_name_start(&self) -> bool {
        match self {
            TokenKind::Keyword(Keyword::Typedef | Keyword::Extern | Keyword::Static |
                Keyword::Auto | Keyword::Register) => false,
            _ => self.is_declaration_start(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Ident(s) | TokenKind::TypeName(s) => write!(f, "{}", s),
            TokenKind::Punct(p) => write!(f, "{}", p.as_str()),
            TokenKind::Keyword(kw) => write!(f, "{}", kw.as_str()),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Char(s) => write!(f, "'{}'", s),
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::Float(s) => write!(f, "{}", s),
            TokenKind::EOF => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenKind, //token kind
    pub pos: TextPosition, //position of the first character of the token
}

impl Token {
    pub fn new(ttype: TokenKind, pos: TextPosition) -> Self {
        Self { token_type: ttype, pos }
    }

    /// Canonical text of the token. Identifiers, keywords and punctuators read as written;
    /// integer literals are printed in decimal whatever base they were written in, and numeric
    /// suffixes are dropped (`0x1F` and `31u` both spell `31`).
    pub fn spelling(&self) -> String {
        self.token_type.to_string()
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == TokenKind::EOF
    }
}
