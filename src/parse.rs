mod expr;
mod iter;
mod parse_err;
mod type_counter;

pub use iter::{Mark, TokenCursor};

use crate::ast::*;
use crate::err::{ParseErrMsg, ParseRes};
use crate::lex::{Keyword, Lexer, Punct, Token, TokenKind};
use crate::symbols::SymbolTable;
use crate::utils::TextPosition;
use expr::{assign_op, binary_op, infix_binding_power, prefix_op};
use expr::{ASSIGN_PRIO, CONDITIONAL_PRIO, EXPR_PRIO, PREFIX_PRIO, TERNARY_MID_PRIO};
use parse_err::*;
use type_counter::TypeCounter;

/// Contains the state of the parser.
///
/// The parser owns both the token source and the symbol table. Declaring a typedef updates the
/// table, and because tokens are only lexed when the parser looks at them, every token after the
/// typedef's declarator is classified with the new name visible.
pub struct Parser<'a> {
    tokens: TokenCursor<'a>,
    syms: SymbolTable,
}

/// Everything in a declaration before the first declarator.
#[derive(Debug, Clone)]
struct DeclSpec {
    base: Type,
    storage: Option<StorageClass>,
    is_typedef: bool,
    qualifiers: Qualifiers,
    pos: TextPosition,
}

/// One step of a declarator, applied to the base type from the inside out.
#[derive(Debug, Clone)]
enum TypeModifier {
    Pointer,
    Array(Option<Box<Expr>>),
    Function { params: Vec<Param>, variadic: bool },
}

/// A declarator before its base type is known.
///
/// `mods` is ordered from the base type outwards: `*a[3]` gives `[Pointer, Array]`, so `a` is an
/// array of pointers. When the last modifier is a `Function`, its params are the ones a function
/// definition body sees.
#[derive(Debug, Clone)]
struct DeclaratorParts {
    name: Option<(String, TextPosition)>,
    mods: Vec<TypeModifier>,
}

impl DeclaratorParts {
    fn declares_function(&self) -> bool {
        matches!(self.mods.last(), Some(TypeModifier::Function { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaratorMode {
    /// Declarations: a name is required.
    Named,
    /// Type names in casts and `sizeof`: no name allowed.
    Abstract,
    /// Parameters.
    Either,
}

fn apply_modifiers(base: Type, mods: Vec<TypeModifier>) -> Type {
    mods.into_iter().fold(base, |ty, m| match m {
        TypeModifier::Pointer => ty.pointer_to(),
        TypeModifier::Array(size) => Type::Array(Box::new(ty), size),
        TypeModifier::Function { params, variadic } => Type::Function {
            returns: Box::new(ty),
            params: params.into_iter().map(|p| p.ty).collect(),
            variadic,
        },
    })
}

impl<'a> Parser<'a> {
    pub fn new(body: &'a str, filename: Option<&'a str>) -> Self {
        Self {
            tokens: TokenCursor::new(Lexer::new(body, filename)),
            syms: SymbolTable::new(),
        }
    }

    /// Parse the whole input. Stops at the first lexical or syntax error.
    pub fn parse(mut self) -> ParseRes<TranslationUnit> {
        self.parse_translation_unit()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.syms
    }

    // ---- token helpers ----

    fn peek(&mut self) -> ParseRes<&Token> {
        self.tokens.peek(&self.syms)
    }

    fn peek_nth(&mut self, n: usize) -> ParseRes<&Token> {
        self.tokens.peek_nth(n, &self.syms)
    }

    fn advance(&mut self) -> ParseRes<Token> {
        self.tokens.advance(&self.syms)
    }

    /// Ensures the next token is of kind `tk` and consumes it. If the token is of the wrong kind,
    /// returns an `Err` naming the expected kind.
    ///
    /// This method is useful for parsing symbols that **must** appear in a particular branch.
    fn ensure_and_consume(&mut self, tk: TokenKind) -> ParseRes<Token> {
        let token = self.peek()?;
        if token.token_type != tk {
            let token = token.clone();
            return gen_expected_error(&token, tk);
        }
        self.advance()
    }

    /// Determine if the next token has kind `kind`, without consuming it.
    fn check_if_equal(&mut self, kind: TokenKind) -> ParseRes<bool> {
        Ok(self.peek()?.token_type == kind)
    }

    /// Consumes the next token if its kind is equal to `kind`. Returns `true` if it was consumed.
    /// Unlike [`Parser::ensure_and_consume`], this does not fail if the token differs.
    fn consume_if_equal(&mut self, kind: TokenKind) -> ParseRes<bool> {
        if self.check_if_equal(kind)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn check_punct(&mut self, pn: Punct) -> ParseRes<bool> {
        self.check_if_equal(TokenKind::Punct(pn))
    }

    fn consume_punct(&mut self, pn: Punct) -> ParseRes<bool> {
        self.consume_if_equal(TokenKind::Punct(pn))
    }

    fn ensure_punct(&mut self, pn: Punct) -> ParseRes<Token> {
        self.ensure_and_consume(TokenKind::Punct(pn))
    }

    /// Extract the position of the next token, without consuming it.
    fn extract_position(&mut self) -> ParseRes<TextPosition> {
        Ok(self.peek()?.pos.clone())
    }

    /// Consume an identifier. Typedef names are accepted too, since member names and tags live
    /// in namespaces of their own.
    fn expect_identifier(&mut self) -> ParseRes<(String, TextPosition)> {
        let token = self.advance()?;
        match token.token_type {
            TokenKind::Ident(name) | TokenKind::TypeName(name) => Ok((name, token.pos)),
            _ => Err(gen_parser_err(ParseErrMsg::ExpectedIdentifier(token.token_type.clone()), &token)),
        }
    }

    /// Leave the innermost scope. Lookahead lexed before the pop is classified again, since a
    /// statement such as an `if` without `else` may already have peeked past the scope's end.
    fn pop_scope(&mut self, pos: &TextPosition) -> ParseRes<()> {
        match self.syms.pop_scope() {
            Ok(()) => {
                self.tokens.reclassify(&self.syms);
                Ok(())
            },
            Err(_) => gen_internal_error_pos(pos, line!()),
        }
    }

    fn declare_typedef(&mut self, name: &str, ty: Type) {
        self.syms.declare_typedef(name, ty);
        self.tokens.reclassify(&self.syms);
    }

    fn declare_ordinary(&mut self, name: &str) {
        self.syms.declare_ordinary(name);
        self.tokens.reclassify(&self.syms);
    }

    fn declare_enumerator(&mut self, name: &str) {
        self.syms.declare_enumerator(name);
        self.tokens.reclassify(&self.syms);
    }

    // ---- declarations ----

    /// `translation-unit ::= external-declaration*`
    fn parse_translation_unit(&mut self) -> ParseRes<TranslationUnit> {
        let mut decls = Vec::new();
        while !self.peek()?.is_eof() {
            decls.push(self.parse_external_declaration()?);
        }
        log::debug!("parsed {} top-level declarations", decls.len());
        Ok(TranslationUnit { decls })
    }

    /// `external-declaration ::= function-definition | declaration`
    ///
    /// Both start with specifiers and a declarator; a function definition is a declarator of
    /// function type directly followed by `{`.
    fn parse_external_declaration(&mut self) -> ParseRes<ExternalDecl> {
        let spec = self.parse_declaration_specifiers()?;
        if self.consume_punct(Punct::Semicolon)? {
            return Ok(ExternalDecl::Declaration(DeclGroup { base: spec.base, decls: Vec::new(), pos: spec.pos }));
        }

        let first = self.parse_declarator(DeclaratorMode::Named)?;
        if first.declares_function() && self.check_punct(Punct::OpenBrace)? {
            return Ok(ExternalDecl::Function(self.parse_function_definition(spec, first)?));
        }

        Ok(ExternalDecl::Declaration(self.parse_init_declarators(spec, first)?))
    }

    /// `declaration ::= declaration-specifier+ (init-declarator (',' init-declarator)*)? ';'`
    fn parse_declaration(&mut self) -> ParseRes<DeclGroup> {
        let spec = self.parse_declaration_specifiers()?;
        if self.consume_punct(Punct::Semicolon)? {
            return Ok(DeclGroup { base: spec.base, decls: Vec::new(), pos: spec.pos });
        }
        let first = self.parse_declarator(DeclaratorMode::Named)?;
        self.parse_init_declarators(spec, first)
    }

    /// The remainder of a declaration once its first declarator has been read, up to and
    /// including the `;`.
    fn parse_init_declarators(&mut self, spec: DeclSpec, first: DeclaratorParts) -> ParseRes<DeclGroup> {
        let mut decls = Vec::new();
        let mut parts = first;
        loop {
            decls.push(self.parse_init_declarator(&spec, parts)?);
            if !self.consume_punct(Punct::Comma)? {
                break;
            }
            parts = self.parse_declarator(DeclaratorMode::Named)?;
        }
        self.ensure_punct(Punct::Semicolon)?;

        Ok(DeclGroup { base: spec.base, decls, pos: spec.pos })
    }

    /// Declares the name of a complete declarator, then reads its initializer if there is one.
    ///
    /// The declarator's suffixes have already been read, so the lookahead is `,` `;` or `=`. Nothing
    /// that could be a typedef name has been lexed past the declarator yet.
    fn parse_init_declarator(&mut self, spec: &DeclSpec, parts: DeclaratorParts) -> ParseRes<Declaration> {
        let (name, pos) = match parts.name {
            Some(name) => name,
            None => return gen_internal_error_pos(&spec.pos, line!()),
        };
        let ty = apply_modifiers(spec.base.clone(), parts.mods);

        if spec.is_typedef {
            self.declare_typedef(&name, ty.clone());
        } else {
            self.declare_ordinary(&name);
        }

        let init = if !spec.is_typedef && self.consume_punct(Punct::Assign)? {
            Some(self.parse_initializer()?)
        } else {
            None
        };

        Ok(Declaration {
            name,
            ty,
            init,
            is_typedef: spec.is_typedef,
            storage: spec.storage,
            qualifiers: spec.qualifiers,
            pos,
        })
    }

    /// `initializer ::= assignment-expression | '{' initializer (',' initializer)* ','? '}'`
    fn parse_initializer(&mut self) -> ParseRes<Expr> {
        let pos = self.extract_position()?;
        if !self.consume_punct(Punct::OpenBrace)? {
            return self.parse_expr_bp(ASSIGN_PRIO);
        }

        let mut items = Vec::new();
        while !self.check_punct(Punct::CloseBrace)? {
            items.push(self.parse_initializer()?);
            if !self.consume_punct(Punct::Comma)? {
                break;
            }
        }
        self.ensure_punct(Punct::CloseBrace)?;
        Ok(Expr::new(ExprKind::InitList(items), pos))
    }

    /// `function-definition ::= declaration-specifier+ declarator compound-statement`
    ///
    /// The parameters are redeclared in the body's scope, so a parameter named like an outer
    /// typedef hides it inside the body.
    fn parse_function_definition(&mut self, spec: DeclSpec, parts: DeclaratorParts) -> ParseRes<FunctionDef> {
        let (name, name_pos) = match &parts.name {
            Some(name) => name.clone(),
            None => return gen_internal_error_pos(&spec.pos, line!()),
        };
        if spec.is_typedef {
            return Err(gen_parser_err_pos(ParseErrMsg::InvalidFunctionDefinition(name), &name_pos));
        }
        let params = match parts.mods.last() {
            Some(TypeModifier::Function { params, .. }) => params.clone(),
            _ => return gen_internal_error_pos(&name_pos, line!()),
        };
        let ty = apply_modifiers(spec.base, parts.mods);

        self.declare_ordinary(&name);
        self.ensure_punct(Punct::OpenBrace)?;
        self.syms.push_scope();
        for param in &params {
            if let Some(pname) = &param.name {
                self.declare_ordinary(pname);
            }
        }
        let body = self.parse_block_items()?;
        let close = self.ensure_punct(Punct::CloseBrace)?;
        self.pop_scope(&close.pos)?;

        log::debug!("function `{}` with {} statements", name, body.len());
        Ok(FunctionDef { name, ty, params, body, storage: spec.storage, pos: spec.pos })
    }

    fn read_storage_class_specifier(kw: Keyword) -> Option<StorageClass> {
        match kw {
            Keyword::Extern => Some(StorageClass::Extern),
            Keyword::Static => Some(StorageClass::Static),
            Keyword::Auto => Some(StorageClass::Auto),
            Keyword::Register => Some(StorageClass::Register),
            _ => None,
        }
    }

    /// `declaration-specifier ::= storage-class | type-qualifier | type-specifier`
    ///
    /// A typedef name only counts as a type specifier while no other type specifier has been
    /// seen; otherwise it is the declarator's name (`typedef int T; void f(void) { long T; }`).
    fn parse_declaration_specifiers(&mut self) -> ParseRes<DeclSpec> {
        let pos = self.extract_position()?;
        let mut counter = TypeCounter::default();
        let mut other: Option<Type> = None;
        let mut storage = None;
        let mut is_typedef = false;
        let mut qualifiers = Qualifiers::default();

        loop {
            let token = self.peek()?.clone();
            match &token.token_type {
                TokenKind::Keyword(kw) => match kw {
                    Keyword::Typedef | Keyword::Extern | Keyword::Static |
                    Keyword::Auto | Keyword::Register => {
                        if is_typedef || storage.is_some() {
                            return Err(gen_parser_err(ParseErrMsg::DuplicateStorageClass(*kw), &token));
                        }
                        self.advance()?;
                        if *kw == Keyword::Typedef {
                            is_typedef = true;
                        } else {
                            storage = Parser::read_storage_class_specifier(*kw);
                        }
                    },
                    Keyword::Const => {
                        self.advance()?;
                        qualifiers.is_const = true;
                    },
                    Keyword::Volatile => {
                        self.advance()?;
                        qualifiers.is_volatile = true;
                    },
                    Keyword::Void | Keyword::Char | Keyword::Short | Keyword::Int |
                    Keyword::Long | Keyword::Float | Keyword::Double |
                    Keyword::Signed | Keyword::Unsigned => {
                        if other.is_some() {
                            return Err(gen_parser_err(ParseErrMsg::InvalidTypeSpecifier(token.spelling()), &token));
                        }
                        self.advance()?;
                        counter.add(*kw, &token)?;
                    },
                    Keyword::Struct | Keyword::Union | Keyword::Enum => {
                        if other.is_some() || !counter.is_empty() {
                            return Err(gen_parser_err(ParseErrMsg::InvalidTypeSpecifier(token.spelling()), &token));
                        }
                        let ty = if *kw == Keyword::Enum {
                            self.parse_enum_specifier()?
                        } else {
                            self.parse_struct_union_specifier()?
                        };
                        other = Some(ty);
                    },
                    _ => break,
                },
                TokenKind::TypeName(name) if other.is_none() && counter.is_empty() => {
                    self.advance()?;
                    other = Some(Type::Named(name.clone()));
                },
                _ => break,
            }
        }

        let base = match (other, counter.spelling()) {
            (Some(ty), _) => ty,
            (None, Some(name)) => Type::Named(name),
            (None, None) => {
                let token = self.peek()?.clone();
                return Err(gen_parser_err(ParseErrMsg::ExpectedTypeSpecifier(token.token_type.clone()), &token));
            },
        };

        Ok(DeclSpec { base, storage, is_typedef, qualifiers, pos })
    }

    /// `struct-union-specifier ::= ('struct' | 'union') identifier? ('{' struct-declaration* '}')?`
    ///
    /// At least one of the tag and the body must be present. Tags and members are not entered
    /// into the symbol table.
    fn parse_struct_union_specifier(&mut self) -> ParseRes<Type> {
        let token = self.advance()?;
        let kind = match token.token_type {
            TokenKind::Keyword(Keyword::Struct) => RecordKind::Struct,
            TokenKind::Keyword(Keyword::Union) => RecordKind::Union,
            _ => return gen_internal_error(&token, line!()),
        };

        let tag = match self.peek()?.token_type {
            TokenKind::Ident(_) | TokenKind::TypeName(_) => Some(self.expect_identifier()?.0),
            _ => None,
        };

        if !self.check_punct(Punct::OpenBrace)? {
            if tag.is_none() {
                let token = self.peek()?.clone();
                return gen_expected_one_of_error(&token, vec![TokenKind::Ident("identifier".to_string()), TokenKind::Punct(Punct::OpenBrace)]);
            }
            return Ok(Type::Record { kind, tag, fields: None });
        }

        self.ensure_punct(Punct::OpenBrace)?;
        self.syms.push_record_scope();
        let mut fields = Vec::new();
        while !self.check_punct(Punct::CloseBrace)? {
            self.parse_struct_declaration(&mut fields)?;
        }
        let close = self.ensure_punct(Punct::CloseBrace)?;
        self.pop_scope(&close.pos)?;

        Ok(Type::Record { kind, tag, fields: Some(fields) })
    }

    /// `struct-declaration ::= specifier-qualifier+ declarator (',' declarator)* ';'`
    ///
    /// Bitfields are not supported: a `:` after a member declarator is a syntax error.
    fn parse_struct_declaration(&mut self, fields: &mut Vec<Field>) -> ParseRes<()> {
        let spec = self.parse_declaration_specifiers()?;
        if spec.is_typedef || spec.storage.is_some() {
            return Err(gen_parser_err_pos(ParseErrMsg::ExpectedTypeSpecifier(TokenKind::Keyword(Keyword::Typedef)), &spec.pos));
        }
        loop {
            let parts = self.parse_declarator(DeclaratorMode::Named)?;
            let name = match parts.name {
                Some((name, _)) => name,
                None => return gen_internal_error_pos(&spec.pos, line!()),
            };
            fields.push(Field { name, ty: apply_modifiers(spec.base.clone(), parts.mods) });
            if !self.consume_punct(Punct::Comma)? {
                break;
            }
        }
        let token = self.peek()?.clone();
        if token.token_type != TokenKind::Punct(Punct::Semicolon) {
            return gen_expected_one_of_error(&token, vec![TokenKind::Punct(Punct::Comma), TokenKind::Punct(Punct::Semicolon)]);
        }
        self.advance()?;
        Ok(())
    }

    /// `enum-specifier ::= 'enum' identifier? ('{' enumerator (',' enumerator)* ','? '}')?`
    ///
    /// `enumerator ::= identifier ('=' conditional-expression)?`
    ///
    /// Enumeration constants are ordinary identifiers of the enclosing scope.
    fn parse_enum_specifier(&mut self) -> ParseRes<Type> {
        self.ensure_and_consume(TokenKind::Keyword(Keyword::Enum))?;

        let tag = match self.peek()?.token_type {
            TokenKind::Ident(_) | TokenKind::TypeName(_) => Some(self.expect_identifier()?.0),
            _ => None,
        };

        if !self.consume_punct(Punct::OpenBrace)? {
            if tag.is_none() {
                let token = self.peek()?.clone();
                return gen_expected_one_of_error(&token, vec![TokenKind::Ident("identifier".to_string()), TokenKind::Punct(Punct::OpenBrace)]);
            }
            return Ok(Type::Enum { tag, enumerators: None });
        }

        let mut enumerators = Vec::new();
        while !self.check_punct(Punct::CloseBrace)? {
            let (name, _) = self.expect_identifier()?;
            self.declare_enumerator(&name);
            let value = if self.consume_punct(Punct::Assign)? {
                Some(self.parse_expr_bp(CONDITIONAL_PRIO)?)
            } else {
                None
            };
            enumerators.push(Enumerator { name, value });
            if !self.consume_punct(Punct::Comma)? {
                break;
            }
        }
        self.ensure_punct(Punct::CloseBrace)?;

        Ok(Type::Enum { tag, enumerators: Some(enumerators) })
    }

    /// `pointer ::= ('*' type-qualifier*)*`. Qualifiers on the pointer itself are not recorded.
    fn parse_pointer(&mut self) -> ParseRes<usize> {
        let mut count = 0;
        while self.consume_punct(Punct::Asterisk)? {
            count += 1;
            while self.consume_if_equal(TokenKind::Keyword(Keyword::Const))? ||
                self.consume_if_equal(TokenKind::Keyword(Keyword::Volatile))? {}
        }
        Ok(count)
    }

    /// Whether a `(` at the start of a declarator opens a nested declarator rather than a
    /// parameter list. Named declarators can't start with a parameter list, so only the other
    /// modes need the token after the parenthesis.
    fn is_nested_declarator(&mut self, mode: DeclaratorMode) -> ParseRes<bool> {
        if mode == DeclaratorMode::Named {
            return Ok(true);
        }
        let next = &self.peek_nth(1)?.token_type;
        Ok(match next {
            TokenKind::Punct(Punct::Asterisk | Punct::OpenParen | Punct::OpenBoxBracket) => true,
            TokenKind::Ident(_) => mode == DeclaratorMode::Either,
            _ => false,
        })
    }

    /// `declarator ::= pointer? ( identifier | '(' declarator ')' )? declarator-suffix*`
    ///
    /// Pointers bind looser than the suffixes, and a parenthesized declarator binds tighter than
    /// anything around it: `(*fp)(int)` is a pointer to a function, `*fp(int)` a function returning
    /// a pointer.
    fn parse_declarator(&mut self, mode: DeclaratorMode) -> ParseRes<DeclaratorParts> {
        let pointers = self.parse_pointer()?;

        let token = self.peek()?.clone();
        let mut name = None;
        let mut inner = None;
        match &token.token_type {
            TokenKind::Ident(id) | TokenKind::TypeName(id) if mode != DeclaratorMode::Abstract => {
                self.advance()?;
                name = Some((id.clone(), token.pos.clone()));
            },
            TokenKind::Punct(Punct::OpenParen) if self.is_nested_declarator(mode)? => {
                self.advance()?;
                inner = Some(self.parse_declarator(mode)?);
                self.ensure_punct(Punct::CloseParen)?;
            },
            _ if mode == DeclaratorMode::Named => {
                return Err(gen_parser_err(ParseErrMsg::ExpectedDeclarator(token.token_type.clone()), &token));
            },
            _ => (),
        }

        let suffixes = self.parse_declarator_suffixes()?;

        let mut mods = vec![TypeModifier::Pointer; pointers];
        mods.extend(suffixes.into_iter().rev());
        if let Some(inner) = inner {
            mods.extend(inner.mods);
            name = inner.name;
        }

        Ok(DeclaratorParts { name, mods })
    }

    /// `declarator-suffix ::= '[' conditional-expression? ']' | '(' parameter-list ')'`
    fn parse_declarator_suffixes(&mut self) -> ParseRes<Vec<TypeModifier>> {
        let mut suffixes = Vec::new();
        loop {
            if self.consume_punct(Punct::OpenBoxBracket)? {
                if self.consume_punct(Punct::CloseBoxBracket)? {
                    suffixes.push(TypeModifier::Array(None));
                    continue;
                }
                let size = self.parse_expr_bp(CONDITIONAL_PRIO)?;
                self.ensure_punct(Punct::CloseBoxBracket)?;
                suffixes.push(TypeModifier::Array(Some(Box::new(size))));
            } else if self.consume_punct(Punct::OpenParen)? {
                let (params, variadic) = self.parse_parameter_list()?;
                suffixes.push(TypeModifier::Function { params, variadic });
            } else {
                return Ok(suffixes);
            }
        }
    }

    /// Parameters, after the opening parenthesis has been consumed.
    ///
    /// `parameter-list ::= 'void' | param (',' param)* (',' '...')? | ε`
    ///
    /// `param ::= declaration-specifier+ (declarator | abstract-declarator)?`
    ///
    /// The list gets its own scope so that parameter names can hide typedef names for the rest
    /// of the list.
    fn parse_parameter_list(&mut self) -> ParseRes<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut is_vararg = false;

        //`f(void)` takes no parameters
        if self.check_if_equal(TokenKind::Keyword(Keyword::Void))? &&
            self.peek_nth(1)?.token_type == TokenKind::Punct(Punct::CloseParen) {
            self.advance()?;
            self.advance()?;
            return Ok((params, false));
        }

        self.syms.push_scope();
        if !self.check_punct(Punct::CloseParen)? {
            loop {
                //if the next token is `...` then the function accepts varargs. It must come last.
                if self.consume_punct(Punct::Vararg)? {
                    is_vararg = true;
                    break;
                }
                let pos = self.extract_position()?;
                let spec = self.parse_declaration_specifiers()?;
                let parts = self.parse_declarator(DeclaratorMode::Either)?;
                let name = parts.name.map(|(name, _)| name);
                if let Some(name) = &name {
                    self.declare_ordinary(name);
                }
                params.push(Param { name, ty: apply_modifiers(spec.base, parts.mods), pos });

                if !self.consume_punct(Punct::Comma)? {
                    break;
                }
            }
        }
        let close = self.ensure_punct(Punct::CloseParen)?;
        self.pop_scope(&close.pos)?;

        Ok((params, is_vararg))
    }

    /// `type-name ::= specifier-qualifier+ abstract-declarator?`, as used by casts and `sizeof`.
    fn parse_type_name(&mut self) -> ParseRes<Type> {
        let spec = self.parse_declaration_specifiers()?;
        let parts = self.parse_declarator(DeclaratorMode::Abstract)?;
        Ok(apply_modifiers(spec.base, parts.mods))
    }

    // ---- statements ----

    /// `block-item ::= declaration | statement`, up to (not including) the closing brace.
    fn parse_block_items(&mut self) -> ParseRes<Vec<Stmt>> {
        let mut items = Vec::new();
        while !self.check_punct(Punct::CloseBrace)? {
            let token = self.peek()?.clone();
            if token.is_eof() {
                return gen_expected_error(&token, TokenKind::Punct(Punct::CloseBrace));
            }
            if token.token_type.is_declaration_start() {
                let group = self.parse_declaration()?;
                items.push(Stmt::new(StmtKind::Declaration(group), token.pos));
            } else {
                items.push(self.parse_statement()?);
            }
        }
        Ok(items)
    }

    /// `compound-statement ::= '{' block-item* '}'`
    fn parse_compound_stmt(&mut self) -> ParseRes<Stmt> {
        let open = self.ensure_punct(Punct::OpenBrace)?;
        self.syms.push_scope();
        let items = self.parse_block_items()?;
        let close = self.ensure_punct(Punct::CloseBrace)?;
        self.pop_scope(&close.pos)?;
        Ok(Stmt::new(StmtKind::Block(items), open.pos))
    }

    fn parse_statement(&mut self) -> ParseRes<Stmt> {
        let token = self.peek()?.clone();
        match &token.token_type {
            TokenKind::Punct(Punct::OpenBrace) => self.parse_compound_stmt(),
            TokenKind::Punct(Punct::Semicolon) => {
                self.advance()?;
                Ok(Stmt::new(StmtKind::Empty, token.pos))
            },
            TokenKind::Keyword(Keyword::If) | TokenKind::Keyword(Keyword::Switch) => self.parse_selection_stmt(),
            TokenKind::Keyword(Keyword::While) | TokenKind::Keyword(Keyword::Do) |
            TokenKind::Keyword(Keyword::For) => self.parse_iteration_stmt(),
            TokenKind::Keyword(Keyword::Goto) | TokenKind::Keyword(Keyword::Continue) |
            TokenKind::Keyword(Keyword::Break) | TokenKind::Keyword(Keyword::Return) => self.parse_jump_stmt(),
            TokenKind::Keyword(Keyword::Case) | TokenKind::Keyword(Keyword::Default) => self.parse_labeled_stmt(),
            TokenKind::Ident(_) if self.peek_nth(1)?.token_type == TokenKind::Punct(Punct::Colon) => self.parse_labeled_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `labeled-stmt ::= identifier ':' statement | 'case' conditional-expression ':' statement | 'default' ':' statement`
    fn parse_labeled_stmt(&mut self) -> ParseRes<Stmt> {
        let token = self.advance()?;
        let kind = match token.token_type {
            TokenKind::Keyword(Keyword::Case) => {
                let value = self.parse_expr_bp(CONDITIONAL_PRIO)?;
                self.ensure_punct(Punct::Colon)?;
                StmtKind::Case { value, body: Box::new(self.parse_statement()?) }
            },
            TokenKind::Keyword(Keyword::Default) => {
                self.ensure_punct(Punct::Colon)?;
                StmtKind::Default(Box::new(self.parse_statement()?))
            },
            TokenKind::Ident(name) => {
                self.ensure_punct(Punct::Colon)?;
                StmtKind::Label { name, body: Box::new(self.parse_statement()?) }
            },
            _ => return gen_internal_error(&token, line!()),
        };
        Ok(Stmt::new(kind, token.pos))
    }

    /// `selection-stmt ::= 'if' '(' expression ')' statement ('else' statement)? | 'switch' '(' expression ')' statement`
    fn parse_selection_stmt(&mut self) -> ParseRes<Stmt> {
        let token = self.advance()?;
        self.ensure_punct(Punct::OpenParen)?;
        let cond = self.parse_expr_bp(EXPR_PRIO)?;
        self.ensure_punct(Punct::CloseParen)?;
        let body = Box::new(self.parse_statement()?);

        let kind = match token.token_type {
            TokenKind::Keyword(Keyword::If) => {
                let els = if self.consume_if_equal(TokenKind::Keyword(Keyword::Else))? {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StmtKind::If { cond, then: body, els }
            },
            TokenKind::Keyword(Keyword::Switch) => StmtKind::Switch { cond, body },
            _ => return gen_internal_error(&token, line!()),
        };
        Ok(Stmt::new(kind, token.pos))
    }

    /// `iteration-stmt ::= 'while' '(' expression ')' statement
    ///                   | 'do' statement 'while' '(' expression ')' ';'
    ///                   | 'for' '(' (declaration | expression? ';') expression? ';' expression? ')' statement`
    fn parse_iteration_stmt(&mut self) -> ParseRes<Stmt> {
        let token = self.advance()?;
        let kind = match token.token_type {
            TokenKind::Keyword(Keyword::While) => {
                self.ensure_punct(Punct::OpenParen)?;
                let cond = self.parse_expr_bp(EXPR_PRIO)?;
                self.ensure_punct(Punct::CloseParen)?;
                StmtKind::While { cond, body: Box::new(self.parse_statement()?) }
            },
            TokenKind::Keyword(Keyword::Do) => {
                let body = Box::new(self.parse_statement()?);
                self.ensure_and_consume(TokenKind::Keyword(Keyword::While))?;
                self.ensure_punct(Punct::OpenParen)?;
                let cond = self.parse_expr_bp(EXPR_PRIO)?;
                self.ensure_punct(Punct::CloseParen)?;
                self.ensure_punct(Punct::Semicolon)?;
                StmtKind::DoWhile { body, cond }
            },
            TokenKind::Keyword(Keyword::For) => {
                self.ensure_punct(Punct::OpenParen)?;
                //the declaration in the initializer is scoped to the loop
                self.syms.push_scope();

                let init = if self.consume_punct(Punct::Semicolon)? {
                    None
                } else if self.peek()?.token_type.is_declaration_start() {
                    Some(ForInit::Decl(self.parse_declaration()?))
                } else {
                    let expr = self.parse_expr_bp(EXPR_PRIO)?;
                    self.ensure_punct(Punct::Semicolon)?;
                    Some(ForInit::Expr(expr))
                };
                let cond = if self.check_punct(Punct::Semicolon)? {
                    None
                } else {
                    Some(self.parse_expr_bp(EXPR_PRIO)?)
                };
                self.ensure_punct(Punct::Semicolon)?;
                let step = if self.check_punct(Punct::CloseParen)? {
                    None
                } else {
                    Some(self.parse_expr_bp(EXPR_PRIO)?)
                };
                self.ensure_punct(Punct::CloseParen)?;
                let body = Box::new(self.parse_statement()?);

                self.pop_scope(&token.pos)?;
                StmtKind::For { init, cond, step, body }
            },
            _ => return gen_internal_error(&token, line!()),
        };
        Ok(Stmt::new(kind, token.pos))
    }

    /// `jump-stmt ::= 'goto' identifier ';' | 'continue' ';' | 'break' ';' | 'return' expression? ';'`
    fn parse_jump_stmt(&mut self) -> ParseRes<Stmt> {
        let token = self.advance()?;
        let kind = match token.token_type {
            TokenKind::Keyword(Keyword::Goto) => StmtKind::Goto(self.expect_identifier()?.0),
            TokenKind::Keyword(Keyword::Continue) => StmtKind::Continue,
            TokenKind::Keyword(Keyword::Break) => StmtKind::Break,
            TokenKind::Keyword(Keyword::Return) => {
                if self.check_punct(Punct::Semicolon)? {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expr_bp(EXPR_PRIO)?))
                }
            },
            _ => return gen_internal_error(&token, line!()),
        };
        self.ensure_punct(Punct::Semicolon)?;
        Ok(Stmt::new(kind, token.pos))
    }

    /// `expr-stmt ::= expression ';'`
    fn parse_expr_stmt(&mut self) -> ParseRes<Stmt> {
        let pos = self.extract_position()?;
        let expr = self.parse_expr_bp(EXPR_PRIO)?;
        self.ensure_punct(Punct::Semicolon)?;
        Ok(Stmt::new(StmtKind::Expr(expr), pos))
    }

    // ---- expressions ----

    /// Pratt parser to evaluate expressions with operator precedence. This avoids having to create a complex
    /// nest of mutually recursive expression functions in order to properly capture operator precedence.
    ///
    /// There are multiple entry points into expressions in C: a full expression allows the comma
    /// operator, function arguments and initializers stop at assignment-expressions, and array
    /// sizes and case labels at conditional-expressions. `min_bind_prio` selects the level.
    ///
    /// See [Cppreference](https://en.cppreference.com/w/c/language/operator_precedence) for details on operator precedence.
    fn parse_expr_bp(&mut self, min_bind_prio: u8) -> ParseRes<Expr> {
        let mut lhs = self.parse_unary_expr()?;

        //Loop, building up the AST until an operator binding looser than the minimum is found
        //or end of expression is reached.
        loop {
            let token = self.peek()?.clone();
            let (l_bp, r_bp) = match infix_binding_power(&token.token_type) {
                Some(bp) => bp,
                None => break,
            };
            if l_bp > min_bind_prio {
                break;
            }
            self.advance()?;

            let pn = match token.token_type {
                TokenKind::Punct(pn) => pn,
                _ => return gen_internal_error(&token, line!()),
            };
            let pos = lhs.pos.clone();
            let kind = if pn == Punct::Question {
                let then = self.parse_expr_bp(TERNARY_MID_PRIO)?;
                self.ensure_punct(Punct::Colon)?;
                let els = self.parse_expr_bp(r_bp)?;
                ExprKind::Conditional { cond: Box::new(lhs), then: Box::new(then), els: Box::new(els) }
            } else if let Some(op) = assign_op(pn) {
                let value = self.parse_expr_bp(r_bp)?;
                ExprKind::Assign { op, target: Box::new(lhs), value: Box::new(value) }
            } else if let Some(op) = binary_op(pn) {
                let rhs = self.parse_expr_bp(r_bp)?;
                ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
            } else {
                return gen_internal_error(&token, line!());
            };
            lhs = Expr::new(kind, pos);
        }

        Ok(lhs)
    }

    /// Prefix operators, casts and `sizeof`. Their operand is parsed at [`PREFIX_PRIO`] so that
    /// only postfix operators bind tighter.
    fn parse_unary_expr(&mut self) -> ParseRes<Expr> {
        let token = self.peek()?.clone();
        match &token.token_type {
            TokenKind::Keyword(Keyword::Sizeof) => {
                self.advance()?;
                if let Some(ty) = self.try_parse_parenthesized_type()? {
                    return Ok(Expr::new(ExprKind::SizeofType(ty), token.pos));
                }
                let operand = self.parse_expr_bp(PREFIX_PRIO)?;
                Ok(Expr::new(ExprKind::SizeofExpr(Box::new(operand)), token.pos))
            },
            TokenKind::Punct(Punct::OpenParen) => {
                if let Some(ty) = self.try_parse_parenthesized_type()? {
                    let expr = self.parse_expr_bp(PREFIX_PRIO)?;
                    return Ok(Expr::new(ExprKind::Cast { ty, expr: Box::new(expr) }, token.pos));
                }
                self.parse_postfix_expr()
            },
            TokenKind::Punct(pn) => match prefix_op(*pn) {
                Some(op) => {
                    self.advance()?;
                    let operand = self.parse_expr_bp(PREFIX_PRIO)?;
                    Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, token.pos))
                },
                None => gen_expected_expression_error(&token),
            },
            _ => self.parse_postfix_expr(),
        }
    }

    /// `'(' type-name ')'`, if the parenthesis is followed by something that starts a type.
    /// Otherwise the cursor is left before the parenthesis.
    fn try_parse_parenthesized_type(&mut self) -> ParseRes<Option<Type>> {
        if !self.check_punct(Punct::OpenParen)? {
            return Ok(None);
        }
        let mark = self.tokens.mark();
        self.advance()?;
        if !self.peek()?.token_type.is_type_name_start() {
            self.tokens.reset(mark);
            return Ok(None);
        }
        self.tokens.release(mark);

        let ty = self.parse_type_name()?;
        self.ensure_punct(Punct::CloseParen)?;
        Ok(Some(ty))
    }

    /// `postfix-expr ::= primary ( '[' expression ']' | '(' arguments? ')' | ('.' | '->') identifier | '++' | '--' )*`
    fn parse_postfix_expr(&mut self) -> ParseRes<Expr> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            let token = self.peek()?.clone();
            let pos = expr.pos.clone();
            let kind = match token.token_type {
                TokenKind::Punct(Punct::OpenBoxBracket) => {
                    self.advance()?;
                    let index = self.parse_expr_bp(EXPR_PRIO)?;
                    self.ensure_punct(Punct::CloseBoxBracket)?;
                    ExprKind::Index { array: Box::new(expr), index: Box::new(index) }
                },
                TokenKind::Punct(Punct::OpenParen) => {
                    self.advance()?;
                    let args = self.parse_call_arguments()?;
                    ExprKind::Call { callee: Box::new(expr), args }
                },
                TokenKind::Punct(pn @ (Punct::Point | Punct::Arrow)) => {
                    self.advance()?;
                    let (field, _) = self.expect_identifier()?;
                    ExprKind::Member { base: Box::new(expr), field, arrow: pn == Punct::Arrow }
                },
                TokenKind::Punct(Punct::Inc) => {
                    self.advance()?;
                    ExprKind::Unary { op: UnaryOp::PostInc, operand: Box::new(expr) }
                },
                TokenKind::Punct(Punct::Dec) => {
                    self.advance()?;
                    ExprKind::Unary { op: UnaryOp::PostDec, operand: Box::new(expr) }
                },
                _ => return Ok(expr),
            };
            expr = Expr::new(kind, pos);
        }
    }

    /// Arguments of a call, after the opening parenthesis.
    fn parse_call_arguments(&mut self) -> ParseRes<Vec<Expr>> {
        let mut args = Vec::new();
        if self.consume_punct(Punct::CloseParen)? {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr_bp(ASSIGN_PRIO)?);
            if !self.consume_punct(Punct::Comma)? {
                break;
            }
        }
        let token = self.peek()?.clone();
        if token.token_type != TokenKind::Punct(Punct::CloseParen) {
            return gen_expected_one_of_error(&token, vec![TokenKind::Punct(Punct::Comma), TokenKind::Punct(Punct::CloseParen)]);
        }
        self.advance()?;
        Ok(args)
    }

    /// `primary ::= identifier | constant | string-literal+ | '(' expression ')'`
    ///
    /// Adjacent string literals are joined into one, as in `"a" "b"`.
    fn parse_primary_expr(&mut self) -> ParseRes<Expr> {
        let token = self.peek()?.clone();
        let kind = match token.token_type {
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(ref text) => match text.parse::<f64>() {
                Ok(value) => ExprKind::Float(value),
                Err(_) => return gen_internal_error(&token, line!()),
            },
            TokenKind::Char(c) => ExprKind::Char(c),
            TokenKind::Str(mut s) => {
                self.advance()?;
                while let TokenKind::Str(next) = &self.peek()?.token_type {
                    s.push_str(next);
                    self.advance()?;
                }
                return Ok(Expr::new(ExprKind::Str(s), token.pos));
            },
            TokenKind::Punct(Punct::OpenParen) => {
                self.advance()?;
                let expr = self.parse_expr_bp(EXPR_PRIO)?;
                self.ensure_punct(Punct::CloseParen)?;
                return Ok(expr);
            },
            _ => return gen_expected_expression_error(&token),
        };
        self.advance()?;
        Ok(Expr::new(kind, token.pos))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::err::Stage;

    fn parse(code: &str) -> TranslationUnit {
        Parser::new(code, None).parse().unwrap()
    }

    fn parse_err(code: &str) -> crate::err::ParseErr {
        Parser::new(code, None).parse().unwrap_err()
    }

    /// Type of the only declaration of the `n`th top-level group.
    fn decl(unit: &TranslationUnit, n: usize) -> &Declaration {
        match &unit.decls[n] {
            ExternalDecl::Declaration(group) => &group.decls[0],
            other => panic!("expected a declaration, got {:?}", other),
        }
    }

    fn int() -> Type {
        Type::named("int")
    }

    /// Parses `code` as the body of `int f(void)` and returns its statements.
    fn body(code: &str) -> Vec<Stmt> {
        let unit = parse(&format!("int f(void) {{ {} }}", code));
        match unit.decls.into_iter().next() {
            Some(ExternalDecl::Function(f)) => f.body,
            other => panic!("expected a function, got {:?}", other),
        }
    }

    fn expr_of(code: &str) -> Expr {
        match body(&format!("{};", code)).into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Expr(e)) => e,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    /// Structural shape of an expression, ignoring positions.
    fn shape(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Ident(n) => n.clone(),
            ExprKind::Int(n) => n.to_string(),
            ExprKind::Binary { op, lhs, rhs } => format!("({:?} {} {})", op, shape(lhs), shape(rhs)),
            ExprKind::Unary { op, operand } => format!("({:?} {})", op, shape(operand)),
            ExprKind::Assign { op, target, value } => format!("(= {:?} {} {})", op, shape(target), shape(value)),
            ExprKind::Conditional { cond, then, els } => format!("(? {} {} {})", shape(cond), shape(then), shape(els)),
            ExprKind::Call { callee, args } => format!("(call {} {})", shape(callee), args.iter().map(shape).collect::<Vec<_>>().join(" ")),
            ExprKind::Index { array, index } => format!("([] {} {})", shape(array), shape(index)),
            ExprKind::Member { base, field, arrow } => format!("({} {} {})", if *arrow { "->" } else { "." }, shape(base), field),
            ExprKind::Cast { ty, expr } => format!("(cast {} {})", ty, shape(expr)),
            ExprKind::SizeofType(ty) => format!("(sizeof {})", ty),
            ExprKind::SizeofExpr(e) => format!("(sizeof {})", shape(e)),
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn pointer_declarators() {
        let unit = parse("int **red; int *a[3]; int (*b)[3];");
        assert_eq!(decl(&unit, 0).ty, int().pointer_to().pointer_to());
        assert!(matches!(&decl(&unit, 1).ty, Type::Array(elem, Some(_)) if **elem == int().pointer_to()));
        assert!(matches!(&decl(&unit, 2).ty, Type::Pointer(arr) if matches!(&**arr, Type::Array(elem, Some(_)) if **elem == int())));
    }

    #[test]
    fn function_pointer_declarator() {
        let unit = parse("void (*fnct)(int x, int y, int *r, int *g, int *b);");
        let expected = Type::Function {
            returns: Box::new(Type::named("void")),
            params: vec![int(), int(), int().pointer_to(), int().pointer_to(), int().pointer_to()],
            variadic: false,
        }.pointer_to();
        assert_eq!(decl(&unit, 0).ty, expected);
        assert_eq!(decl(&unit, 0).name, "fnct");
    }

    #[test]
    fn multidimensional_arrays_nest_outward() {
        let unit = parse("char grid[2][3];");
        match &decl(&unit, 0).ty {
            Type::Array(inner, Some(two)) => {
                assert_eq!(two.kind, ExprKind::Int(2));
                assert!(matches!(&**inner, Type::Array(c, Some(three)) if **c == Type::named("char") && three.kind == ExprKind::Int(3)));
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn function_returning_function_pointer() {
        let unit = parse("int (*getop(char c))(int, int);");
        let d = decl(&unit, 0);
        assert_eq!(d.name, "getop");
        match &d.ty {
            Type::Function { returns, params, variadic: false } => {
                assert_eq!(params, &vec![Type::named("char")]);
                assert!(matches!(&**returns, Type::Pointer(f) if f.is_function()));
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn variadic_and_void_parameter_lists() {
        let unit = parse("int printf(const char *fmt, ...); int main(void); int old();");
        assert!(matches!(&decl(&unit, 0).ty, Type::Function { params, variadic: true, .. } if params.len() == 1));
        assert!(matches!(&decl(&unit, 1).ty, Type::Function { params, variadic: false, .. } if params.is_empty()));
        assert!(matches!(&decl(&unit, 2).ty, Type::Function { params, variadic: false, .. } if params.is_empty()));
    }

    #[test]
    fn typedef_makes_following_declarators_type_names() {
        let unit = parse("typedef unsigned int size_t, *ptr_size_t; const ptr_size_t pointer = 0;");
        match &unit.decls[0] {
            ExternalDecl::Declaration(group) => {
                assert_eq!(group.decls.len(), 2);
                assert_eq!(group.decls[1].ty, Type::named("unsigned int").pointer_to());
                assert!(group.decls.iter().all(|d| d.is_typedef));
            },
            other => panic!("{:?}", other),
        }
        let pointer = decl(&unit, 1);
        assert_eq!(pointer.ty, Type::named("ptr_size_t"));
        assert!(pointer.qualifiers.is_const);
        assert_eq!(pointer.init.as_ref().map(|e| &e.kind), Some(&ExprKind::Int(0)));
    }

    #[test]
    fn typedef_visible_to_next_declarator_of_same_declaration() {
        let unit = parse("typedef int T, U[sizeof(T)];");
        match &unit.decls[0] {
            ExternalDecl::Declaration(group) => match &group.decls[1].ty {
                Type::Array(_, Some(size)) => assert_eq!(size.kind, ExprKind::SizeofType(Type::named("T"))),
                other => panic!("{:?}", other),
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn local_declaration_hides_typedef() {
        let unit = parse("typedef int T; void f(void) { int T; T = 1; } T after;");
        match &unit.decls[1] {
            ExternalDecl::Function(f) => {
                assert!(matches!(&f.body[0].kind, StmtKind::Declaration(g) if g.decls[0].name == "T"));
                assert!(matches!(&f.body[1].kind, StmtKind::Expr(Expr { kind: ExprKind::Assign { .. }, .. })));
            },
            other => panic!("{:?}", other),
        }
        assert_eq!(decl(&unit, 2).ty, Type::named("T"));
    }

    #[test]
    fn block_scoped_typedef_ends_with_block() {
        let err = parse_err("void f(void) { { typedef int L; L x; } L y; }");
        assert_eq!(err.stage(), Stage::Syntactic);
        assert_eq!(err.position().col, 42);
    }

    #[test]
    fn parameter_names_hide_typedefs_in_body() {
        let unit = parse("typedef int T; int f(int T) { return T * 2; }");
        match &unit.decls[1] {
            ExternalDecl::Function(f) => {
                assert_eq!(f.params[0].name.as_deref(), Some("T"));
                match &f.body[0].kind {
                    StmtKind::Return(Some(e)) => assert_eq!(shape(e), "(Mult T 2)"),
                    other => panic!("{:?}", other),
                }
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn struct_definitions() {
        let unit = parse("struct point { int x, y; struct point *next; }; struct point origin;");
        match &unit.decls[0] {
            ExternalDecl::Declaration(group) => {
                assert!(group.decls.is_empty());
                match &group.base {
                    Type::Record { kind: RecordKind::Struct, tag: Some(tag), fields: Some(fields) } => {
                        assert_eq!(tag, "point");
                        let names = fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
                        assert_eq!(names, vec!["x", "y", "next"]);
                        assert!(matches!(&fields[2].ty, Type::Pointer(r) if matches!(&**r, Type::Record { fields: None, .. })));
                    },
                    other => panic!("{:?}", other),
                }
            },
            other => panic!("{:?}", other),
        }
        assert!(matches!(&decl(&unit, 1).ty, Type::Record { fields: None, .. }));
    }

    #[test]
    fn enums_declare_constants() {
        let unit = parse("enum color { RED, GREEN = 4, BLUE, }; int c = GREEN;");
        match &unit.decls[0] {
            ExternalDecl::Declaration(DeclGroup { base: Type::Enum { tag, enumerators: Some(e) }, .. }) => {
                assert_eq!(tag.as_deref(), Some("color"));
                assert_eq!(e.len(), 3);
                assert_eq!(e[1].value.as_ref().map(|v| &v.kind), Some(&ExprKind::Int(4)));
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn unions_and_anonymous_structs() {
        let unit = parse("typedef union { int i; char c[4]; } word; typedef struct { word w; } holder;");
        assert!(matches!(&decl(&unit, 0).ty, Type::Record { kind: RecordKind::Union, tag: None, fields: Some(f) } if f.len() == 2));
        let word = Type::named("word");
        assert!(matches!(unit.resolve_type(&word), Type::Record { kind: RecordKind::Union, .. }));
    }

    #[test]
    fn bitfields_are_rejected() {
        let err = parse_err("struct flags { int a : 1; };");
        assert_eq!(err.stage(), Stage::Syntactic);
        assert!(matches!(err.message(), ParseErrMsg::ExpectedOneOfSymbols { found: TokenKind::Punct(Punct::Colon), .. }));
    }

    #[test]
    fn specifier_errors() {
        assert!(matches!(parse_err("static extern int x;").message(), ParseErrMsg::DuplicateStorageClass(Keyword::Extern)));
        assert!(matches!(parse_err("int struct s x;").message(), ParseErrMsg::InvalidTypeSpecifier(_)));
        assert!(matches!(parse_err("signed unsigned x;").message(), ParseErrMsg::InvalidTypeSpecifier(_)));
        assert!(matches!(parse_err("x = 3;").message(), ParseErrMsg::ExpectedTypeSpecifier(_)));
        assert!(matches!(parse_err("int ;;").message(), ParseErrMsg::ExpectedTypeSpecifier(_)));
        assert!(matches!(parse_err("int 3;").message(), ParseErrMsg::ExpectedDeclarator(TokenKind::Int(3))));
        assert!(matches!(parse_err("typedef int f(void) { return 0; }").message(), ParseErrMsg::InvalidFunctionDefinition(_)));
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(shape(&expr_of("a + b * c - d")), "(Sub (Add a (Mult b c)) d)");
        assert_eq!(shape(&expr_of("a = b = c")), "(= None a (= None b c))");
        assert_eq!(shape(&expr_of("a += b << 2")), "(= Some(Add) a (Shl b 2))");
        assert_eq!(shape(&expr_of("n==0||n==1?1: n * fibo(n-1)")), "(? (LOr (Eq n 0) (Eq n 1)) 1 (Mult n (call fibo (Sub n 1))))");
        assert_eq!(shape(&expr_of("a ? b : c ? d : e")), "(? a b (? c d e))");
        assert_eq!(shape(&expr_of("a, b = c")), "(Comma a (= None b c))");
        assert_eq!(shape(&expr_of("a & b == c")), "(BAnd a (Eq b c))");
        assert_eq!(shape(&expr_of("x || y && z")), "(LOr x (LAnd y z))");
    }

    #[test]
    fn unary_and_postfix() {
        assert_eq!(shape(&expr_of("*p++")), "(Deref (PostInc p))");
        assert_eq!(shape(&expr_of("-a * b")), "(Mult (Neg a) b)");
        assert_eq!(shape(&expr_of("!f(x, y)[2]")), "(LNot ([] (call f x y) 2))");
        assert_eq!(shape(&expr_of("image->red[offset]")), "([] (-> image red) offset)");
        assert_eq!(shape(&expr_of("&img.w")), "(Addr (. img w))");
        assert_eq!(shape(&expr_of("sizeof x + 1")), "(Add (sizeof x) 1)");
        assert_eq!(shape(&expr_of("++*p")), "(PreInc (Deref p))");
    }

    #[test]
    fn casts_and_sizeof() {
        let unit = parse("typedef int T; void f(void) { x = (T *) p + sizeof(struct s *) + sizeof (y) + (z); }");
        let f = unit.functions().next().unwrap();
        match &f.body[0].kind {
            StmtKind::Expr(e) => assert_eq!(shape(e),
                "(= None x (Add (Add (Add (cast pointer to T p) (sizeof pointer to struct s)) (sizeof y)) z))"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn control_flow_statements() {
        let stmts = body("
            if (a) b = 1; else { b = 2; }
            while (b) b--;
            do { b++; } while (b < 10);
            for (;;) break;
            for (i = 0; i < 3; i++) continue;
            switch (b) { case 1: case 2 + 1: b = 0; break; default: ; }
            again: goto again;
            return;
        ");
        let kinds = stmts.iter().map(|s| match &s.kind {
            StmtKind::If { els: Some(_), .. } => "if-else",
            StmtKind::While { .. } => "while",
            StmtKind::DoWhile { .. } => "do",
            StmtKind::For { init: None, cond: None, step: None, .. } => "for-empty",
            StmtKind::For { init: Some(ForInit::Expr(_)), .. } => "for-expr",
            StmtKind::Switch { .. } => "switch",
            StmtKind::Label { .. } => "label",
            StmtKind::Return(None) => "return",
            _ => "other",
        }).collect::<Vec<_>>();
        assert_eq!(kinds, vec!["if-else", "while", "do", "for-empty", "for-expr", "switch", "label", "return"]);
    }

    #[test]
    fn for_declarations_are_scoped_to_the_loop() {
        let unit = parse("typedef int T; void f(void) { for (int T = 0; T < 3; T++) ; T x; }");
        let f = unit.functions().next().unwrap();
        match &f.body[0].kind {
            StmtKind::For { init: Some(ForInit::Decl(g)), cond: Some(cond), .. } => {
                assert_eq!(g.decls[0].name, "T");
                assert_eq!(shape(cond), "(Lt T 3)");
            },
            other => panic!("{:?}", other),
        }
        match &f.body[1].kind {
            StmtKind::Declaration(g) => assert_eq!(g.decls[0].ty, Type::named("T")),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn lookahead_past_a_scope_end_sees_the_outer_typedef() {
        let unit = parse("typedef int T; void f(void) { for (int T = 0; T < 3; T++) if (T) ; T x; }");
        let f = unit.functions().next().unwrap();
        assert!(matches!(&f.body[0].kind, StmtKind::For { body, .. } if matches!(body.kind, StmtKind::If { els: None, .. })));
        match &f.body[1].kind {
            StmtKind::Declaration(g) => assert_eq!((g.decls[0].name.as_str(), &g.decls[0].ty), ("x", &Type::named("T"))),
            other => panic!("{:?}", other),
        }

        let unit = parse("typedef int T; void f(void) { for (int T = 0; T; ) for (;;) if (T) ; T * y; }");
        let f = unit.functions().next().unwrap();
        assert!(matches!(&f.body[1].kind, StmtKind::Declaration(g) if g.decls[0].ty == Type::named("T").pointer_to()));
    }

    #[test]
    fn enumerators_in_struct_bodies_outlive_the_struct() {
        let unit = parse("typedef int A; struct s { enum { A, B } e; }; void f(void) { A = B; }");
        let f = unit.functions().next().unwrap();
        match &f.body[0].kind {
            StmtKind::Expr(e) => assert_eq!(shape(e), "(= None A B)"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn literal_initializers() {
        let unit = parse("double d = 1.5; int m = 010; char *s = \"a\" \"b\"; unsigned long big = 0xFFFFFFFFFFFFFFFFu;");
        let init = |n| decl(&unit, n).init.as_ref().map(|e| e.kind.clone());
        assert_eq!(init(0), Some(ExprKind::Float(1.5)));
        assert_eq!(init(1), Some(ExprKind::Int(8)));
        assert_eq!(init(2), Some(ExprKind::Str("ab".to_string())));
        assert_eq!(init(3), Some(ExprKind::Int(u64::MAX)));
        match expr_of("f(\"x\" \"y\", .5e1)").kind {
            ExprKind::Call { args, .. } => {
                assert_eq!(args[0].kind, ExprKind::Str("xy".to_string()));
                assert_eq!(args[1].kind, ExprKind::Float(5.0));
                assert_eq!(args[1].pos.col, 26);
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn initializer_lists() {
        let unit = parse("int arr[] = {1, 2, {3, 4}, };");
        match &decl(&unit, 0).init {
            Some(Expr { kind: ExprKind::InitList(items), .. }) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[2].kind, ExprKind::InitList(inner) if inner.len() == 2));
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn syntax_errors_carry_expected_and_found() {
        let err = parse_err("int main(void) { return 0 }");
        assert_eq!(err.stage(), Stage::Syntactic);
        assert_eq!(err.message(), &ParseErrMsg::ExpectedSymbol {
            expected: TokenKind::Punct(Punct::Semicolon),
            found: TokenKind::Punct(Punct::CloseBrace),
        });
        assert_eq!((err.position().line, err.position().col), (1, 27));

        assert!(matches!(parse_err("int f(void) { x = ; }").message(), ParseErrMsg::ExpectedExpression(_)));
        assert!(matches!(parse_err("int f(void) { x = 1;").message(), ParseErrMsg::ExpectedSymbol { found: TokenKind::EOF, .. }));
    }

    #[test]
    fn popping_the_file_scope_is_internal() {
        let mut parser = Parser::new("", None);
        let err = parser.pop_scope(&TextPosition::start(None)).unwrap_err();
        assert_eq!(err.stage(), Stage::Internal);
        assert!(matches!(err.message(), ParseErrMsg::InternalError(_)));
        assert_eq!(parser.symbols().depth(), 1);
    }

    #[test]
    fn scopes_are_balanced_after_a_parse() {
        let mut parser = Parser::new("typedef int T; int f(T a, T (*cb)(T)) { for (;;) { { } } return a; }", None);
        let unit = parser.parse_translation_unit().unwrap();
        assert_eq!(unit.decls.len(), 2);
        assert_eq!(parser.symbols().depth(), 1);
        assert!(parser.symbols().is_type_name("T"));
    }
}
