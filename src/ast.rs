use crate::utils::TextPosition;
use std::collections::HashMap;
use std::fmt;

/// Root of the tree: every top-level construct of one source file, in source order.
///
/// The tree owns all of its nodes; nothing in it refers back into the parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationUnit {
    pub decls: Vec<ExternalDecl>,
}

impl TranslationUnit {
    /// Typedef names declared at file scope, mapped to the type they alias. A later typedef of
    /// the same name replaces an earlier one.
    pub fn typedefs(&self) -> HashMap<&str, &Type> {
        let mut map = HashMap::new();
        for ext in &self.decls {
            if let ExternalDecl::Declaration(group) = ext {
                for decl in group.decls.iter().filter(|d| d.is_typedef) {
                    map.insert(decl.name.as_str(), &decl.ty);
                }
            }
        }
        map
    }

    /// Follow typedef names through file-scope typedefs until reaching a type that isn't one.
    /// Builtin names and unknown names come back unchanged. Typedefs declared inside a function
    /// are not seen here; use [`TranslationUnit::resolve_type_in`] for those.
    pub fn resolve_type<'a>(&'a self, ty: &'a Type) -> &'a Type {
        follow_typedefs(ty, &[self.typedefs()])
    }

    /// Like [`TranslationUnit::resolve_type`], but typedefs declared directly in `block` (a
    /// function body or the statements of a compound statement) hide file-scope ones.
    /// Typedefs of nested blocks inside `block` are not consulted.
    pub fn resolve_type_in<'a>(&'a self, ty: &'a Type, block: &'a [Stmt]) -> &'a Type {
        let mut local = HashMap::new();
        for stmt in block {
            if let StmtKind::Declaration(group) = &stmt.kind {
                for decl in group.decls.iter().filter(|d| d.is_typedef) {
                    local.insert(decl.name.as_str(), &decl.ty);
                }
            }
        }
        follow_typedefs(ty, &[local, self.typedefs()])
    }

    /// Function definitions, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.decls.iter().filter_map(|ext| match ext {
            ExternalDecl::Function(f) => Some(f),
            _ => None,
        })
    }
}

/// Walk a `Named` chain through `scopes`, innermost first.
fn follow_typedefs<'a>(ty: &'a Type, scopes: &[HashMap<&'a str, &'a Type>]) -> &'a Type {
    let limit: usize = scopes.iter().map(|s| s.len()).sum();
    let mut ty = ty;
    //bounded, so that `typedef T T;` can't loop forever
    for _ in 0..=limit {
        let name = match ty {
            Type::Named(name) => name.as_str(),
            _ => break,
        };
        match scopes.iter().find_map(|scope| scope.get(name)) {
            Some(aliased) => ty = *aliased,
            None => break,
        }
    }
    ty
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDecl {
    Declaration(DeclGroup),
    Function(FunctionDef),
}

impl ExternalDecl {
    pub fn pos(&self) -> &TextPosition {
        match self {
            ExternalDecl::Declaration(group) => &group.pos,
            ExternalDecl::Function(func) => &func.pos,
        }
    }
}

/// Everything up to one `;`: the shared specifiers and the declarators hanging off them.
///
/// `struct point { int x; };` is a group with no declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclGroup {
    pub base: Type,
    pub decls: Vec<Declaration>,
    pub pos: TextPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub ty: Type,
    pub init: Option<Expr>,
    pub is_typedef: bool,
    pub storage: Option<StorageClass>,
    pub qualifiers: Qualifiers,
    pub pos: TextPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// Always a `Type::Function`.
    pub ty: Type,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub storage: Option<StorageClass>,
    pub pos: TextPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// `None` for abstract parameters such as the `int` in `void f(int)`.
    pub name: Option<String>,
    pub ty: Type,
    pub pos: TextPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Extern,
    Static,
    Auto,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A builtin type such as `"unsigned long"`, or a typedef name.
    Named(String),
    Pointer(Box<Type>),
    /// Element type and size expression; `int a[]` has no size.
    Array(Box<Type>, Option<Box<Expr>>),
    Function {
        returns: Box<Type>,
        params: Vec<Type>,
        variadic: bool,
    },
    /// `fields` is `None` when only the tag is referenced, as in `struct _image *next`.
    Record {
        kind: RecordKind,
        tag: Option<String>,
        fields: Option<Vec<Field>>,
    },
    Enum {
        tag: Option<String>,
        enumerators: Option<Vec<Enumerator>>,
    },
}

impl Type {
    pub fn named(name: &str) -> Self {
        Type::Named(name.to_string())
    }

    pub fn pointer_to(self) -> Self {
        Type::Pointer(Box::new(self))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{}", name),
            Type::Pointer(inner) => write!(f, "pointer to {}", inner),
            Type::Array(inner, Some(_)) => write!(f, "array of {}", inner),
            Type::Array(inner, None) => write!(f, "array of unknown size of {}", inner),
            Type::Function { returns, params, variadic } => {
                write!(f, "function(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                if *variadic {
                    write!(f, "{}...", if params.is_empty() { "" } else { ", " })?;
                }
                write!(f, ") returning {}", returns)
            },
            Type::Record { kind, tag, .. } => {
                let kw = match kind {
                    RecordKind::Struct => "struct",
                    RecordKind::Union => "union",
                };
                write!(f, "{} {}", kw, tag.as_deref().unwrap_or("<anonymous>"))
            },
            Type::Enum { tag, .. } => write!(f, "enum {}", tag.as_deref().unwrap_or("<anonymous>")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: TextPosition,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: TextPosition) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Declaration(DeclGroup),
    Expr(Expr),
    If { cond: Expr, then: Box<Stmt>, els: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Expr },
    For { init: Option<ForInit>, cond: Option<Expr>, step: Option<Expr>, body: Box<Stmt> },
    Switch { cond: Expr, body: Box<Stmt> },
    Case { value: Expr, body: Box<Stmt> },
    Default(Box<Stmt>),
    Label { name: String, body: Box<Stmt> },
    Goto(String),
    Break,
    Continue,
    Return(Option<Expr>),
    /// A lone `;`.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Decl(DeclGroup),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: TextPosition,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: TextPosition) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Int(u64),
    Float(f64),
    /// Literal text between the quotes, escapes left as written.
    Char(String),
    /// Adjacent literals already joined.
    Str(String),
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Index { array: Box<Expr>, index: Box<Expr> },
    Member { base: Box<Expr>, field: String, arrow: bool },
    /// `op` is the arithmetic part of a compound assignment: `a += b` has `Some(Add)`.
    Assign { op: Option<BinaryOp>, target: Box<Expr>, value: Box<Expr> },
    Conditional { cond: Box<Expr>, then: Box<Expr>, els: Box<Expr> },
    Cast { ty: Type, expr: Box<Expr> },
    SizeofType(Type),
    SizeofExpr(Box<Expr>),
    /// Brace-enclosed initializer, only valid as the initial value of a declaration.
    InitList(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Deref,
    Addr,
    Neg,
    Plus,
    LNot, //logical not
    BNot, //bitwise not
    PreInc, //++a
    PreDec, //--a
    PostInc, //a++
    PostDec, //a--
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BAnd,
    BXor,
    BOr,
    LAnd,
    LOr,
    Comma,
}
