//! Abstract Syntax Tree types
//!
//! The tree the inference engine consumes. Every expression, function,
//! lambda and class carries a process-unique [`AstId`] which the engine
//! uses as the interning key of the values it creates there.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_AST_ID: AtomicU32 = AtomicU32::new(1);

/// Unique identifier of an AST construction site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AstId(pub u32);

impl AstId {
    /// Allocate a fresh id
    #[inline]
    pub fn fresh() -> Self {
        AstId(NEXT_AST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A parsed module
#[derive(Debug, Clone)]
pub struct Module {
    /// Fully qualified module name
    pub name: String,
    /// File the module was read from
    pub path: Option<PathBuf>,
    /// Whether the module came from a `.pyi` stub
    pub is_stub: bool,
    pub body: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// Statement kind
#[derive(Debug, Clone)]
pub enum StmtKind {
    FunctionDef(FuncDef),
    ClassDef(ClassDef),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    TryExcept {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
    },
    TryFinally {
        body: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    /// `raise [type [, value [, traceback]]]`
    Raise {
        expt: Option<Expr>,
        arg: Option<Expr>,
        traceback: Option<Expr>,
    },
    Import(Vec<ImportAlias>),
    /// `from module import names`; an empty `names` means `*`
    ImportFrom {
        module: String,
        names: Vec<ImportAlias>,
        level: usize,
    },
    Print {
        dest: Option<Expr>,
        values: Vec<Expr>,
    },
    /// `t1 = t2 = value`
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Pass,
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Global(Vec<String>),
    Exec {
        code: Expr,
        globals: Option<Expr>,
        locals: Option<Expr>,
    },
    Delete(Vec<Expr>),
    With {
        context: Expr,
        target: Option<Expr>,
        body: Vec<Stmt>,
    },
    Expr(Expr),
}

/// Parameter list shared by `def` and `lambda`
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub params: Vec<Param>,
    /// Defaults for the trailing positional parameters
    pub defaults: Vec<Expr>,
    pub vararg: Option<String>,
    pub kwarg: Option<String>,
}

/// Positional parameter, possibly a destructured tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Name(String),
    Tuple(Vec<Param>),
}

impl Param {
    /// Collect every bound name
    pub fn names(
        &self,
        out: &mut Vec<String>,
    ) {
        match self {
            Param::Name(n) => out.push(n.clone()),
            Param::Tuple(ps) => ps.iter().for_each(|p| p.names(out)),
        }
    }

    /// Display form used in reports and arity messages
    pub fn display(&self) -> String {
        match self {
            Param::Name(n) => n.clone(),
            Param::Tuple(ps) => format!(
                "({})",
                ps.iter().map(|p| p.display()).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

/// `def` statement
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub id: AstId,
    pub name: String,
    pub args: Arguments,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub line: usize,
}

/// `class` statement
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub id: AstId,
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub line: usize,
}

/// One `except` clause
#[derive(Debug, Clone)]
pub struct ExceptHandler {
    /// `None` for a bare `except:`
    pub class: Option<Expr>,
    pub target: Option<Expr>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// `name [as asname]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias {
    pub name: String,
    pub asname: Option<String>,
}

/// Expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: AstId,
    pub kind: ExprKind,
    pub line: usize,
}

impl Expr {
    pub fn new(
        kind: ExprKind,
        line: usize,
    ) -> Self {
        Self {
            id: AstId::fresh(),
            kind,
            line,
        }
    }

    /// Integer value if this is an integer literal (including a negated one)
    pub fn const_int(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Const(Constant::Int(n)) => Some(*n),
            ExprKind::UnaryOp {
                op: UnaryOp::Neg,
                operand,
            } => operand.const_int().map(|n| -n),
            _ => None,
        }
    }
}

/// Literal constant
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Long(String),
    Float(f64),
    Complex(f64),
    Str(String),
    Unicode(String),
}

/// Expression kind
#[derive(Debug, Clone)]
pub enum ExprKind {
    Name(String),
    Const(Constant),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
        star: Option<Box<Expr>>,
        dstar: Option<Box<Expr>>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    /// `value[index]`, including extended slices (`index` is a `SliceObj`)
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// Simple slice `value[lower:upper]`
    Slice {
        value: Box<Expr>,
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
    },
    /// `lower:upper:step` inside a subscript
    SliceObj {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Set(Vec<Expr>),
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Lambda {
        args: Box<Arguments>,
        body: Box<Expr>,
    },
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Backquote(Box<Expr>),
    Yield(Option<Box<Expr>>),
}

/// `for target in iter if cond...`
#[derive(Debug, Clone)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinOp {
    /// Source spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        }
    }

    /// Parse the spelling carried by an augmented assignment token
    pub fn from_symbol(symbol: &str) -> Option<BinOp> {
        Some(match symbol {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "//" => BinOp::FloorDiv,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            "<<" => BinOp::LShift,
            ">>" => BinOp::RShift,
            "&" => BinOp::BitAnd,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            _ => return None,
        })
    }

    /// Special method names (`__add__`, `__radd__`)
    pub fn dunders(&self) -> (&'static str, &'static str) {
        match self {
            BinOp::Add => ("__add__", "__radd__"),
            BinOp::Sub => ("__sub__", "__rsub__"),
            BinOp::Mul => ("__mul__", "__rmul__"),
            BinOp::Div => ("__div__", "__rdiv__"),
            BinOp::FloorDiv => ("__floordiv__", "__rfloordiv__"),
            BinOp::Mod => ("__mod__", "__rmod__"),
            BinOp::Pow => ("__pow__", "__rpow__"),
            BinOp::LShift => ("__lshift__", "__rlshift__"),
            BinOp::RShift => ("__rshift__", "__rrshift__"),
            BinOp::BitAnd => ("__and__", "__rand__"),
            BinOp::BitOr => ("__or__", "__ror__"),
            BinOp::BitXor => ("__xor__", "__rxor__"),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

impl UnaryOp {
    /// Special method name, if the operator dispatches to one
    pub fn dunder(&self) -> Option<&'static str> {
        match self {
            UnaryOp::Neg => Some("__neg__"),
            UnaryOp::Pos => Some("__pos__"),
            UnaryOp::Invert => Some("__invert__"),
            UnaryOp::Not => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
        }
    }
}
