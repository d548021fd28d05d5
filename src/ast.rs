use std::fmt;
use std::rc::Rc;

use crate::diagnostic::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("!"),
            UnaryOp::Neg => f.write_str("-"),
        }
    }
}

/// Output format requested by `| format ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Table,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(OutputFormat::Csv),
            "table" => Some(OutputFormat::Table),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("csv"),
            OutputFormat::Table => f.write_str("table"),
        }
    }
}

/// A call argument, optionally named (`region: "us-east-1"`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Rc<str>>,
    pub value: Expr,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: Rc<str>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(Rc<str>),
    /// Integer and float literals keep their source text for rendering.
    Integer { value: i64, literal: Rc<str> },
    Float { value: f64, literal: Rc<str> },
    String(Rc<str>),
    Boolean(bool),
    Null,
    Prefix {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: Rc<str>,
    },
    Pipe {
        left: Box<Expr>,
        format: OutputFormat,
    },
    List(Vec<Expr>),
    Object(Vec<ObjectEntry>),
    Grouped(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self { kind, position }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::Integer { literal, .. } | ExprKind::Float { literal, .. } => write!(f, "{}", literal),
            ExprKind::String(value) => write!(f, "\"{}\"", value),
            ExprKind::Boolean(value) => write!(f, "{}", value),
            ExprKind::Null => write!(f, "null"),
            ExprKind::Prefix { op, operand } => write!(f, "({}{})", op, operand),
            ExprKind::Infix { left, op, right } => write!(f, "({} {} {})", left, op, right),
            ExprKind::Call { callee, args } => write!(f, "{}({})", callee, join(args)),
            ExprKind::Index { left, index } => write!(f, "({}[{}])", left, index),
            ExprKind::Member { object, member } => write!(f, "({}.{})", object, member),
            ExprKind::Pipe { left, format } => write!(f, "({} | format {})", left, format),
            ExprKind::List(elements) => write!(f, "[{}]", join(elements)),
            ExprKind::Object(entries) => {
                let pairs: Vec<String> = entries.iter().map(|e| format!("{}: {}", e.key, e.value)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            ExprKind::Grouped(inner) => write!(f, "({})", inner),
        }
    }
}

/// Setting recorded by a context statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Profile,
    Region,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Profile => f.write_str("profile"),
            ContextKind::Region => f.write_str("region"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub position: Position,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expr),
    Assignment {
        name: Rc<str>,
        value: Expr,
    },
    Context {
        kind: ContextKind,
        value: Rc<str>,
    },
    Block(Block),
    If {
        condition: Expr,
        consequence: Block,
        alternative: Option<Block>,
    },
    For {
        variable: Rc<str>,
        iterable: Expr,
        body: Block,
    },
    Return(Option<Expr>),
    /// Function bodies are shared so closures outlive the program that declared them.
    Function {
        name: Rc<str>,
        params: Vec<Rc<str>>,
        body: Rc<Block>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Expression(expr) => write!(f, "{}", expr),
            StmtKind::Assignment { name, value } => write!(f, "{} = {};", name, value),
            StmtKind::Context { kind, value } => write!(f, "{} \"{}\";", kind, value),
            StmtKind::Block(block) => write!(f, "{}", block),
            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            StmtKind::For { variable, iterable, body } => write!(f, "for ({} in {}) {}", variable, iterable, body),
            StmtKind::Return(Some(value)) => write!(f, "return {};", value),
            StmtKind::Return(None) => write!(f, "return;"),
            StmtKind::Function { name, params, body } => write!(f, "fn {}({}) {}", name, params.join(", "), body),
        }
    }
}

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
