use thiserror::Error;

use crate::ast::{BinaryOp, OutputFormat, UnaryOp};
use crate::diagnostic::{Diagnostic, Label, Position};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("not a function: {0}")]
    NotAFunction(&'static str),
    #[error("wrong number of arguments: expected {expected}, got {got}")]
    WrongArgumentCount { expected: usize, got: usize },
    #[error("unknown operator: {op}{operand}")]
    UnknownPrefixOperator { op: UnaryOp, operand: &'static str },
    #[error("unknown operator: {left} {op} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        op: BinaryOp,
        right: &'static str,
    },
    #[error("type mismatch: {left} {op} {right}")]
    TypeMismatch {
        left: &'static str,
        op: BinaryOp,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot iterate over {0}")]
    NotIterable(&'static str),
    #[error("index out of bounds: {index} (length: {length})")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("index operator not supported: {left}[{index}]")]
    IndexNotSupported {
        left: &'static str,
        index: &'static str,
    },
    #[error("member access not supported: {target}.{member}")]
    MemberNotSupported { target: &'static str, member: String },
    #[error("cannot format {type_name} as {format}")]
    FormatNotSupported {
        type_name: &'static str,
        format: OutputFormat,
    },
    #[error("maximum call depth exceeded ({0})")]
    CallDepthExceeded(usize),
    /// Failure reported by a builtin function.
    #[error("{0}")]
    Builtin(String),
}

impl ErrorKind {
    fn code(&self) -> &'static str {
        match self {
            ErrorKind::UndefinedVariable(_) => "E0201",
            ErrorKind::NotAFunction(_) => "E0202",
            ErrorKind::WrongArgumentCount { .. } => "E0203",
            ErrorKind::UnknownPrefixOperator { .. } | ErrorKind::UnknownInfixOperator { .. } => "E0204",
            ErrorKind::TypeMismatch { .. } => "E0205",
            ErrorKind::DivisionByZero => "E0206",
            ErrorKind::NotIterable(_) => "E0207",
            ErrorKind::IndexOutOfBounds { .. } | ErrorKind::IndexNotSupported { .. } => "E0208",
            ErrorKind::MemberNotSupported { .. } => "E0209",
            ErrorKind::FormatNotSupported { .. } => "E0210",
            ErrorKind::Builtin(_) => "E0211",
            ErrorKind::CallDepthExceeded(_) => "E0212",
        }
    }
}

/// A runtime failure. Evaluation stops at the first one; there is no way to
/// catch it from inside a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error at {position}: {kind}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub position: Position,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// Error raised inside a builtin; the evaluator fills in the call position.
    pub fn builtin(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Builtin(message.into()),
            position: Position::unknown(),
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Supplies a position if the error does not carry one yet.
    pub fn or_at(mut self, position: Position) -> Self {
        if self.position.is_unknown() {
            self.position = position;
        }
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.message())
            .with_code(self.kind.code())
            .with_label(Label::primary(self.position, ""));

        match &self.kind {
            ErrorKind::UndefinedVariable(name) => {
                diag.with_help(format!("assign `{}` before using it", name))
            }
            ErrorKind::IndexOutOfBounds { length, .. } if *length > 0 => {
                diag.with_note(format!("valid indices are -{} through {}", length, length - 1))
            }
            ErrorKind::TypeMismatch { .. } => diag.with_note("operands must have the same type"),
            ErrorKind::CallDepthExceeded(_) => diag.with_help("check that the recursion reaches a base case"),
            _ => diag,
        }
    }
}
