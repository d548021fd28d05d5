pub mod ast;
pub mod cli;
pub mod config;
pub mod convert;
pub mod diagnostic;
pub mod format;
pub mod interpreter;
pub mod lexer;
pub mod stack;
pub mod token;
pub mod value;

pub use ast::{Expr, ExprKind, Program, Stmt, StmtKind};
pub use interpreter::{parse, parse_and_run, Environment, Interpreter, ParseError, RunError, RuntimeError};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
pub use value::Value;
