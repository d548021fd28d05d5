use std::rc::Rc;

use thiserror::Error;

use crate::ast::{
    Argument, BinaryOp, Block, ContextKind, Expr, ExprKind, ObjectEntry, OutputFormat, Program, Stmt, StmtKind,
    UnaryOp,
};
use crate::diagnostic::{Diagnostic, Label, Position};
use crate::lexer::{is_unterminated_string, Lexer};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenKind};

/// Parsing stops collecting errors (and statements) once this many are recorded.
pub const MAX_ERRORS: usize = 20;

/// Deepest nesting of expressions and blocks accepted before parsing fails.
pub const MAX_NESTING_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::primary(self.position, ""));

        if self.message == "unterminated string literal" {
            diag = diag.with_help("close the string with `\"`");
        } else if self.message.starts_with("expected ;") {
            diag = diag.with_help("statements end with `;`");
        }

        diag
    }
}

/// Recursive-descent parser over a pull lexer with one token of lookahead.
///
/// Productions return `None` after recording their error; statement-level
/// productions then call [`Parser::synchronize`] so parsing can resume at the
/// next statement boundary.
pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<ParseError>,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    fn at_error_limit(&self) -> bool {
        self.errors.len() >= MAX_ERRORS
    }

    fn add_error(&mut self, message: String, position: Position) {
        if self.at_error_limit() {
            return;
        }
        self.errors.push(ParseError::new(message, position));
    }

    fn cur_error(&mut self, message: String) {
        let position = self.cur.position();
        self.add_error(message, position);
    }

    /// Advances onto the peek token if it has the given kind; records an error otherwise.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next_token();
            return Some(());
        }
        let message = format!("expected {}, got {}", kind, self.peek.kind);
        let position = self.peek.position();
        self.add_error(message, position);
        None
    }

    /// Skips to the next statement boundary. A statement keyword other than
    /// the one at `start` is a boundary itself and is not consumed.
    fn synchronize(&mut self, start: Position) {
        while !self.cur_is(TokenKind::Eof) {
            if self.cur_is(TokenKind::Semicolon) {
                self.next_token();
                return;
            }
            if self.cur.kind.starts_statement() && self.cur.position() != start {
                return;
            }
            if self.peek.kind.starts_statement() {
                self.next_token();
                return;
            }
            self.next_token();
        }
    }

    /// Runs a statement production, resynchronizing when it fails.
    fn recovering<T>(&mut self, production: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.cur.position();
        let result = production(self);
        if result.is_none() {
            self.synchronize(start);
        }
        result
    }

    /// Runs a production one nesting level deeper, failing once the limit is hit.
    fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.cur_error(format!("nesting exceeds {} levels", MAX_NESTING_DEPTH));
            return None;
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| production(self));
        self.depth -= 1;
        result
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.cur_is(TokenKind::Eof) {
            if self.at_error_limit() {
                break;
            }
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
        }

        tracing::debug!(
            statements = program.statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        program
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Profile | TokenKind::Region => self.parse_context_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::Ident if self.peek_is(TokenKind::Assign) => self.parse_assignment_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_context_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();
        let kind = if self.cur_is(TokenKind::Profile) {
            ContextKind::Profile
        } else {
            ContextKind::Region
        };

        self.recovering(|p| {
            p.expect_peek(TokenKind::String)?;
            let value: Rc<str> = Rc::from(p.cur.literal.as_str());
            p.expect_peek(TokenKind::Semicolon)?;
            p.next_token();
            Some(Stmt::new(StmtKind::Context { kind, value }, position))
        })
    }

    fn parse_assignment_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();
        let name: Rc<str> = Rc::from(self.cur.literal.as_str());

        self.recovering(|p| {
            p.expect_peek(TokenKind::Assign)?;
            p.next_token();
            let value = p.parse_expression()?;
            p.expect_peek(TokenKind::Semicolon)?;
            p.next_token();
            Some(Stmt::new(StmtKind::Assignment { name, value }, position))
        })
    }

    fn parse_if_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();

        let condition = self.recovering(|p| {
            p.expect_peek(TokenKind::LParen)?;
            p.next_token();
            let condition = p.parse_expression()?;
            p.expect_peek(TokenKind::RParen)?;
            p.expect_peek(TokenKind::LBrace)?;
            Some(condition)
        })?;

        let consequence = self.parse_block()?;

        let alternative = if self.cur_is(TokenKind::Else) {
            self.recovering(|p| p.expect_peek(TokenKind::LBrace))?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Stmt::new(
            StmtKind::If {
                condition,
                consequence,
                alternative,
            },
            position,
        ))
    }

    fn parse_for_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();

        let (variable, iterable) = self.recovering(|p| {
            p.expect_peek(TokenKind::LParen)?;
            p.expect_peek(TokenKind::Ident)?;
            let variable: Rc<str> = Rc::from(p.cur.literal.as_str());
            p.expect_peek(TokenKind::In)?;
            p.next_token();
            let iterable = p.parse_expression()?;
            p.expect_peek(TokenKind::RParen)?;
            p.expect_peek(TokenKind::LBrace)?;
            Some((variable, iterable))
        })?;

        let body = self.parse_block()?;
        Some(Stmt::new(StmtKind::For { variable, iterable, body }, position))
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();
        self.next_token();

        if self.cur_is(TokenKind::Semicolon) {
            self.next_token();
            return Some(Stmt::new(StmtKind::Return(None), position));
        }

        self.recovering(|p| {
            let value = p.parse_expression()?;
            p.expect_peek(TokenKind::Semicolon)?;
            p.next_token();
            Some(Stmt::new(StmtKind::Return(Some(value)), position))
        })
    }

    fn parse_function_declaration(&mut self) -> Option<Stmt> {
        let position = self.cur.position();

        let (name, params) = self.recovering(|p| {
            p.expect_peek(TokenKind::Ident)?;
            let name: Rc<str> = Rc::from(p.cur.literal.as_str());
            p.expect_peek(TokenKind::LParen)?;
            let params = p.parse_parameter_list()?;
            p.expect_peek(TokenKind::RParen)?;
            p.expect_peek(TokenKind::LBrace)?;
            Some((name, params))
        })?;

        let body = Rc::new(self.parse_block()?);
        Some(Stmt::new(StmtKind::Function { name, params, body }, position))
    }

    fn parse_parameter_list(&mut self) -> Option<Vec<Rc<str>>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            return Some(params);
        }
        self.expect_peek(TokenKind::Ident)?;
        params.push(Rc::from(self.cur.literal.as_str()));

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            params.push(Rc::from(self.cur.literal.as_str()));
        }
        Some(params)
    }

    /// Parses `{ ... }` with the current token on `{`; leaves the parser past `}`.
    fn parse_block(&mut self) -> Option<Block> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Option<Block> {
        let position = self.cur.position();
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if self.at_error_limit() {
                break;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
        }

        if !self.cur_is(TokenKind::RBrace) {
            self.cur_error(format!("expected }}, got {}", self.cur.kind));
            return None;
        }
        self.next_token();
        Some(Block { statements, position })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let position = self.cur.position();
        self.recovering(|p| {
            let expr = p.parse_expression()?;
            p.expect_peek(TokenKind::Semicolon)?;
            p.next_token();
            Some(Stmt::new(StmtKind::Expression(expr), position))
        })
    }

    // Expressions leave the current token on their last token.

    fn parse_expression(&mut self) -> Option<Expr> {
        self.nested(|p| p.parse_binary(0))
    }

    /// Operator table from loosest to tightest binding.
    const LEVELS: [&'static [(TokenKind, BinaryOp)]; 6] = [
        &[(TokenKind::Or, BinaryOp::Or)],
        &[(TokenKind::And, BinaryOp::And)],
        &[(TokenKind::Eq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::NotEq)],
        &[
            (TokenKind::Less, BinaryOp::Less),
            (TokenKind::Greater, BinaryOp::Greater),
            (TokenKind::LessEq, BinaryOp::LessEq),
            (TokenKind::GreaterEq, BinaryOp::GreaterEq),
        ],
        &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        &[(TokenKind::Star, BinaryOp::Mul), (TokenKind::Slash, BinaryOp::Div)],
    ];

    fn parse_binary(&mut self, level: usize) -> Option<Expr> {
        if level == Self::LEVELS.len() {
            return self.parse_unary();
        }

        let mut left = self.parse_binary(level + 1)?;
        while let Some(&(_, op)) = Self::LEVELS[level].iter().find(|(kind, _)| self.peek_is(*kind)) {
            self.next_token();
            self.next_token();
            let right = self.parse_binary(level + 1)?;
            let position = left.position;
            left = Expr::new(
                ExprKind::Infix {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                position,
            );
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.cur.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        let position = self.cur.position();
        self.next_token();
        let operand = self.nested(Self::parse_unary)?;
        Some(Expr::new(
            ExprKind::Prefix {
                op,
                operand: Box::new(operand),
            },
            position,
        ))
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut left = self.parse_primary()?;

        loop {
            let position = left.position;
            let kind = match self.peek.kind {
                TokenKind::LParen => {
                    self.next_token();
                    let args = self.parse_argument_list()?;
                    self.expect_peek(TokenKind::RParen)?;
                    ExprKind::Call {
                        callee: Box::new(left),
                        args,
                    }
                }
                TokenKind::LBracket => {
                    self.next_token();
                    self.next_token();
                    let index = self.parse_expression()?;
                    self.expect_peek(TokenKind::RBracket)?;
                    ExprKind::Index {
                        left: Box::new(left),
                        index: Box::new(index),
                    }
                }
                TokenKind::Dot => {
                    self.next_token();
                    self.expect_peek(TokenKind::Ident)?;
                    ExprKind::Member {
                        object: Box::new(left),
                        member: Rc::from(self.cur.literal.as_str()),
                    }
                }
                TokenKind::Pipe => {
                    self.next_token();
                    let format = self.parse_pipe_format()?;
                    ExprKind::Pipe {
                        left: Box::new(left),
                        format,
                    }
                }
                _ => return Some(left),
            };
            left = Expr::new(kind, position);
        }
    }

    fn parse_pipe_format(&mut self) -> Option<OutputFormat> {
        self.expect_peek(TokenKind::Ident)?;
        if self.cur.literal != "format" {
            self.cur_error(format!("expected 'format' after pipe, got {:?}", self.cur.literal));
            return None;
        }

        self.expect_peek(TokenKind::Ident)?;
        match OutputFormat::from_name(&self.cur.literal) {
            Some(format) => Some(format),
            None => {
                self.cur_error(format!("expected 'csv' or 'table', got {:?}", self.cur.literal));
                None
            }
        }
    }

    fn parse_argument_list(&mut self) -> Option<Vec<Argument>> {
        let mut args = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            return Some(args);
        }

        self.next_token();
        args.push(self.parse_argument()?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            args.push(self.parse_argument()?);
        }
        Some(args)
    }

    fn parse_argument(&mut self) -> Option<Argument> {
        if self.cur_is(TokenKind::Ident) && self.peek_is(TokenKind::Colon) {
            let name: Rc<str> = Rc::from(self.cur.literal.as_str());
            self.next_token();
            self.next_token();
            let value = self.parse_expression()?;
            return Some(Argument { name: Some(name), value });
        }
        let value = self.parse_expression()?;
        Some(Argument { name: None, value })
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let position = self.cur.position();
        let kind = match self.cur.kind {
            TokenKind::Ident => ExprKind::Identifier(Rc::from(self.cur.literal.as_str())),
            TokenKind::Int => match self.cur.literal.parse::<i64>() {
                Ok(value) => ExprKind::Integer {
                    value,
                    literal: Rc::from(self.cur.literal.as_str()),
                },
                Err(_) => {
                    self.cur_error(format!("could not parse {:?} as integer", self.cur.literal));
                    return None;
                }
            },
            TokenKind::Float => match self.cur.literal.parse::<f64>() {
                Ok(value) => ExprKind::Float {
                    value,
                    literal: Rc::from(self.cur.literal.as_str()),
                },
                Err(_) => {
                    self.cur_error(format!("could not parse {:?} as float", self.cur.literal));
                    return None;
                }
            },
            TokenKind::String => ExprKind::String(Rc::from(self.cur.literal.as_str())),
            TokenKind::True => ExprKind::Boolean(true),
            TokenKind::False => ExprKind::Boolean(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::LParen => return self.parse_grouped(),
            TokenKind::LBracket => return self.parse_list_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Illegal if is_unterminated_string(&self.cur) => {
                self.cur_error("unterminated string literal".to_string());
                return None;
            }
            other => {
                self.cur_error(format!("unexpected token {}", other));
                return None;
            }
        };
        Some(Expr::new(kind, position))
    }

    fn parse_grouped(&mut self) -> Option<Expr> {
        let position = self.cur.position();
        self.next_token();
        let inner = self.parse_expression()?;
        self.expect_peek(TokenKind::RParen)?;
        Some(Expr::new(ExprKind::Grouped(Box::new(inner)), position))
    }

    fn parse_list_literal(&mut self) -> Option<Expr> {
        let position = self.cur.position();
        let mut elements = Vec::new();

        if self.peek_is(TokenKind::RBracket) {
            self.next_token();
            return Some(Expr::new(ExprKind::List(elements), position));
        }

        self.next_token();
        elements.push(self.parse_expression()?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            elements.push(self.parse_expression()?);
        }
        self.expect_peek(TokenKind::RBracket)?;
        Some(Expr::new(ExprKind::List(elements), position))
    }

    fn parse_object_literal(&mut self) -> Option<Expr> {
        let position = self.cur.position();
        let mut entries = Vec::new();

        if self.peek_is(TokenKind::RBrace) {
            self.next_token();
            return Some(Expr::new(ExprKind::Object(entries), position));
        }

        entries.push(self.parse_object_entry()?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            entries.push(self.parse_object_entry()?);
        }
        self.expect_peek(TokenKind::RBrace)?;
        Some(Expr::new(ExprKind::Object(entries), position))
    }

    fn parse_object_entry(&mut self) -> Option<ObjectEntry> {
        self.expect_peek(TokenKind::Ident)?;
        let key: Rc<str> = Rc::from(self.cur.literal.as_str());
        self.expect_peek(TokenKind::Colon)?;
        self.next_token();
        let value = self.parse_expression()?;
        Some(ObjectEntry { key, value })
    }
}

/// Parses a complete source text, returning the program or every recorded error.
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    if parser.has_errors() {
        return Err(parser.into_errors());
    }
    Ok(program)
}
