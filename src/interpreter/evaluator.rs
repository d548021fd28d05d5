use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::ast::{BinaryOp, Block, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostic::{Diagnostic, Position};
use crate::format;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Function, Value, FALSE, NULL, TRUE};

use super::builtins;
use super::control_flow::ControlFlow;
use super::environment::{Environment, OutputSink};
use super::error::{ErrorKind, RuntimeError};
use super::parser::{self, ParseError};

/// Nested user-function calls allowed before a run fails.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 50_000;

/// Tree-walking evaluator over a parsed [`Program`].
pub struct Interpreter {
    env: Environment,
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter {
    /// Evaluates against `env` as given; no builtins are added.
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Fresh root environment with the default builtins, writing to `output`.
    pub fn with_output(output: OutputSink) -> Self {
        let env = Environment::new(output);
        builtins::register(&env);
        Self::new(env)
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Runs every statement in order. The result is the value of the last
    /// statement, or the value of a top-level `return`.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn eval_program(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let env = self.env.clone();
        let mut result = NULL;
        for stmt in &program.statements {
            match self.execute_statement(stmt, &env)? {
                ControlFlow::Return(value) => return Ok(value),
                ControlFlow::Value(value) => result = value,
            }
        }
        Ok(result)
    }

    pub fn execute_statement(&mut self, statement: &Stmt, env: &Environment) -> Result<ControlFlow, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_statement_inner(statement, env))
    }

    fn execute_statement_inner(&mut self, statement: &Stmt, env: &Environment) -> Result<ControlFlow, RuntimeError> {
        match &statement.kind {
            StmtKind::Expression(expr) => Ok(ControlFlow::Value(self.eval_expression(expr, env)?)),

            StmtKind::Assignment { name, value } => {
                let val = self.eval_expression(value, env)?;
                env.assign(name, val);
                Ok(ControlFlow::Value(NULL))
            }

            StmtKind::Context { kind, value } => {
                env.set_context(*kind, value);
                tracing::debug!(setting = %kind, value = %value, "context updated");
                Ok(ControlFlow::Value(NULL))
            }

            StmtKind::Block(block) => self.execute_block(block, env),

            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => {
                let cond_val = self.eval_expression(condition, env)?;
                if cond_val.is_truthy() {
                    self.execute_block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.execute_block(alt, env)
                } else {
                    Ok(ControlFlow::Value(NULL))
                }
            }

            StmtKind::For {
                variable,
                iterable,
                body,
            } => {
                let iter_val = self.eval_expression(iterable, env)?;
                let items = match &iter_val {
                    Value::List(items) => items.borrow().clone(),
                    other => {
                        return Err(RuntimeError::new(
                            ErrorKind::NotIterable(other.type_name()),
                            statement.position,
                        ))
                    }
                };

                let loop_env = Environment::enclosed(env);
                for item in items {
                    loop_env.declare_local(variable, item);
                    if let ControlFlow::Return(value) = self.execute_block(body, &loop_env)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Value(NULL))
            }

            StmtKind::Return(value) => {
                let val = match value {
                    Some(expr) => self.eval_expression(expr, env)?,
                    None => NULL,
                };
                Ok(ControlFlow::Return(val))
            }

            StmtKind::Function { name, params, body } => {
                env.mark_captured();
                let func = Function {
                    name: Rc::clone(name),
                    params: params.clone(),
                    body: Rc::clone(body),
                    env: env.clone(),
                };
                env.assign(name, Value::Function(Rc::new(func)));
                Ok(ControlFlow::Value(NULL))
            }
        }
    }

    /// Runs a block in `env` itself; blocks do not open a scope.
    pub fn execute_block(&mut self, block: &Block, env: &Environment) -> Result<ControlFlow, RuntimeError> {
        for stmt in &block.statements {
            if let ControlFlow::Return(value) = self.execute_statement(stmt, env)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Value(NULL))
    }

    pub fn eval_expression(&mut self, expr: &Expr, env: &Environment) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expr, env))
    }

    fn eval_expression_inner(&mut self, expr: &Expr, env: &Environment) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Identifier(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::new(ErrorKind::UndefinedVariable(name.to_string()), expr.position)),

            ExprKind::Integer { value, .. } => Ok(Value::Integer(*value)),
            ExprKind::Float { value, .. } => Ok(Value::Float(*value)),
            ExprKind::String(s) => Ok(Value::String(Rc::clone(s))),
            ExprKind::Boolean(b) => Ok(Value::from_bool(*b)),
            ExprKind::Null => Ok(NULL),
            ExprKind::Grouped(inner) => self.eval_expression(inner, env),

            ExprKind::Prefix { op, operand } => {
                let val = self.eval_expression(operand, env)?;
                eval_prefix(*op, val, expr.position)
            }

            ExprKind::Infix { left, op, right } => {
                let left_val = self.eval_expression(left, env)?;
                let right_val = self.eval_expression(right, env)?;
                eval_infix(&left_val, *op, &right_val, expr.position)
            }

            ExprKind::Call { callee, args } => {
                let func_val = self.eval_expression(callee, env)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.eval_expression(&arg.value, env)?);
                }
                self.apply_function(&func_val, arg_vals, env, expr.position)
            }

            ExprKind::Index { left, index } => {
                let left_val = self.eval_expression(left, env)?;
                let index_val = self.eval_expression(index, env)?;
                eval_index(&left_val, &index_val, expr.position)
            }

            ExprKind::Member { object, member } => {
                let target = self.eval_expression(object, env)?;
                match &target {
                    Value::Hash(map) => Ok(map.borrow().get(member.as_ref()).cloned().unwrap_or(NULL)),
                    other => Err(RuntimeError::new(
                        ErrorKind::MemberNotSupported {
                            target: other.type_name(),
                            member: member.to_string(),
                        },
                        expr.position,
                    )),
                }
            }

            ExprKind::Pipe { left, format } => {
                let val = self.eval_expression(left, env)?;
                let rendered = format::render(&val, *format).map_err(|kind| RuntimeError::new(kind, expr.position))?;
                Ok(Value::string(&rendered))
            }

            ExprKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expression(element, env)?);
                }
                Ok(Value::list(items))
            }

            ExprKind::Object(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for entry in entries {
                    let val = self.eval_expression(&entry.value, env)?;
                    map.insert(entry.key.to_string(), val);
                }
                Ok(Value::hash(map))
            }
        }
    }

    fn apply_function(
        &mut self,
        func_val: &Value,
        args: Vec<Value>,
        env: &Environment,
        position: Position,
    ) -> Result<Value, RuntimeError> {
        match func_val {
            Value::Function(func) => self.call_user_function(func, args, position),
            Value::Builtin(builtin) => {
                tracing::trace!(builtin = %builtin.name, args = args.len(), "calling builtin");
                builtin.call(env, args).map_err(|e| e.or_at(position))
            }
            other => Err(RuntimeError::new(ErrorKind::NotAFunction(other.type_name()), position)),
        }
    }

    fn call_user_function(&mut self, func: &Function, args: Vec<Value>, position: Position) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::new(
                ErrorKind::WrongArgumentCount {
                    expected: func.params.len(),
                    got: args.len(),
                },
                position,
            ));
        }
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::new(ErrorKind::CallDepthExceeded(self.max_call_depth), position));
        }
        tracing::debug!(function = %func.name, args = args.len(), depth = self.call_depth, "calling function");

        let call_env = Environment::enclosed(&func.env);
        for (param, arg) in func.params.iter().zip(args) {
            call_env.declare_local(param, arg);
        }

        self.call_depth += 1;
        let result = self.execute_block(&func.body, &call_env);
        self.call_depth -= 1;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Value(_) => Ok(NULL),
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.env.release_captured();
    }
}

fn eval_prefix(op: UnaryOp, operand: Value, position: Position) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(match operand {
            Value::Boolean(b) => Value::from_bool(!b),
            Value::Null => TRUE,
            _ => FALSE,
        }),
        UnaryOp::Neg => match operand {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(RuntimeError::new(
                ErrorKind::UnknownPrefixOperator {
                    op,
                    operand: other.type_name(),
                },
                position,
            )),
        },
    }
}

fn unknown_infix(left: &Value, op: BinaryOp, right: &Value, position: Position) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::UnknownInfixOperator {
            left: left.type_name(),
            op,
            right: right.type_name(),
        },
        position,
    )
}

fn eval_infix(left: &Value, op: BinaryOp, right: &Value, position: Position) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(*a, op, *b)
            .ok_or_else(|| unknown_infix(left, op, right, position))?
            .map_err(|kind| RuntimeError::new(kind, position)),
        (Value::Float(a), Value::Float(b)) => eval_float_infix(*a, op, *b)
            .ok_or_else(|| unknown_infix(left, op, right, position))?
            .map_err(|kind| RuntimeError::new(kind, position)),
        (Value::String(a), Value::String(b)) => match op {
            BinaryOp::Add => Ok(Value::string(&format!("{}{}", a, b))),
            BinaryOp::Eq => Ok(Value::from_bool(a == b)),
            BinaryOp::NotEq => Ok(Value::from_bool(a != b)),
            _ => Err(unknown_infix(left, op, right, position)),
        },
        _ => match op {
            BinaryOp::Eq => Ok(Value::from_bool(left.is_identical(right))),
            BinaryOp::NotEq => Ok(Value::from_bool(!left.is_identical(right))),
            BinaryOp::And => Ok(Value::from_bool(left.is_truthy() && right.is_truthy())),
            BinaryOp::Or => Ok(Value::from_bool(left.is_truthy() || right.is_truthy())),
            _ if left.type_name() != right.type_name() => Err(RuntimeError::new(
                ErrorKind::TypeMismatch {
                    left: left.type_name(),
                    op,
                    right: right.type_name(),
                },
                position,
            )),
            _ => Err(unknown_infix(left, op, right, position)),
        },
    }
}

/// `None` when the operator does not apply to integers.
fn eval_integer_infix(a: i64, op: BinaryOp, b: i64) -> Option<Result<Value, ErrorKind>> {
    let value = match op {
        BinaryOp::Add => Value::Integer(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Integer(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Integer(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Some(Err(ErrorKind::DivisionByZero));
            }
            Value::Integer(a.wrapping_div(b))
        }
        BinaryOp::Eq => Value::from_bool(a == b),
        BinaryOp::NotEq => Value::from_bool(a != b),
        BinaryOp::Less => Value::from_bool(a < b),
        BinaryOp::Greater => Value::from_bool(a > b),
        BinaryOp::LessEq => Value::from_bool(a <= b),
        BinaryOp::GreaterEq => Value::from_bool(a >= b),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(Ok(value))
}

fn eval_float_infix(a: f64, op: BinaryOp, b: f64) -> Option<Result<Value, ErrorKind>> {
    let value = match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Some(Err(ErrorKind::DivisionByZero));
            }
            Value::Float(a / b)
        }
        BinaryOp::Eq => Value::from_bool(a == b),
        BinaryOp::NotEq => Value::from_bool(a != b),
        BinaryOp::Less => Value::from_bool(a < b),
        BinaryOp::Greater => Value::from_bool(a > b),
        BinaryOp::LessEq => Value::from_bool(a <= b),
        BinaryOp::GreaterEq => Value::from_bool(a >= b),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(Ok(value))
}

/// Resolves a possibly negative index against `length`.
fn resolve_index(index: i64, length: usize, position: Position) -> Result<usize, RuntimeError> {
    let resolved = if index < 0 { index + length as i64 } else { index };
    if resolved < 0 || resolved >= length as i64 {
        return Err(RuntimeError::new(ErrorKind::IndexOutOfBounds { index, length }, position));
    }
    Ok(resolved as usize)
}

fn eval_index(left: &Value, index: &Value, position: Position) -> Result<Value, RuntimeError> {
    match (left, index) {
        (Value::List(items), Value::Integer(i)) => {
            let items = items.borrow();
            let at = resolve_index(*i, items.len(), position)?;
            Ok(items[at].clone())
        }
        (Value::String(s), Value::Integer(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let at = resolve_index(*i, chars.len(), position)?;
            Ok(Value::string(&chars[at].to_string()))
        }
        (Value::Hash(map), Value::String(key)) => Ok(map.borrow().get(key.as_ref()).cloned().unwrap_or(NULL)),
        _ => Err(RuntimeError::new(
            ErrorKind::IndexNotSupported {
                left: left.type_name(),
                index: index.type_name(),
            },
            position,
        )),
    }
}

/// Failure from [`parse_and_run`]: either the parser's error list or the
/// first runtime error.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            RunError::Parse(errors) => {
                let mut diagnostics: Vec<Diagnostic> = errors.iter().map(ParseError::to_diagnostic).collect();
                if errors.len() >= parser::MAX_ERRORS {
                    diagnostics.push(Diagnostic::warning(format!(
                        "stopped parsing after {} errors",
                        parser::MAX_ERRORS
                    )));
                }
                diagnostics
            }
            RunError::Runtime(err) => vec![err.to_diagnostic()],
        }
    }
}

/// Parses and evaluates `source` in a fresh environment with the default
/// builtins, writing `print` output to `output`.
pub fn parse_and_run(source: &str, output: OutputSink) -> Result<Value, RunError> {
    let program = parser::parse(source).map_err(RunError::Parse)?;
    let mut interpreter = Interpreter::with_output(output);
    Ok(interpreter.eval_program(&program)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn run(source: &str) -> Value {
        let sink = Rc::new(RefCell::new(Vec::new()));
        parse_and_run(source, sink).unwrap()
    }

    fn run_err(source: &str) -> RuntimeError {
        let sink = Rc::new(RefCell::new(Vec::new()));
        match parse_and_run(source, sink) {
            Err(RunError::Runtime(err)) => err,
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(run("1 + 2 * 3;"), Value::Integer(7));
        assert_eq!(run("(1 + 2) * 3;"), Value::Integer(9));
        assert_eq!(run("7 / 2;"), Value::Integer(3));
        assert_eq!(run("-7 / 2;"), Value::Integer(-3));
        assert_eq!(run("9223372036854775807 + 1;"), Value::Integer(i64::MIN));
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(run("1.5 + 2.25;"), Value::Float(3.75));
        assert_eq!(run("-2.5;"), Value::Float(-2.5));
        assert_eq!(run("1.0 < 2.0;"), TRUE);
    }

    #[test]
    fn test_string_operators() {
        assert_eq!(run("\"foo\" + \"bar\";"), Value::string("foobar"));
        assert_eq!(run("\"a\" == \"a\";"), TRUE);
        assert_eq!(run("\"a\" != \"b\";"), TRUE);
        assert_eq!(run_err("\"a\" - \"b\";").message(), "unknown operator: STRING - STRING");
    }

    #[test]
    fn test_prefix_operators() {
        assert_eq!(run("!true;"), FALSE);
        assert_eq!(run("!null;"), TRUE);
        assert_eq!(run("!5;"), FALSE);
        assert_eq!(run("!!5;"), TRUE);
        assert_eq!(run_err("-true;").message(), "unknown operator: -BOOLEAN");
    }

    #[test]
    fn test_mixed_operands() {
        assert_eq!(run_err("1 + 1.0;").message(), "type mismatch: INTEGER + FLOAT");
        assert_eq!(run_err("true + false;").message(), "unknown operator: BOOLEAN + BOOLEAN");
        assert_eq!(run_err("1 && 2;").message(), "unknown operator: INTEGER && INTEGER");
        assert_eq!(run("1 == \"1\";"), FALSE);
        assert_eq!(run("null == null;"), TRUE);
        assert_eq!(run("true && null;"), FALSE);
        assert_eq!(run("null || 3;"), TRUE);
    }

    #[test]
    fn test_division_by_zero() {
        let err = run_err("x = 1;\nx / 0;");
        assert_eq!(err.message(), "division by zero");
        assert_eq!(err.position.line, 2);
        assert_eq!(run_err("1.0 / 0.0;").message(), "division by zero");
    }

    #[test]
    fn test_if_uses_truthiness() {
        assert_eq!(run("x = 0; if (1) { x = 1; } x;"), Value::Integer(1));
        assert_eq!(run("x = 0; if (null) { x = 1; } else { x = 2; } x;"), Value::Integer(2));
        assert_eq!(run("if (false) { 1; }"), NULL);
    }

    #[test]
    fn test_for_loop_assigns_outward() {
        assert_eq!(run("sum = 0; for (x in [1, 2, 3]) { sum = sum + x; } sum;"), Value::Integer(6));
        assert_eq!(run_err("for (x in 5) { }").message(), "cannot iterate over INTEGER");
    }

    #[test]
    fn test_for_loop_variable_is_scoped() {
        let err = run_err("for (x in [1]) { } x;");
        assert_eq!(err.message(), "undefined variable: x");
    }

    #[test]
    fn test_functions_and_closures() {
        assert_eq!(run("fn add(a, b) { return a + b; } add(2, 3);"), Value::Integer(5));
        assert_eq!(run("fn noop() { } noop();"), NULL);
        let source = "
            fn counter() {
                count = 0;
                fn next() { count = count + 1; return count; }
                return next;
            }
            c = counter();
            c();
            c();
        ";
        assert_eq!(run(source), Value::Integer(2));
    }

    #[test]
    fn test_recursion() {
        let source = "fn fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } fib(15);";
        assert_eq!(run(source), Value::Integer(610));
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            run_err("fn f(a) { return a; } f(1, 2);").message(),
            "wrong number of arguments: expected 1, got 2"
        );
        assert_eq!(run_err("x = 3; x();").message(), "not a function: INTEGER");
        assert_eq!(run_err("len();").message(), "len expects 1 argument(s), got 0");
        assert!(!run_err("len();").position.is_unknown());
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(run("1; return 2; 3;"), Value::Integer(2));
    }

    #[test]
    fn test_indexing() {
        assert_eq!(run("[1, 2, 3][0];"), Value::Integer(1));
        assert_eq!(run("[1, 2, 3][-1];"), Value::Integer(3));
        assert_eq!(run("\"héllo\"[1];"), Value::string("é"));
        assert_eq!(run("{a: 1}[\"a\"];"), Value::Integer(1));
        assert_eq!(run("{}[\"missing\"];"), NULL);
        assert_eq!(run_err("[1, 2, 3][3];").message(), "index out of bounds: 3 (length: 3)");
        assert_eq!(run_err("[1, 2, 3][-4];").message(), "index out of bounds: -4 (length: 3)");
        assert_eq!(run_err("5[0];").message(), "index operator not supported: INTEGER[INTEGER]");
    }

    #[test]
    fn test_member_access() {
        assert_eq!(run("fn1 = {name: \"api\", memory: 128}; fn1.memory;"), Value::Integer(128));
        assert_eq!(run("{}.missing;"), NULL);
        assert_eq!(run_err("x = 1; x.name;").message(), "member access not supported: INTEGER.name");
    }

    #[test]
    fn test_host_namespace() {
        let sink: OutputSink = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::with_output(sink);
        let mut namespace = IndexMap::new();
        namespace.insert(
            "count".to_string(),
            Value::from(crate::value::Builtin::new("count", |_, args| {
                Ok(Value::Integer(args.len() as i64))
            })),
        );
        interpreter.env().declare_local("lambda", Value::hash(namespace));

        let program = parser::parse("lambda.count(1, region: \"eu-west-1\");").unwrap();
        assert_eq!(interpreter.eval_program(&program).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_pipe_format() {
        assert_eq!(run("[{a: 1}, {a: 2}] | format csv;"), Value::string("a\n1\n2"));
        assert_eq!(run_err("5 | format table;").message(), "cannot format INTEGER as table");
    }

    #[test]
    fn test_context_statement() {
        let sink: OutputSink = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::with_output(sink);
        let program = parser::parse("profile \"prod\"; region \"us-east-1\";").unwrap();
        assert_eq!(interpreter.eval_program(&program).unwrap(), NULL);
        let context = interpreter.env().context();
        assert_eq!(context.profile.as_deref(), Some("prod"));
        assert_eq!(context.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_reference_equality() {
        assert_eq!(run("a = [1]; b = a; a == b;"), TRUE);
        assert_eq!(run("[1] == [1];"), FALSE);
    }

    #[test]
    fn test_print_writes_to_sink() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        parse_and_run("print(\"hi\", 1, [\"a\"]);", buffer.clone()).unwrap();
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "hi 1 [\"a\"]\n");
    }

    #[test]
    fn test_parse_errors_stop_evaluation() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let err = parse_and_run("print(1);\nx = ;", buffer.clone()).unwrap_err();
        assert!(matches!(err, RunError::Parse(ref errors) if errors.len() == 1));
        assert!(buffer.borrow().is_empty());
        assert_eq!(err.diagnostics().len(), 1);
    }
}
