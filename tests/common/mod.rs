#![allow(dead_code)]

use awsl::interpreter::{parse_and_run, OutputSink, RunError, RuntimeError};
use awsl::{parse, ParseError, Program, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Runs `source` with a buffer as the output sink and returns the final value
/// together with everything printed.
pub fn run_with_output(source: &str) -> Result<(Value, String), RunError> {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let sink: OutputSink = buffer.clone();
    let value = parse_and_run(source, sink)?;
    let printed = String::from_utf8(buffer.borrow().clone()).expect("output should be UTF-8");
    Ok((value, printed))
}

pub fn run(source: &str) -> Value {
    match run_with_output(source) {
        Ok((value, _)) => value,
        Err(e) => panic!("script failed: {:?}\n{}", e, source),
    }
}

pub fn output(source: &str) -> String {
    match run_with_output(source) {
        Ok((_, printed)) => printed,
        Err(e) => panic!("script failed: {:?}\n{}", e, source),
    }
}

pub fn run_err(source: &str) -> RuntimeError {
    match run_with_output(source) {
        Err(RunError::Runtime(err)) => err,
        Err(RunError::Parse(errors)) => panic!("expected runtime error, got parse errors: {:?}", errors),
        Ok((value, _)) => panic!("expected runtime error, got {:?}", value),
    }
}

pub fn run_err_message(source: &str) -> String {
    run_err(source).message()
}

pub fn parse_ok(source: &str) -> Program {
    match parse(source) {
        Ok(program) => program,
        Err(errors) => panic!("unexpected parse errors: {:?}", errors),
    }
}

pub fn parse_errors(source: &str) -> Vec<ParseError> {
    match parse(source) {
        Ok(program) => panic!("expected parse errors, got {}", program),
        Err(errors) => errors,
    }
}

pub fn parse_error_messages(source: &str) -> Vec<String> {
    parse_errors(source).into_iter().map(|e| e.message).collect()
}

pub fn int(n: i64) -> Value {
    Value::Integer(n)
}

pub fn string(s: &str) -> Value {
    Value::string(s)
}

pub fn list(items: Vec<Value>) -> Value {
    Value::list(items)
}
