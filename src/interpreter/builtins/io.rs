//! Input/output built-in functions.

use crate::interpreter::environment::Environment;
use crate::interpreter::error::RuntimeError;
use crate::value::{Value, NULL};

/// Writes the arguments, space separated, plus a newline to the run's output sink.
pub fn builtin_print(env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut line = args.iter().map(Value::inspect).collect::<Vec<_>>().join(" ");
    line.push('\n');
    env.write_output(&line)
        .map_err(|e| RuntimeError::builtin(format!("print: {}", e)))?;
    Ok(NULL)
}
