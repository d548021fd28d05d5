use std::time::{SystemTime, UNIX_EPOCH};

use super::require_args;
use crate::interpreter::environment::Environment;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

/// Current Unix time in whole seconds.
pub fn builtin_clock(_env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    require_args!(args, 0, "clock");
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(Value::Integer(i64::try_from(secs).unwrap_or(i64::MAX)))
}

pub fn builtin_type(_env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "type");
    Ok(Value::string(args[0].type_name()))
}
