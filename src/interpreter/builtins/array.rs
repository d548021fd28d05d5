use super::{require_args, unsupported};
use crate::interpreter::environment::Environment;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

pub fn builtin_len(_env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "len");
    let len = match &args[0] {
        Value::List(items) => items.borrow().len(),
        Value::String(s) => s.chars().count(),
        Value::Hash(map) => map.borrow().len(),
        other => return Err(unsupported("len", other)),
    };
    Ok(Value::Integer(len as i64))
}

/// Appends in place; the list is shared, so every alias sees the new element.
pub fn builtin_push(_env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    require_args!(args, 2, "push");
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(Value::List(items)), Some(value)) => {
            items.borrow_mut().push(value);
            Ok(Value::List(items))
        }
        (Some(other), _) => Err(unsupported("push", &other)),
        _ => Err(RuntimeError::builtin("push expects 2 argument(s)")),
    }
}
