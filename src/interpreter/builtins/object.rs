use super::{require_args, unsupported};
use crate::interpreter::environment::Environment;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

/// Keys of a hash in insertion order.
pub fn builtin_keys(_env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "keys");
    match &args[0] {
        Value::Hash(map) => {
            let keys = map.borrow().keys().map(|k| Value::string(k)).collect();
            Ok(Value::list(keys))
        }
        other => Err(unsupported("keys", other)),
    }
}
