//! Built-in functions installed into every root environment.
//!
//! - **IO**: `print`
//! - **Misc**: `clock`, `type`
//! - **Array**: `len`, `push`
//! - **Object**: `keys`
//!
//! Host code adds its own bindings (for example an AWS service namespace) by
//! declaring [`Builtin`] values, or hashes of them, in the environment.

mod array;
mod io;
mod misc;
mod object;

use crate::interpreter::environment::Environment;
use crate::value::{Builtin, Value};

pub use array::{builtin_len, builtin_push};
pub use io::builtin_print;
pub use misc::{builtin_clock, builtin_type};
pub use object::builtin_keys;

macro_rules! require_args {
    ($args:expr, $n:expr, $name:expr) => {
        if $args.len() != $n {
            return Err($crate::interpreter::error::RuntimeError::builtin(format!(
                "{} expects {} argument(s), got {}",
                $name,
                $n,
                $args.len()
            )));
        }
    };
}

pub(crate) use require_args;

pub(crate) fn unsupported(name: &str, value: &Value) -> crate::interpreter::error::RuntimeError {
    crate::interpreter::error::RuntimeError::builtin(format!(
        "{}: unsupported argument type {}",
        name,
        value.type_name()
    ))
}

/// The default builtin set.
pub fn defaults() -> Vec<Builtin> {
    vec![
        Builtin::new("print", builtin_print),
        Builtin::new("clock", builtin_clock),
        Builtin::new("len", builtin_len),
        Builtin::new("type", builtin_type),
        Builtin::new("push", builtin_push),
        Builtin::new("keys", builtin_keys),
    ]
}

/// Declares every default builtin in `env`.
pub fn register(env: &Environment) {
    for builtin in defaults() {
        let name = builtin.name.clone();
        env.declare_local(&name, Value::from(builtin));
    }
    tracing::debug!("registered default builtins");
}

/// Declares a single host function in `env`.
pub fn define(
    env: &Environment,
    name: &str,
    func: impl Fn(&Environment, Vec<Value>) -> Result<Value, crate::interpreter::error::RuntimeError> + 'static,
) {
    env.declare_local(name, Value::from(Builtin::new(name, func)));
}
