use crate::value::Value;

/// Outcome of executing a statement: either a plain value, or a `return`
/// unwinding to the nearest function call.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    Value(Value),
    Return(Value),
}
