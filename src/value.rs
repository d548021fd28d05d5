use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Block;
use crate::interpreter::environment::Environment;
use crate::interpreter::error::RuntimeError;
use crate::stack::ensure_sufficient_stack;

pub type NativeFn = dyn Fn(&Environment, Vec<Value>) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    Builtin(Rc<Builtin>),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Hash(Rc<RefCell<IndexMap<String, Value>>>),
}

pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn hash(entries: IndexMap<String, Value>) -> Self {
        Value::Hash(Rc::new(RefCell::new(entries)))
    }

    pub fn from_bool(b: bool) -> Self {
        if b {
            TRUE
        } else {
            FALSE
        }
    }

    /// Name used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Builtin(_) => "BUILTIN",
            Value::List(_) => "LIST",
            Value::Function(_) => "FUNCTION",
            Value::Hash(_) => "HASH",
        }
    }

    /// Booleans are themselves, null is false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    /// Identity comparison backing `==` and `!=` for values without a
    /// type-specific rule. Booleans and null are singletons, so they compare by
    /// value; reference types compare by allocation, never by contents.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Display form used by `print` and the command line. A list or hash that
    /// contains itself renders the repeated reference as `[...]` or `{...}`.
    pub fn inspect(&self) -> String {
        self.inspect_with(&mut Vec::new())
    }

    /// Address of the shared allocation behind a list or hash.
    pub(crate) fn container_id(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(Rc::as_ptr(items) as *const () as usize),
            Value::Hash(map) => Some(Rc::as_ptr(map) as *const () as usize),
            _ => None,
        }
    }

    fn inspect_with(&self, open: &mut Vec<usize>) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Builtin(b) => format!("builtin:{}", b.name),
            Value::Function(func) => format!("fn({})", func.params.join(", ")),
            Value::List(items) => {
                if !self.enter(open) {
                    return self.inspect_shallow().to_string();
                }
                let parts: Vec<String> = items.borrow().iter().map(|item| item.inspect_nested(open)).collect();
                open.pop();
                format!("[{}]", parts.join(", "))
            }
            Value::Hash(map) => {
                if !self.enter(open) {
                    return self.inspect_shallow().to_string();
                }
                let parts: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.inspect_nested(open)))
                    .collect();
                open.pop();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Placeholder shown for a container reached again while rendering itself.
    pub(crate) fn inspect_shallow(&self) -> &'static str {
        match self {
            Value::List(_) => "[...]",
            Value::Hash(_) => "{...}",
            _ => "...",
        }
    }

    // False when this container is already being rendered further up.
    fn enter(&self, open: &mut Vec<usize>) -> bool {
        match self.container_id() {
            Some(id) if !open.contains(&id) => {
                open.push(id);
                true
            }
            _ => false,
        }
    }

    // Strings inside containers are quoted so `["a, b"]` stays readable.
    fn inspect_nested(&self, open: &mut Vec<usize>) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            other => ensure_sufficient_stack(|| other.inspect_with(open)),
        }
    }
}

/// Shortest float rendering; switches to exponent form for very large or
/// very small magnitudes (`1e+21`, `1e-05`).
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf".to_string() } else { "-Inf".to_string() };
    }
    let magnitude = f.abs();
    if f == 0.0 || (1e-4..1e21).contains(&magnitude) {
        return f.to_string();
    }

    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            other => write!(f, "{}({})", other.type_name(), other.inspect()),
        }
    }
}

/// Structural equality for tests and host code; the language itself uses
/// the identity rule in [`Value::is_identical`] for non-scalar values.
/// Containers already under comparison are treated as equal, so cyclic values
/// compare without recursing forever.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut Vec::new())
    }
}

fn structural_eq(a: &Value, b: &Value, open: &mut Vec<(usize, usize)>) -> bool {
    if let (Some(a_id), Some(b_id)) = (a.container_id(), b.container_id()) {
        if a_id == b_id || open.contains(&(a_id, b_id)) {
            return true;
        }
        open.push((a_id, b_id));
        let equal = ensure_sufficient_stack(|| match (a, b) {
            (Value::List(x), Value::List(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| structural_eq(l, r, open))
            }
            (Value::Hash(x), Value::Hash(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len()
                    && x.iter().all(|(key, l)| y.get(key).is_some_and(|r| structural_eq(l, r, open)))
            }
            _ => false,
        });
        open.pop();
        return equal;
    }

    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// A user-defined function together with the environment it closes over.
pub struct Function {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub body: Rc<Block>,
    pub env: Environment,
}

/// A host function exposed to scripts.
pub struct Builtin {
    pub name: String,
    pub func: Box<NativeFn>,
}

impl Builtin {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&Environment, Vec<Value>) -> Result<Value, RuntimeError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn call(&self, env: &Environment, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.func)(env, args)
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Builtin(Rc::new(builtin))
    }
}
