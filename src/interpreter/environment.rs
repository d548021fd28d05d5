use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::{Rc, Weak};

use crate::ast::ContextKind;
use crate::value::Value;

pub type OutputSink = Rc<RefCell<dyn Write>>;

/// Account settings recorded by `profile` and `region` statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub profile: Option<String>,
    pub region: Option<String>,
}

/// State shared by every frame of one run.
struct Shared {
    output: OutputSink,
    context: RefCell<RunContext>,
    captured: RefCell<Vec<Weak<Frame>>>,
}

struct Frame {
    store: RefCell<HashMap<String, Value>>,
    outer: Option<Environment>,
    shared: Rc<Shared>,
    captured: Cell<bool>,
}

/// A scope frame with a link to its enclosing frame.
///
/// Cloning is cheap and yields a handle to the same frame. Closures keep the
/// frame they were declared in alive; see [`Environment::release_captured`].
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// Creates a root frame writing builtin output to `output`.
    pub fn new(output: OutputSink) -> Self {
        let shared = Rc::new(Shared {
            output,
            context: RefCell::new(RunContext::default()),
            captured: RefCell::new(Vec::new()),
        });
        Self(Rc::new(Frame {
            store: RefCell::new(HashMap::new()),
            outer: None,
            shared,
            captured: Cell::new(false),
        }))
    }

    /// Creates a root frame writing to standard output.
    pub fn with_stdout() -> Self {
        Self::new(Rc::new(RefCell::new(io::stdout())))
    }

    /// Creates a child frame sharing the sink and run context of `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Self(Rc::new(Frame {
            store: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
            shared: Rc::clone(&outer.0.shared),
            captured: Cell::new(false),
        }))
    }

    /// Looks a name up in this frame, then outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(value) = env.0.store.borrow().get(name) {
                return Some(value.clone());
            }
            frame = env.0.outer.as_ref();
        }
        None
    }

    /// Updates the nearest frame that already binds `name`; binds it in this
    /// frame when no enclosing frame does.
    pub fn assign(&self, name: &str, value: Value) {
        let mut frame = Some(self);
        while let Some(env) = frame {
            let mut store = env.0.store.borrow_mut();
            if let Some(slot) = store.get_mut(name) {
                *slot = value;
                return;
            }
            drop(store);
            frame = env.0.outer.as_ref();
        }
        self.declare_local(name, value);
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn declare_local(&self, name: &str, value: Value) {
        self.0.store.borrow_mut().insert(name.to_string(), value);
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.0.store.borrow().contains_key(name)
    }

    pub fn write_output(&self, text: &str) -> io::Result<()> {
        let mut sink = self.0.shared.output.borrow_mut();
        sink.write_all(text.as_bytes())?;
        sink.flush()
    }

    pub fn context(&self) -> RunContext {
        self.0.shared.context.borrow().clone()
    }

    pub fn set_context(&self, kind: ContextKind, value: &str) {
        let mut context = self.0.shared.context.borrow_mut();
        match kind {
            ContextKind::Profile => context.profile = Some(value.to_string()),
            ContextKind::Region => context.region = Some(value.to_string()),
        }
    }

    /// Records that a closure holds this frame, and through it every
    /// enclosing frame.
    pub fn mark_captured(&self) {
        let mut frame = Some(self);
        while let Some(env) = frame {
            // Enclosing frames of a marked frame are already marked.
            if env.0.captured.replace(true) {
                return;
            }
            let mut captured = self.0.shared.captured.borrow_mut();
            if captured.len() == captured.capacity() {
                captured.retain(|weak| weak.strong_count() > 0);
            }
            captured.push(Rc::downgrade(&env.0));
            drop(captured);
            frame = env.0.outer.as_ref();
        }
    }

    /// Clears every frame captured by a closure during this run.
    ///
    /// A function stored in the frame it closes over, or in any frame that
    /// frame can reach, forms an `Rc` cycle; emptying those frames at the end
    /// of a run lets them be freed. Closures that outlive the run see an empty
    /// scope afterwards.
    pub fn release_captured(&self) {
        let frames: Vec<Weak<Frame>> = self.0.shared.captured.borrow_mut().drain(..).collect();
        let released = frames.len();
        for frame in frames.iter().filter_map(Weak::upgrade) {
            let bindings = std::mem::take(&mut *frame.store.borrow_mut());
            drop(bindings);
        }
        tracing::trace!(frames = released, "released captured environments");
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.0.store.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_outer", &self.0.outer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (Rc<RefCell<Vec<u8>>>, Environment) {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let env = Environment::new(buffer.clone());
        (buffer, env)
    }

    #[test]
    fn test_basic_set_get() {
        let (_, env) = sink();
        env.declare_local("x", Value::Integer(42));
        assert_eq!(env.get("x"), Some(Value::Integer(42)));
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn test_enclosed_lookup_and_shadowing() {
        let (_, outer) = sink();
        outer.assign("x", Value::Integer(10));

        let inner = Environment::enclosed(&outer);
        assert_eq!(inner.get("x"), Some(Value::Integer(10)));

        inner.declare_local("x", Value::Integer(99));
        assert_eq!(inner.get("x"), Some(Value::Integer(99)));
        assert_eq!(outer.get("x"), Some(Value::Integer(10)));
    }

    #[test]
    fn test_assign_updates_outer_binding() {
        let (_, outer) = sink();
        outer.assign("count", Value::Integer(1));

        let inner = Environment::enclosed(&outer);
        inner.assign("count", Value::Integer(2));
        assert_eq!(outer.get("count"), Some(Value::Integer(2)));
        assert!(!inner.has_local("count"));
    }

    #[test]
    fn test_assign_creates_local_when_unbound() {
        let (_, outer) = sink();
        let inner = Environment::enclosed(&outer);
        inner.assign("fresh", Value::Boolean(true));
        assert!(inner.has_local("fresh"));
        assert_eq!(outer.get("fresh"), None);
    }

    #[test]
    fn test_shared_output_and_context() {
        let (buffer, root) = sink();
        let child = Environment::enclosed(&Environment::enclosed(&root));
        child.write_output("hello\n").unwrap();
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "hello\n");

        child.set_context(ContextKind::Region, "us-east-1");
        assert_eq!(root.context().region.as_deref(), Some("us-east-1"));
        assert_eq!(root.context().profile, None);
    }

    #[test]
    fn test_release_captured_clears_frames() {
        let (_, root) = sink();
        let frame = Environment::enclosed(&root);
        frame.declare_local("x", Value::Integer(1));
        frame.mark_captured();
        frame.mark_captured();

        root.release_captured();
        assert_eq!(frame.get("x"), None);
    }

    #[test]
    fn test_mark_captured_covers_enclosing_frames() {
        let (_, root) = sink();
        root.declare_local("kept", Value::list(vec![Value::Integer(1)]));
        let loop_frame = Environment::enclosed(&root);
        let call_frame = Environment::enclosed(&loop_frame);
        loop_frame.declare_local("x", Value::Integer(1));
        call_frame.mark_captured();

        let kept = match root.get("kept") {
            Some(Value::List(items)) => Rc::downgrade(&items),
            other => panic!("expected list, got {:?}", other),
        };
        root.release_captured();
        assert_eq!(loop_frame.get("x"), None);
        assert!(kept.upgrade().is_none());
    }
}
