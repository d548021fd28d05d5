pub mod builtins;
pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use control_flow::ControlFlow;
pub use environment::{Environment, OutputSink, RunContext};
pub use error::{ErrorKind, RuntimeError};
pub use evaluator::{parse_and_run, Interpreter, RunError, DEFAULT_MAX_CALL_DEPTH};
pub use parser::{parse, ParseError, Parser};
