use miette::Diagnostic;
use std::result;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("malformed {node} expression: {reason}")]
    #[diagnostic(
        code(tracekern::malformed_expr),
        help("literals need either a value or a bound argument name")
    )]
    MalformedExpr { node: &'static str, reason: String },

    #[error("a root trace is already open on this thread (frame depth {depth})")]
    #[diagnostic(
        code(tracekern::reentrant_trace),
        help("nest blocks through `TraceContext::for_each` instead of starting a new kernel trace")
    )]
    ReentrantTrace { depth: usize },

    #[error("cannot {operation}: no scope frame is open")]
    #[diagnostic(code(tracekern::no_active_scope))]
    NoActiveScope { operation: &'static str },

    #[error("loop frame at depth {depth} registered external arguments: {}", names.join(", "))]
    #[diagnostic(
        code(tracekern::leaked_argument),
        help("kernel arguments can only be registered by the root frame")
    )]
    LeakedArgument { depth: usize, names: Vec<String> },

    #[error("kernel declares {expected} parameter(s) but {actual} argument(s) were supplied")]
    #[diagnostic(code(tracekern::arity_mismatch))]
    ArityMismatch { expected: usize, actual: usize },

    #[error("argument {index} is {actual} but the kernel parameter expects {expected}")]
    #[diagnostic(code(tracekern::argument_kind))]
    ArgumentKind {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unbalanced trace: frame depth is {depth}, expected {expected}")]
    #[diagnostic(code(tracekern::unbalanced_trace))]
    UnbalancedTrace { depth: usize, expected: usize },

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn malformed(node: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedExpr {
            node,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
