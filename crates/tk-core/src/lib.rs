//! Trace-based kernel front-end.
//!
//! A kernel is an ordinary Rust function over façade values. Tracing it once
//! records an AST; a [`codegen::ProgramRenderer`] turns that AST into program
//! text for an external array compiler.

#[macro_use]
pub mod macros;

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod kernel;
pub mod trace;
pub mod value;
pub mod writer;

// Re-export commonly used items for convenience
pub use tracing;

pub use codegen::ProgramRenderer;
pub use kernel::{check_arguments, trace_kernel, KernelFn, KernelParam, TracedKernel};
pub use trace::{ArgumentRegistry, FrameKind, IntoRange, TraceContext, TraceOutput};
pub use value::{ArrayValue, AsExpr, FloatValue, Indices, IntValue, IterVarValue, VectorValue};
pub use writer::ScriptWriter;

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
