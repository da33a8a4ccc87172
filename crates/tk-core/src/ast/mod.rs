//! Kernel AST. Nodes are immutable and shared through `Arc`, so the tree is
//! really a DAG: one index expression can sit under several statements.

mod arg;
mod expr;
mod stmt;

pub use arg::*;
pub use expr::*;
pub use stmt::*;
