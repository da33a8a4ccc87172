//! Binds traced kernels to an external Taichi toolchain: render the script,
//! hand it to a compiler and line runtime arguments up with launch slots.

pub mod compiler;
pub mod config;
pub mod error;
pub mod handoff;
pub mod kernel;

pub use compiler::{Artifact, Compiler, ProcessCompiler};
pub use config::{BindingConfig, CompilerConfig};
pub use error::{BindingError, Result};
pub use handoff::ArtifactHandoff;
pub use kernel::{to_kernel, CompiledKernel, GeneratedProgram, Kernel};
