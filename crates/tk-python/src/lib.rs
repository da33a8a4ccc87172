//! Taichi backend: renders a traced kernel as a Python script that compiles
//! it into an AOT module.

mod options;
mod script;

pub use options::{Arch, ScriptOptions};
pub use script::TaichiScriptRenderer;

#[cfg(test)]
mod tests;
