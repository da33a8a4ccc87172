use serde::{Deserialize, Serialize};

/// Taichi backend the AOT module is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    Vulkan,
    Metal,
    Opengl,
    Gles,
    Cuda,
    X64,
    Arm64,
}

impl Arch {
    pub fn as_python(&self) -> &'static str {
        match self {
            Arch::Vulkan => "ti.vulkan",
            Arch::Metal => "ti.metal",
            Arch::Opengl => "ti.opengl",
            Arch::Gles => "ti.gles",
            Arch::Cuda => "ti.cuda",
            Arch::X64 => "ti.x64",
            Arch::Arm64 => "ti.arm64",
        }
    }
}

/// Knobs for the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    pub arch: Arch,
    pub offline_cache: bool,
    /// Name of the `@ti.kernel` function.
    pub kernel_name: String,
    /// Name the graph is registered under in the AOT module.
    pub graph_name: String,
    /// Where `mod.save` writes the compiled module.
    pub module_path: String,
    /// File that receives `module_path` once the module is saved.
    pub transfer_file: Option<String>,
    pub indent_width: usize,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            arch: Arch::Vulkan,
            offline_cache: false,
            kernel_name: "f".to_string(),
            graph_name: "g".to_string(),
            module_path: "module".to_string(),
            transfer_file: None,
            indent_width: 4,
        }
    }
}
