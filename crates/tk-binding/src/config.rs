use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tk_python::ScriptOptions;

use crate::compiler::ProcessCompiler;
use crate::error::{BindingError, Result};

/// Looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tracekern.toml";
pub const DEFAULT_TRANSFER_FILE: &str = "module.path";

/// Binding configuration, usually read from `tracekern.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Options for the generated script
    pub script: ScriptOptions,
    /// How the script gets compiled
    pub compiler: CompilerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Interpreter the script is handed to
    pub program: String,
    /// Extra arguments placed before the script path
    pub args: Vec<String>,
    /// Directory the script runs in; relative module paths resolve here
    pub work_dir: PathBuf,
    /// Keep the generated script after a successful compile
    pub keep_script: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            script: ScriptOptions {
                transfer_file: Some(DEFAULT_TRANSFER_FILE.to_string()),
                ..ScriptOptions::default()
            },
            compiler: CompilerConfig::default(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: Vec::new(),
            work_dir: std::env::temp_dir().join("tracekern"),
            keep_script: false,
        }
    }
}

impl BindingConfig {
    /// Load from `config_path`, or from `tracekern.toml` in the working
    /// directory when it exists, or fall back to defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::load_from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BindingError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            BindingError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;

        tk_core::debug!(path = %path.display(), "loaded binding config");
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BindingError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.compiler.program.trim().is_empty() {
            return Err(BindingError::Config("compiler.program is empty".to_string()));
        }
        for (key, value) in [
            ("script.kernel_name", &self.script.kernel_name),
            ("script.graph_name", &self.script.graph_name),
            ("script.module_path", &self.script.module_path),
        ] {
            if value.is_empty() {
                return Err(BindingError::Config(format!("{key} is empty")));
            }
        }
        if self.script.kernel_name.chars().next().is_some_and(|c| c.is_ascii_digit())
            || !self
                .script
                .kernel_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(BindingError::Config(format!(
                "script.kernel_name `{}` is not a Python identifier",
                self.script.kernel_name
            )));
        }
        Ok(())
    }

    pub fn process_compiler(&self) -> ProcessCompiler {
        ProcessCompiler::new(self.compiler.clone(), self.script.clone())
    }
}
