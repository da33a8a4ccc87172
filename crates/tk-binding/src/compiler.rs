use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tk_python::ScriptOptions;

use crate::config::CompilerConfig;
use crate::error::{BindingError, Result};
use crate::handoff::ArtifactHandoff;

/// A compiled module together with the graph to launch from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub module_path: PathBuf,
    pub graph_name: String,
}

/// Turns generated program text into a loadable artifact.
pub trait Compiler {
    fn compile(&self, program: &str) -> Result<Artifact>;

    /// Script options the compiler depends on (transfer file, module path,
    /// graph name). When set, kernels render with these instead of their own.
    fn script_options(&self) -> Option<&ScriptOptions> {
        None
    }
}

static SCRIPT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Runs the generated script with an external interpreter.
///
/// The script is written into the work directory and run from there, so
/// relative module and transfer paths resolve inside it.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    config: CompilerConfig,
    script: ScriptOptions,
}

impl ProcessCompiler {
    pub fn new(config: CompilerConfig, script: ScriptOptions) -> Self {
        Self { config, script }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn script_path(&self) -> PathBuf {
        let n = SCRIPT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let file = format!(
            "{}_{}_{}.py",
            self.script.kernel_name,
            std::process::id(),
            n
        );
        self.config.work_dir.join(file)
    }

    fn handoff(&self) -> Option<ArtifactHandoff> {
        self.script
            .transfer_file
            .as_ref()
            .map(|file| ArtifactHandoff::new(self.config.work_dir.join(file)))
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.work_dir.join(path)
        }
    }

    fn discard_script(&self, script: &Path) {
        if self.config.keep_script {
            return;
        }
        if let Err(e) = fs::remove_file(script) {
            tk_core::warn!(path = %script.display(), error = %e, "failed to remove generated script");
        }
    }

    fn run(&self, script: &Path, handoff: Option<&ArtifactHandoff>) -> Result<Artifact> {
        let file_name = script
            .file_name()
            .ok_or_else(|| BindingError::Config(format!("bad script path {}", script.display())))?;

        tk_core::debug!(
            program = %self.config.program,
            script = %script.display(),
            "running script compiler"
        );
        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(file_name)
            .current_dir(&self.config.work_dir)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tk_core::warn!(status = %output.status, %stderr, "script compiler failed");
            return Err(BindingError::Compile {
                status: output.status.to_string(),
                stderr,
            });
        }

        let location = match handoff {
            Some(handoff) => handoff.read()?,
            None => self.script.module_path.clone(),
        };
        let module_path = self.resolve(&location);
        if !module_path.exists() {
            let reported = handoff
                .map(|h| h.path().to_path_buf())
                .unwrap_or_else(|| module_path.clone());
            return Err(BindingError::handoff(
                reported,
                format!("artifact {} does not exist", module_path.display()),
            ));
        }

        Ok(Artifact {
            module_path,
            graph_name: self.script.graph_name.clone(),
        })
    }
}

impl Compiler for ProcessCompiler {
    fn script_options(&self) -> Option<&ScriptOptions> {
        Some(&self.script)
    }

    fn compile(&self, program: &str) -> Result<Artifact> {
        fs::create_dir_all(&self.config.work_dir)?;
        let handoff = self.handoff();
        if let Some(handoff) = &handoff {
            handoff.cleanup()?;
        }

        let script = self.script_path();
        fs::write(&script, program)?;

        let result = self.run(&script, handoff.as_ref());
        let cleaned = match &handoff {
            Some(handoff) => handoff.cleanup(),
            None => Ok(()),
        };
        if result.is_ok() {
            self.discard_script(&script);
        } else {
            tk_core::debug!(script = %script.display(), "keeping script of failed compile");
        }

        let artifact = result?;
        cleaned?;
        tk_core::info!(
            module = %artifact.module_path.display(),
            graph = %artifact.graph_name,
            "compiled kernel module"
        );
        Ok(artifact)
    }
}
