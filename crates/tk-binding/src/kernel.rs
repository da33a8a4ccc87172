use std::marker::PhantomData;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tk_core::ast::{ArgKind, Argument, NamedArgument};
use tk_core::{trace_kernel, KernelFn, ProgramRenderer, TraceContext};
use tk_python::{ScriptOptions, TaichiScriptRenderer};

use crate::compiler::{Artifact, Compiler};
use crate::error::{BindingError, Result};

/// Rendered program text plus the ordered launch signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProgram {
    pub text: String,
    pub signature: Vec<(String, ArgKind)>,
}

/// A host function registered as a kernel.
pub struct Kernel<F, P> {
    func: F,
    renderer: TaichiScriptRenderer,
    _params: PhantomData<fn() -> P>,
}

pub fn to_kernel<F, P>(func: F) -> Kernel<F, P>
where
    F: KernelFn<P>,
{
    Kernel {
        func,
        renderer: TaichiScriptRenderer::new(),
        _params: PhantomData,
    }
}

impl<F, P> Kernel<F, P>
where
    F: KernelFn<P>,
{
    pub fn with_options(mut self, options: ScriptOptions) -> Self {
        self.renderer = TaichiScriptRenderer::with_options(options);
        self
    }

    pub fn options(&self) -> &ScriptOptions {
        self.renderer.options()
    }

    pub fn param_kinds(&self) -> Vec<ArgKind> {
        self.func.param_kinds()
    }

    /// Trace on a fresh context and render the script.
    pub fn codegen(&self, args: &[Argument]) -> Result<GeneratedProgram> {
        let ctx = TraceContext::new();
        self.codegen_with(&ctx, args)
    }

    pub fn codegen_with(&self, ctx: &TraceContext, args: &[Argument]) -> Result<GeneratedProgram> {
        self.generate(ctx, args, &self.renderer)
    }

    /// Trace, render and compile. Script options reported by the compiler
    /// take precedence over the kernel's.
    pub fn compile(&self, args: &[Argument], compiler: &dyn Compiler) -> Result<CompiledKernel> {
        let ctx = TraceContext::new();
        let program = match compiler.script_options() {
            Some(options) => {
                let renderer = TaichiScriptRenderer::with_options(options.clone());
                self.generate(&ctx, args, &renderer)?
            }
            None => self.codegen_with(&ctx, args)?,
        };
        let artifact = compiler.compile(&program.text)?;
        Ok(CompiledKernel {
            artifact,
            signature: program.signature,
        })
    }

    fn generate(
        &self,
        ctx: &TraceContext,
        args: &[Argument],
        renderer: &TaichiScriptRenderer,
    ) -> Result<GeneratedProgram> {
        let traced = trace_kernel(ctx, &self.func, args)?;
        let text = renderer.render_program(&traced)?;
        let signature = traced.signature();
        tk_core::debug!(
            kernel = %renderer.options().kernel_name,
            signature = %signature.iter().map(|(name, kind)| format!("{name}: {kind}")).join(", "),
            "generated kernel program"
        );
        Ok(GeneratedProgram { text, signature })
    }
}

/// Result of compiling a kernel: the artifact and its launch slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledKernel {
    pub artifact: Artifact,
    pub signature: Vec<(String, ArgKind)>,
}

impl CompiledKernel {
    /// Pair runtime values with their slot names, in slot order.
    pub fn launch_arguments(&self, args: &[Argument]) -> Result<Vec<NamedArgument>> {
        if args.len() != self.signature.len() {
            return Err(tk_core::Error::ArityMismatch {
                expected: self.signature.len(),
                actual: args.len(),
            }
            .into());
        }
        self.signature
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, ((name, kind), argument))| {
                if argument.kind() != *kind {
                    return Err(BindingError::from(tk_core::Error::ArgumentKind {
                        index,
                        expected: kind.as_str(),
                        actual: argument.kind().as_str(),
                    }));
                }
                Ok(NamedArgument::new(name.clone(), argument.clone()))
            })
            .collect()
    }
}
