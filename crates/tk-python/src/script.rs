use itertools::Itertools;
use tk_core::ast::{Argument, NamedArgument, NdArray};
use tk_core::ast::render_block;
use tk_core::{ArgumentRegistry, ProgramRenderer, Result, ScriptWriter, TracedKernel};

use crate::options::ScriptOptions;

/// Renders a traced kernel as a Python script that builds a Taichi AOT
/// module holding a one-node dispatch graph.
#[derive(Debug, Clone, Default)]
pub struct TaichiScriptRenderer {
    options: ScriptOptions,
}

impl TaichiScriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ScriptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScriptOptions {
        &self.options
    }

    fn line(w: &mut ScriptWriter, text: impl AsRef<str>) {
        w.write(text);
        w.commit_line();
    }

    fn render_prelude(&self, w: &mut ScriptWriter) {
        Self::line(w, "import taichi as ti");
        w.commit_line();
        Self::line(
            w,
            format!(
                "ti.init({}, offline_cache={})",
                self.options.arch.as_python(),
                py_bool(self.options.offline_cache)
            ),
        );
        w.commit_line();
    }

    fn render_symbols(&self, arguments: &ArgumentRegistry, w: &mut ScriptWriter) {
        for arg in arguments {
            Self::line(w, format!("{} = {}", symbol_name(arg), graph_arg(arg)));
        }
    }

    fn render_kernel(&self, kernel: &TracedKernel, w: &mut ScriptWriter) -> Result<()> {
        let params = kernel
            .arguments
            .iter()
            .map(|arg| format!("{}: {}", arg.name, param_annotation(&arg.argument)))
            .join(", ");
        w.commit_line();
        Self::line(w, "@ti.kernel");
        w.write(format!("def {}({}):", self.options.kernel_name, params));
        render_block(&kernel.body, w)?;
        w.commit_line();
        Ok(())
    }

    fn render_graph(&self, arguments: &ArgumentRegistry, w: &mut ScriptWriter) {
        let dispatch_args = std::iter::once(self.options.kernel_name.clone())
            .chain(arguments.iter().map(symbol_name))
            .join(", ");
        w.commit_line();
        w.commit_line();
        Self::line(w, "g_builder = ti.graph.GraphBuilder()");
        Self::line(w, format!("g_builder.dispatch({dispatch_args})"));
        Self::line(w, "graph = g_builder.compile()");
        w.commit_line();
        Self::line(
            w,
            format!("mod = ti.aot.Module({})", self.options.arch.as_python()),
        );
        Self::line(
            w,
            format!("mod.add_graph({}, graph)", py_str(&self.options.graph_name)),
        );
        Self::line(
            w,
            format!("mod.save({}, '')", py_str(&self.options.module_path)),
        );
        if let Some(transfer) = &self.options.transfer_file {
            w.write(format!("with open({}, 'w') as transfer:", py_str(transfer)));
            w.push_indent();
            w.commit_line();
            w.write(format!(
                "transfer.write({})",
                py_str(&self.options.module_path)
            ));
            w.pop_indent();
            w.commit_line();
        }
    }
}

impl ProgramRenderer for TaichiScriptRenderer {
    fn render_program(&self, kernel: &TracedKernel) -> Result<String> {
        let mut w = ScriptWriter::with_indent_width(self.options.indent_width);
        self.render_prelude(&mut w);
        self.render_symbols(&kernel.arguments, &mut w);
        w.commit_line();
        self.render_kernel(kernel, &mut w)?;
        self.render_graph(&kernel.arguments, &mut w);
        let text = w.finish();
        tk_core::debug!(
            arguments = kernel.arguments.len(),
            bytes = text.len(),
            "rendered taichi script"
        );
        Ok(text)
    }
}

fn symbol_name(arg: &NamedArgument) -> String {
    format!("sym{}", arg.name)
}

fn graph_arg(arg: &NamedArgument) -> String {
    let name = py_str(&arg.name);
    match &arg.argument {
        Argument::I32(_) => format!("ti.graph.Arg(ti.graph.ArgKind.SCALAR, {name}, ti.i32)"),
        Argument::F32(_) => format!("ti.graph.Arg(ti.graph.ArgKind.SCALAR, {name}, ti.f32)"),
        Argument::NdArray(desc) => format!(
            "ti.graph.Arg(ti.graph.ArgKind.NDARRAY, {name}, ti.{}, field_dim={}, element_shape={})",
            desc.elem_type,
            desc.rank(),
            element_shape(desc)
        ),
    }
}

fn param_annotation(argument: &Argument) -> String {
    match argument {
        Argument::I32(_) => "ti.i32".to_string(),
        Argument::F32(_) => "ti.f32".to_string(),
        Argument::NdArray(desc) => format!("ti.types.ndarray(field_dim={})", desc.rank()),
    }
}

fn element_shape(desc: &NdArray) -> String {
    if desc.elem_shape.is_empty() {
        return "()".to_string();
    }
    let dims: String = desc.elem_shape.iter().map(|d| format!("{d}, ")).collect();
    format!("({dims})")
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Single-quoted Python string literal.
pub(crate) fn py_str(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('\'');
    for ch in input.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if (ch as u32) < 0x20 || ch == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", ch as u32));
            }
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}
