use pretty_assertions::assert_eq;
use tk_core::ast::{Argument, DataType, Expr, NamedArgument, NdArray, Stmt};
use tk_core::{ArgumentRegistry, ProgramRenderer, TracedKernel};

use super::script::py_str;
use super::{Arch, ScriptOptions, TaichiScriptRenderer};

fn kernel_with(arguments: Vec<Argument>, body: Vec<tk_core::ast::StmtRef>) -> TracedKernel {
    let arguments = arguments
        .into_iter()
        .enumerate()
        .map(|(i, arg)| NamedArgument::new(format!("_{i}"), arg))
        .collect::<Vec<_>>();
    TracedKernel {
        arguments: ArgumentRegistry::from(arguments),
        body,
    }
}

#[test]
fn empty_kernel_renders_pass_and_bare_dispatch() {
    let renderer = TaichiScriptRenderer::new();
    let rendered = renderer
        .render_program(&kernel_with(vec![], vec![]))
        .expect("render");

    assert!(rendered.contains("@ti.kernel\ndef f():\n    pass\n"));
    assert!(rendered.contains("g_builder.dispatch(f)\n"));
    assert!(!rendered.contains("sym_"));
}

#[test]
fn symbols_describe_each_argument() {
    let grid = NdArray::new(DataType::F32, vec![4, 4]).with_elem_shape(vec![2]);
    let kernel = kernel_with(
        vec![Argument::I32(1), Argument::F32(1.5), Argument::NdArray(grid)],
        vec![],
    );
    let rendered = TaichiScriptRenderer::new()
        .render_program(&kernel)
        .expect("render");

    assert!(rendered.contains("sym_0 = ti.graph.Arg(ti.graph.ArgKind.SCALAR, '_0', ti.i32)\n"));
    assert!(rendered.contains("sym_1 = ti.graph.Arg(ti.graph.ArgKind.SCALAR, '_1', ti.f32)\n"));
    assert!(rendered.contains(
        "sym_2 = ti.graph.Arg(ti.graph.ArgKind.NDARRAY, '_2', ti.f32, field_dim=2, element_shape=(2, ))\n"
    ));
    assert!(rendered.contains(
        "def f(_0: ti.i32, _1: ti.f32, _2: ti.types.ndarray(field_dim=2)):"
    ));
    assert!(rendered.contains("g_builder.dispatch(f, sym_0, sym_1, sym_2)\n"));
}

#[test]
fn scalar_element_shape_is_an_empty_tuple() {
    let kernel = kernel_with(
        vec![Argument::NdArray(NdArray::new(DataType::I32, vec![16]))],
        vec![],
    );
    let rendered = TaichiScriptRenderer::new()
        .render_program(&kernel)
        .expect("render");
    assert!(rendered.contains("ti.i32, field_dim=1, element_shape=())"));
}

#[test]
fn options_drive_names_and_arch() {
    let options = ScriptOptions {
        arch: Arch::Metal,
        offline_cache: true,
        kernel_name: "fill".to_string(),
        graph_name: "fill_graph".to_string(),
        module_path: "out/fill".to_string(),
        transfer_file: Some("out/fill.path".to_string()),
        indent_width: 2,
    };
    let body = vec![Stmt::store(
        &Expr::index(&Expr::array("_0", NdArray::new(DataType::F32, vec![8])), &Expr::vector(vec![Expr::int(0)])),
        &Expr::float(1.0),
    )];
    let kernel = kernel_with(
        vec![Argument::NdArray(NdArray::new(DataType::F32, vec![8]))],
        body,
    );
    let rendered = TaichiScriptRenderer::with_options(options)
        .render_program(&kernel)
        .expect("render");

    assert!(rendered.contains("ti.init(ti.metal, offline_cache=True)\n"));
    assert!(rendered.contains("def fill(_0: ti.types.ndarray(field_dim=1)):\n  _0[(0),] = (1.0)\n"));
    assert!(rendered.contains("g_builder.dispatch(fill, sym_0)\n"));
    assert!(rendered.contains("mod = ti.aot.Module(ti.metal)\n"));
    assert!(rendered.contains("mod.add_graph('fill_graph', graph)\n"));
    assert!(rendered.contains("mod.save('out/fill', '')\n"));
    assert!(rendered.ends_with(
        "with open('out/fill.path', 'w') as transfer:\n  transfer.write('out/fill')\n"
    ));
}

#[test]
fn python_literals_are_escaped() {
    assert_eq!(py_str("module"), "'module'");
    assert_eq!(py_str("it's"), "'it\\'s'");
    assert_eq!(py_str("C:\\tmp\n"), "'C:\\\\tmp\\n'");
    assert_eq!(py_str("\u{1}"), "'\\x01'");
}

#[test]
fn arch_names_match_taichi() {
    assert_eq!(Arch::default().as_python(), "ti.vulkan");
    assert_eq!(Arch::X64.as_python(), "ti.x64");
    assert_eq!(Arch::Arm64.as_python(), "ti.arm64");
}
