// Kernel tracing through the public API: frame discipline, argument naming
// and rendering of the captured statements.

use pretty_assertions::assert_eq;
use tk_core::ast::{Argument, DataType, NdArray, Stmt};
use tk_core::{
    trace_kernel, ArrayValue, Error, FloatValue, IntValue, ProgramRenderer, Result,
    TraceContext, TracedKernel, VectorValue,
};

struct BodyOnly;

impl ProgramRenderer for BodyOnly {
    fn render_program(&self, kernel: &TracedKernel) -> Result<String> {
        self.render_stmts(&kernel.body)
    }
}

fn grid() -> Argument {
    Argument::NdArray(NdArray::new(DataType::F32, vec![8, 8]))
}

#[test]
fn nested_loops_render_with_two_levels() -> Result<()> {
    fn kernel(ctx: &TraceContext, scale: FloatValue, arr: ArrayValue) -> Result<()> {
        ctx.for_each(2, |ctx, i| {
            ctx.for_each(&arr, |ctx, cell| ctx.store(&arr.at(&cell), &scale))?;
            ctx.store(&arr.at([i.as_int(), IntValue::from(0)]), FloatValue::from(0.0_f32))
        })
    }

    let ctx = TraceContext::new();
    let traced = trace_kernel(&ctx, &kernel, &[Argument::F32(2.0), grid()])?;
    assert_eq!(ctx.depth(), 0);

    let (outer, inner) = match traced.body[0].as_ref() {
        Stmt::For(outer) => match outer.body[0].as_ref() {
            Stmt::For(inner) => (outer.induction.to_string(), inner.induction.to_string()),
            other => panic!("expected inner loop, got {other:?}"),
        },
        other => panic!("expected outer loop, got {other:?}"),
    };

    let text = BodyOnly.render_program(&traced)?;
    let expected = [
        format!("for {outer} in range(2):"),
        format!("    for {inner} in ti.grouped(_1):"),
        format!("        _1[{inner}] = (_0)"),
        format!("    _1[({outer}),(0),] = (0.0)"),
    ]
    .join("\n");
    assert_eq!(text, expected);
    Ok(())
}

#[test]
fn arguments_are_named_in_call_order() -> Result<()> {
    fn kernel(_: &TraceContext, _a: FloatValue, _b: ArrayValue, _c: IntValue) -> Result<()> {
        Ok(())
    }

    let ctx = TraceContext::new();
    let traced = trace_kernel(
        &ctx,
        &kernel,
        &[Argument::F32(0.5), grid(), Argument::I32(3)],
    )?;
    assert_eq!(traced.arguments.names(), vec!["_0", "_1", "_2"]);
    assert_eq!(traced.arguments.get(2).map(|a| a.argument.clone()), Some(Argument::I32(3)));
    Ok(())
}

#[test]
fn shared_index_renders_identically_in_every_statement() -> Result<()> {
    fn kernel(ctx: &TraceContext, i: IntValue, src: ArrayValue, dst: ArrayValue) -> Result<()> {
        let idx = [i.clone() + 1, i - 1];
        let element = src.at(idx.clone());
        ctx.store(&dst.at(idx.clone()), &element)?;
        ctx.store(&dst.at(idx), &element)
    }

    let ctx = TraceContext::new();
    let traced = trace_kernel(&ctx, &kernel, &[Argument::I32(1), grid(), grid()])?;
    let first = BodyOnly.render_program(&traced)?;
    let second = BodyOnly.render_program(&traced)?;
    assert_eq!(first, second);

    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
    assert_eq!(lines[0], "_2[((_0+1)),((_0-1)),] = (_1[((_0+1)),((_0-1)),])");
    Ok(())
}

#[test]
fn registering_inside_a_loop_fails_the_trace() {
    fn kernel(ctx: &TraceContext, n: IntValue) -> Result<()> {
        ctx.for_each(n, |ctx, _| {
            let _ = IntValue::argument(ctx, 4)?;
            Ok(())
        })
    }

    let ctx = TraceContext::new();
    let err = trace_kernel(&ctx, &kernel, &[Argument::I32(3)]).unwrap_err();
    match err {
        Error::LeakedArgument { depth, names } => {
            assert_eq!(depth, 2);
            assert_eq!(names.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ctx.is_tracing());
}

#[test]
fn reentrant_kernel_trace_is_rejected() {
    fn outer(ctx: &TraceContext, _n: IntValue) -> Result<()> {
        let nested = TraceContext::new();
        fn inner(_: &TraceContext) -> Result<()> {
            Ok(())
        }
        trace_kernel(&nested, &inner, &[])?;
        let _ = ctx;
        Ok(())
    }

    let ctx = TraceContext::new();
    let err = trace_kernel(&ctx, &outer, &[Argument::I32(1)]).unwrap_err();
    assert!(matches!(err, Error::ReentrantTrace { .. }));
    assert!(!ctx.is_tracing());
}

#[test]
fn threads_trace_independently() {
    fn kernel(ctx: &TraceContext, v: FloatValue, arr: ArrayValue) -> Result<()> {
        ctx.for_each(&arr, |ctx, it| ctx.store(&arr.at(&it), &v))
    }

    let handles: Vec<_> = (0..4)
        .map(|n| {
            std::thread::spawn(move || {
                let ctx = TraceContext::new();
                let traced =
                    trace_kernel(&ctx, &kernel, &[Argument::F32(n as f32), grid()]).unwrap();
                traced.arguments.names().len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}

fn loop_header(traced: &TracedKernel) -> Result<String> {
    let text = BodyOnly.render_program(traced)?;
    Ok(text.lines().next().unwrap_or_default().to_string())
}

#[test]
fn cast_loop_bounds_fold_to_integers() -> Result<()> {
    fn from_float(ctx: &TraceContext, arr: ArrayValue) -> Result<()> {
        ctx.for_each(FloatValue::from(4.0_f32).to_int(), |ctx, i| {
            ctx.store(&arr.at(&i), FloatValue::from(0.0_f32))
        })
    }
    fn round_trip(ctx: &TraceContext, arr: ArrayValue) -> Result<()> {
        ctx.for_each(IntValue::from(3).to_float().to_int(), |ctx, i| {
            ctx.store(&arr.at(&i), FloatValue::from(0.0_f32))
        })
    }
    fn from_argument(ctx: &TraceContext, n: FloatValue, arr: ArrayValue) -> Result<()> {
        ctx.for_each(n.to_int(), |ctx, i| ctx.store(&arr.at(&i), &n))
    }

    let ctx = TraceContext::new();
    let traced = trace_kernel(&ctx, &from_float, &[grid()])?;
    assert!(loop_header(&traced)?.ends_with(" in range(4):"));

    let traced = trace_kernel(&ctx, &round_trip, &[grid()])?;
    assert!(loop_header(&traced)?.ends_with(" in range(3):"));

    let traced = trace_kernel(&ctx, &from_argument, &[Argument::F32(2.0), grid()])?;
    assert!(loop_header(&traced)?.ends_with(" in range(ti.i32(_0)):"));
    Ok(())
}

#[test]
fn vector_range_loops_over_ndrange() -> Result<()> {
    fn kernel(ctx: &TraceContext, v: FloatValue, arr: ArrayValue) -> Result<()> {
        ctx.for_each(VectorValue::from_ints([4, 8]), |ctx, it| ctx.store(&arr.at(&it), &v))
    }

    let ctx = TraceContext::new();
    let traced = trace_kernel(&ctx, &kernel, &[Argument::F32(1.0), grid()])?;
    let it = match traced.body[0].as_ref() {
        Stmt::For(stmt) => stmt.induction.to_string(),
        other => panic!("expected loop, got {other:?}"),
    };
    let text = BodyOnly.render_program(&traced)?;
    assert_eq!(text, format!("for {it} in ti.ndrange(4, 8):\n    _1[{it}] = (_0)"));
    Ok(())
}

#[test]
fn storing_a_vector_renders_a_vector_literal() -> Result<()> {
    fn kernel(ctx: &TraceContext, i: IntValue, f: FloatValue, arr: ArrayValue) -> Result<()> {
        let value = VectorValue::new([f.into_expr(), FloatValue::from(2.5_f32).into_expr()]);
        ctx.store(&arr.at(i), &value)?;
        ctx.store(&arr.at([0, 1]), VectorValue::from_floats([1.0_f32, 0.5]))
    }

    let ctx = TraceContext::new();
    let grid = Argument::NdArray(NdArray::new(DataType::F32, vec![8]).with_elem_shape(vec![2]));
    let traced = trace_kernel(&ctx, &kernel, &[Argument::I32(3), Argument::F32(1.5), grid])?;
    let text = BodyOnly.render_program(&traced)?;
    assert_eq!(
        text,
        "_2[(_0),] = (ti.Vector([_1, 2.5]))\n_2[(0),(1),] = (ti.Vector([1.0, 0.5]))"
    );
    Ok(())
}
