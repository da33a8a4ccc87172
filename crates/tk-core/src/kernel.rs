//! Tracing a host function into a kernel.

use serde::{Deserialize, Serialize};

use crate::ast::{ArgKind, Argument, StmtRef};
use crate::config;
use crate::error::{Error, Result};
use crate::trace::{ArgumentRegistry, FrameKind, TraceContext};
use crate::value::{ArrayValue, FloatValue, IntValue};

/// Output of one complete trace: the registered arguments and the root
/// statement sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedKernel {
    pub arguments: ArgumentRegistry,
    pub body: Vec<StmtRef>,
}

impl TracedKernel {
    pub fn signature(&self) -> Vec<(String, ArgKind)> {
        self.arguments.signature()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A kernel parameter type that can be bound to a runtime argument.
pub trait KernelParam: Sized {
    const KIND: ArgKind;

    fn bind(ctx: &TraceContext, index: usize, argument: &Argument) -> Result<Self>;
}

fn kind_error(index: usize, expected: ArgKind, argument: &Argument) -> Error {
    Error::ArgumentKind {
        index,
        expected: expected.as_str(),
        actual: argument.kind().as_str(),
    }
}

impl KernelParam for IntValue {
    const KIND: ArgKind = ArgKind::I32;

    fn bind(ctx: &TraceContext, index: usize, argument: &Argument) -> Result<Self> {
        match argument {
            Argument::I32(value) => IntValue::argument(ctx, *value),
            other => Err(kind_error(index, Self::KIND, other)),
        }
    }
}

impl KernelParam for FloatValue {
    const KIND: ArgKind = ArgKind::F32;

    fn bind(ctx: &TraceContext, index: usize, argument: &Argument) -> Result<Self> {
        match argument {
            Argument::F32(value) => FloatValue::argument(ctx, *value),
            other => Err(kind_error(index, Self::KIND, other)),
        }
    }
}

impl KernelParam for ArrayValue {
    const KIND: ArgKind = ArgKind::NdArray;

    fn bind(ctx: &TraceContext, index: usize, argument: &Argument) -> Result<Self> {
        match argument {
            Argument::NdArray(desc) => ArrayValue::argument(ctx, desc.clone()),
            other => Err(kind_error(index, Self::KIND, other)),
        }
    }
}

/// Host functions `Fn(&TraceContext, P0, P1, ...) -> Result<()>` usable as
/// kernels. `Params` is the tuple of parameter types and only serves to
/// keep the blanket impls apart.
pub trait KernelFn<Params> {
    fn param_kinds(&self) -> Vec<ArgKind>;

    fn arity(&self) -> usize {
        self.param_kinds().len()
    }

    /// Bind `args` in order and run the body. The root frame must be open.
    fn invoke(&self, ctx: &TraceContext, args: &[Argument]) -> Result<()>;
}

macro_rules! impl_kernel_fn {
    ($(($param:ident, $value:ident)),*) => {
        impl<Func, $($param,)*> KernelFn<($($param,)*)> for Func
        where
            Func: Fn(&TraceContext, $($param),*) -> Result<()>,
            $($param: KernelParam,)*
        {
            fn param_kinds(&self) -> Vec<ArgKind> {
                vec![$($param::KIND),*]
            }

            #[allow(unused_variables, unused_mut)]
            fn invoke(&self, ctx: &TraceContext, args: &[Argument]) -> Result<()> {
                let expected = self.arity();
                if args.len() != expected {
                    return Err(Error::ArityMismatch {
                        expected,
                        actual: args.len(),
                    });
                }
                let mut slots = args.iter().enumerate();
                $(
                    let Some((index, argument)) = slots.next() else {
                        return Err(Error::ArityMismatch { expected, actual: args.len() });
                    };
                    let $value = $param::bind(ctx, index, argument)?;
                )*
                (self)(ctx, $($value),*)
            }
        }
    };
}

impl_kernel_fn!();
impl_kernel_fn!((P0, p0));
impl_kernel_fn!((P0, p0), (P1, p1));
impl_kernel_fn!((P0, p0), (P1, p1), (P2, p2));
impl_kernel_fn!((P0, p0), (P1, p1), (P2, p2), (P3, p3));
impl_kernel_fn!((P0, p0), (P1, p1), (P2, p2), (P3, p3), (P4, p4));
impl_kernel_fn!((P0, p0), (P1, p1), (P2, p2), (P3, p3), (P4, p4), (P5, p5));
impl_kernel_fn!(
    (P0, p0),
    (P1, p1),
    (P2, p2),
    (P3, p3),
    (P4, p4),
    (P5, p5),
    (P6, p6)
);
impl_kernel_fn!(
    (P0, p0),
    (P1, p1),
    (P2, p2),
    (P3, p3),
    (P4, p4),
    (P5, p5),
    (P6, p6),
    (P7, p7)
);

/// Check `args` against the kernel's parameters without tracing anything.
pub fn check_arguments<F, P>(kernel: &F, args: &[Argument]) -> Result<()>
where
    F: KernelFn<P>,
{
    let kinds = kernel.param_kinds();
    if kinds.len() != args.len() {
        return Err(Error::ArityMismatch {
            expected: kinds.len(),
            actual: args.len(),
        });
    }
    for (index, (expected, argument)) in kinds.iter().zip(args).enumerate() {
        if *expected != argument.kind() {
            return Err(kind_error(index, *expected, argument));
        }
    }
    Ok(())
}

/// Run one root trace of `kernel` over `args` on `ctx`.
///
/// Any failure after the root frame is open aborts the trace, leaving `ctx`
/// idle again.
pub fn trace_kernel<F, P>(ctx: &TraceContext, kernel: &F, args: &[Argument]) -> Result<TracedKernel>
where
    F: KernelFn<P>,
{
    check_arguments(kernel, args)?;
    ctx.begin_trace(FrameKind::Root)?;

    let traced = kernel.invoke(ctx, args).and_then(|()| {
        let depth = ctx.depth();
        if depth != 1 {
            return Err(Error::UnbalancedTrace { depth, expected: 1 });
        }
        ctx.end_trace()
    });

    let output = match traced {
        Ok(output) => output,
        Err(err) => {
            ctx.abort();
            return Err(err);
        }
    };

    let traced = TracedKernel {
        arguments: output.arguments.unwrap_or_default(),
        body: output.stmts,
    };
    debug!(
        arguments = traced.arguments.len(),
        stmts = traced.body.len(),
        "kernel traced"
    );
    if config::dump_ast() {
        debug!(ast = %traced.to_json()?, "traced kernel ast");
    }
    Ok(traced)
}
