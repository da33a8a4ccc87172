use crate::ast::{Expr, ExprRef, LoopKind, Stmt};
use crate::error::{Error, Result};
use crate::trace::{FrameKind, TraceContext};
use crate::value::{ArrayValue, AsExpr, IntValue, IterVarValue, VectorValue};

/// Values a loop can iterate over.
pub trait IntoRange {
    fn into_range(self) -> (ExprRef, LoopKind);
}

impl IntoRange for ArrayValue {
    fn into_range(self) -> (ExprRef, LoopKind) {
        (self.into_expr(), LoopKind::Grouped)
    }
}

impl IntoRange for &ArrayValue {
    fn into_range(self) -> (ExprRef, LoopKind) {
        (self.expr().clone(), LoopKind::Grouped)
    }
}

impl IntoRange for VectorValue {
    fn into_range(self) -> (ExprRef, LoopKind) {
        (self.into_expr(), LoopKind::NdRange)
    }
}

impl IntoRange for IntValue {
    fn into_range(self) -> (ExprRef, LoopKind) {
        (self.into_expr(), LoopKind::Scalar)
    }
}

impl IntoRange for i32 {
    fn into_range(self) -> (ExprRef, LoopKind) {
        (Expr::int(self), LoopKind::Scalar)
    }
}

impl TraceContext {
    /// Trace `body` as the body of a loop over `range`.
    ///
    /// The body runs once, in a fresh frame, with the induction variable;
    /// whatever it commits becomes the loop body, and the loop itself is
    /// committed to the enclosing frame.
    pub fn for_each<R, F>(&self, range: R, body: F) -> Result<()>
    where
        R: IntoRange,
        F: FnOnce(&TraceContext, IterVarValue) -> Result<()>,
    {
        let (range, kind) = range.into_range();
        let induction = Expr::iter_var();

        self.begin_trace(FrameKind::Loop)?;
        let depth = self.depth();
        body(self, IterVarValue::from_expr(induction.clone()))?;
        if self.depth() != depth {
            return Err(Error::UnbalancedTrace {
                depth: self.depth(),
                expected: depth,
            });
        }
        let frame = self.end_trace()?;
        debug_assert!(frame.arguments.is_none());

        self.commit(Stmt::for_loop(&induction, &range, kind, frame.stmts))
    }
}
