//! Typed façade over [`ExprRef`].
//!
//! Arithmetic on these handles only builds expressions. The single place a
//! façade operation has a side effect is [`TraceContext::store`], which
//! commits a `Store` into the innermost frame.

use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};

use crate::ast::{Argument, Expr, ExprRef, NdArray, ScalarKind, Stmt};
use crate::error::Result;
use crate::trace::TraceContext;

/// Anything that wraps an expression node.
pub trait AsExpr {
    fn expr(&self) -> &ExprRef;
}

impl<T: AsExpr + ?Sized> AsExpr for &T {
    fn expr(&self) -> &ExprRef {
        (**self).expr()
    }
}

impl AsExpr for ExprRef {
    fn expr(&self) -> &ExprRef {
        self
    }
}

macro_rules! facade_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            expr: ExprRef,
        }

        impl $name {
            pub fn from_expr(expr: ExprRef) -> Self {
                Self { expr }
            }

            pub fn into_expr(self) -> ExprRef {
                self.expr
            }
        }

        impl AsExpr for $name {
            fn expr(&self) -> &ExprRef {
                &self.expr
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Display::fmt(self.expr.as_ref(), f)
            }
        }
    };
}

facade_value!(
    /// 32-bit integer scalar.
    IntValue
);
facade_value!(
    /// 32-bit float scalar.
    FloatValue
);
facade_value!(
    /// Fixed-size aggregate of scalars.
    VectorValue
);
facade_value!(
    /// An ndarray, or an element of one.
    ArrayValue
);
facade_value!(
    /// Loop induction variable handed to a loop body.
    IterVarValue
);

macro_rules! impl_arith {
    ($ty:ident, $prim:ty, $trait:ident, $method:ident, $ctor:path) => {
        impl $trait for $ty {
            type Output = $ty;
            fn $method(self, rhs: $ty) -> $ty {
                $ty::from_expr($ctor(&self.expr, &rhs.expr))
            }
        }

        impl<'a> $trait<&'a $ty> for &'a $ty {
            type Output = $ty;
            fn $method(self, rhs: &'a $ty) -> $ty {
                $ty::from_expr($ctor(&self.expr, &rhs.expr))
            }
        }

        impl $trait<$prim> for $ty {
            type Output = $ty;
            fn $method(self, rhs: $prim) -> $ty {
                let rhs = $ty::from(rhs);
                $ty::from_expr($ctor(&self.expr, &rhs.expr))
            }
        }

        impl $trait<$prim> for &$ty {
            type Output = $ty;
            fn $method(self, rhs: $prim) -> $ty {
                let rhs = $ty::from(rhs);
                $ty::from_expr($ctor(&self.expr, &rhs.expr))
            }
        }
    };
}

impl_arith!(IntValue, i32, Add, add, Expr::add);
impl_arith!(IntValue, i32, Sub, sub, Expr::sub);
impl_arith!(FloatValue, f32, Add, add, Expr::add);
impl_arith!(FloatValue, f32, Sub, sub, Expr::sub);

impl From<i32> for IntValue {
    fn from(value: i32) -> Self {
        Self::from_expr(Expr::int(value))
    }
}

impl From<f32> for FloatValue {
    fn from(value: f32) -> Self {
        Self::from_expr(Expr::float(value))
    }
}

impl IntValue {
    /// Register `value` as the next kernel argument and bind to it.
    pub fn argument(ctx: &TraceContext, value: i32) -> Result<Self> {
        let name = ctx.register_argument(Argument::I32(value))?;
        Ok(Self::from_expr(Expr::bound_int(name, Some(value))))
    }

    pub fn to_float(&self) -> FloatValue {
        FloatValue::from_expr(Expr::cast(ScalarKind::F32, &self.expr))
    }
}

impl FloatValue {
    pub fn argument(ctx: &TraceContext, value: f32) -> Result<Self> {
        let name = ctx.register_argument(Argument::F32(value))?;
        Ok(Self::from_expr(Expr::bound_float(name, Some(value))))
    }

    /// Rounding is left to the backend.
    pub fn to_int(&self) -> IntValue {
        IntValue::from_expr(Expr::cast(ScalarKind::I32, &self.expr))
    }
}

impl VectorValue {
    pub fn new(elements: impl IntoIterator<Item = ExprRef>) -> Self {
        Self::from_expr(Expr::vector(elements.into_iter().collect()))
    }

    pub fn from_ints<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IntValue>,
    {
        Self::new(items.into_iter().map(|item| item.into().into_expr()))
    }

    pub fn from_floats<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FloatValue>,
    {
        Self::new(items.into_iter().map(|item| item.into().into_expr()))
    }

    pub fn len(&self) -> usize {
        match self.expr.as_ref() {
            Expr::Vector(vector) => vector.elements.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index operand accepted by [`ArrayValue::at`].
#[derive(Debug, Clone)]
pub struct Indices(ExprRef);

impl From<IterVarValue> for Indices {
    fn from(value: IterVarValue) -> Self {
        Indices(value.expr)
    }
}

impl From<&IterVarValue> for Indices {
    fn from(value: &IterVarValue) -> Self {
        Indices(value.expr.clone())
    }
}

impl From<VectorValue> for Indices {
    fn from(value: VectorValue) -> Self {
        Indices(value.expr)
    }
}

impl From<IntValue> for Indices {
    fn from(value: IntValue) -> Self {
        Indices(Expr::vector(vec![value.expr]))
    }
}

impl From<Vec<IntValue>> for Indices {
    fn from(values: Vec<IntValue>) -> Self {
        Indices(VectorValue::from_ints(values).expr)
    }
}

impl<const N: usize> From<[IntValue; N]> for Indices {
    fn from(values: [IntValue; N]) -> Self {
        Indices(VectorValue::from_ints(values).expr)
    }
}

impl<const N: usize> From<[i32; N]> for Indices {
    fn from(values: [i32; N]) -> Self {
        Indices(VectorValue::from_ints(values).expr)
    }
}

impl ArrayValue {
    pub fn argument(ctx: &TraceContext, desc: NdArray) -> Result<Self> {
        let name = ctx.register_argument(Argument::NdArray(desc.clone()))?;
        Ok(Self::from_expr(Expr::array(name, desc)))
    }

    /// Element access; nothing is committed.
    pub fn at(&self, indices: impl Into<Indices>) -> ArrayValue {
        let Indices(index) = indices.into();
        ArrayValue::from_expr(Expr::index(&self.expr, &index))
    }

    /// Descriptor of the bound ndarray, `None` for element handles.
    pub fn desc(&self) -> Option<&NdArray> {
        match self.expr.as_ref() {
            Expr::ArrayBinding(array) => Some(&array.desc),
            _ => None,
        }
    }
}

impl IterVarValue {
    pub fn name(&self) -> &str {
        match self.expr.as_ref() {
            Expr::IterVar(var) => &var.name,
            _ => "",
        }
    }

    /// Integer view of a `range(n)` induction variable.
    pub fn as_int(&self) -> IntValue {
        IntValue::from_expr(self.expr.clone())
    }
}

impl TraceContext {
    /// Build `destination = value` and commit it to the innermost frame.
    pub fn store(&self, destination: &ArrayValue, value: impl AsExpr) -> Result<()> {
        self.commit(Stmt::store(destination.expr(), value.expr()))
    }
}
