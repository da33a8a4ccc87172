use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::ast::{NdArray, ScalarKind};
use crate::error::{Error, Result};
use crate::writer::ScriptWriter;

pub type ExprRef = Arc<Expr>;

static NEXT_ITER_VAR: AtomicUsize = AtomicUsize::new(0);

/// Result of folding a constant expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    I32(i32),
    F32(f32),
}

impl ConstValue {
    pub fn as_i32(self) -> i32 {
        match self {
            ConstValue::I32(value) => value,
            ConstValue::F32(value) => value as i32,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            ConstValue::I32(value) => value as f32,
            ConstValue::F32(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
}

impl BinOpKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
        }
    }
}

/// Integer literal. With `bound` set it stands for a kernel argument and
/// `value` is the snapshot taken at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprIntLiteral {
    pub value: Option<i32>,
    pub bound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprFloatLiteral {
    pub value: Option<f32>,
    pub bound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprBinOp {
    pub kind: BinOpKind,
    pub lhs: ExprRef,
    pub rhs: ExprRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprIterVar {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprIndex {
    pub base: ExprRef,
    pub index: ExprRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprVector {
    pub elements: Vec<ExprRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprArrayBinding {
    pub name: String,
    pub desc: NdArray,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprCast {
    pub target: ScalarKind,
    pub operand: ExprRef,
}

/// Immutable expression node. Nodes are shared through [`ExprRef`] and may
/// appear under several parents; they hold no back-references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum Expr {
    IntLiteral(ExprIntLiteral),
    FloatLiteral(ExprFloatLiteral),
    BinOp(ExprBinOp),
    IterVar(ExprIterVar),
    Index(ExprIndex),
    Vector(ExprVector),
    ArrayBinding(ExprArrayBinding),
    Cast(ExprCast),
}

impl Expr {
    pub fn int(value: i32) -> ExprRef {
        Arc::new(Expr::IntLiteral(ExprIntLiteral {
            value: Some(value),
            bound: None,
        }))
    }

    pub fn bound_int(name: impl Into<String>, value: Option<i32>) -> ExprRef {
        Arc::new(Expr::IntLiteral(ExprIntLiteral {
            value,
            bound: Some(name.into()),
        }))
    }

    pub fn float(value: f32) -> ExprRef {
        Arc::new(Expr::FloatLiteral(ExprFloatLiteral {
            value: Some(value),
            bound: None,
        }))
    }

    pub fn bound_float(name: impl Into<String>, value: Option<f32>) -> ExprRef {
        Arc::new(Expr::FloatLiteral(ExprFloatLiteral {
            value,
            bound: Some(name.into()),
        }))
    }

    pub fn binary(kind: BinOpKind, lhs: &ExprRef, rhs: &ExprRef) -> ExprRef {
        Arc::new(Expr::BinOp(ExprBinOp {
            kind,
            lhs: Arc::clone(lhs),
            rhs: Arc::clone(rhs),
        }))
    }

    pub fn add(lhs: &ExprRef, rhs: &ExprRef) -> ExprRef {
        Self::binary(BinOpKind::Add, lhs, rhs)
    }

    pub fn sub(lhs: &ExprRef, rhs: &ExprRef) -> ExprRef {
        Self::binary(BinOpKind::Sub, lhs, rhs)
    }

    /// Allocate an induction variable with a process-wide unique name.
    pub fn iter_var() -> ExprRef {
        let id = NEXT_ITER_VAR.fetch_add(1, Ordering::Relaxed);
        Arc::new(Expr::IterVar(ExprIterVar {
            name: format!("it_{id}"),
        }))
    }

    pub fn index(base: &ExprRef, index: &ExprRef) -> ExprRef {
        Arc::new(Expr::Index(ExprIndex {
            base: Arc::clone(base),
            index: Arc::clone(index),
        }))
    }

    pub fn vector(elements: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::Vector(ExprVector { elements }))
    }

    pub fn array(name: impl Into<String>, desc: NdArray) -> ExprRef {
        Arc::new(Expr::ArrayBinding(ExprArrayBinding {
            name: name.into(),
            desc,
        }))
    }

    pub fn cast(target: ScalarKind, operand: &ExprRef) -> ExprRef {
        Arc::new(Expr::Cast(ExprCast {
            target,
            operand: Arc::clone(operand),
        }))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLiteral(_) => "int literal",
            Expr::FloatLiteral(_) => "float literal",
            Expr::BinOp(_) => "binary op",
            Expr::IterVar(_) => "iteration variable",
            Expr::Index(_) => "index",
            Expr::Vector(_) => "vector",
            Expr::ArrayBinding(_) => "array binding",
            Expr::Cast(_) => "cast",
        }
    }

    /// True when the expression mentions no kernel argument and no
    /// induction variable, so it can be folded at trace time.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::IntLiteral(lit) => lit.bound.is_none(),
            Expr::FloatLiteral(lit) => lit.bound.is_none(),
            Expr::BinOp(op) => op.lhs.is_constant() && op.rhs.is_constant(),
            Expr::Vector(vector) => vector.elements.iter().all(|e| e.is_constant()),
            Expr::Cast(cast) => cast.operand.is_constant(),
            Expr::IterVar(_) | Expr::Index(_) | Expr::ArrayBinding(_) => false,
        }
    }

    /// Fold a constant subtree. Mixed int/float arithmetic is done in f32;
    /// casts to i32 truncate toward zero.
    pub fn evaluate(&self) -> Result<ConstValue> {
        match self {
            Expr::IntLiteral(lit) => lit.value.map(ConstValue::I32).ok_or_else(|| {
                Error::malformed("int literal", missing_value(lit.bound.as_deref()))
            }),
            Expr::FloatLiteral(lit) => lit.value.map(ConstValue::F32).ok_or_else(|| {
                Error::malformed("float literal", missing_value(lit.bound.as_deref()))
            }),
            Expr::BinOp(op) => {
                let lhs = op.lhs.evaluate()?;
                let rhs = op.rhs.evaluate()?;
                Ok(match (lhs, rhs) {
                    (ConstValue::I32(l), ConstValue::I32(r)) => ConstValue::I32(match op.kind {
                        BinOpKind::Add => l.wrapping_add(r),
                        BinOpKind::Sub => l.wrapping_sub(r),
                    }),
                    (l, r) => ConstValue::F32(match op.kind {
                        BinOpKind::Add => l.as_f32() + r.as_f32(),
                        BinOpKind::Sub => l.as_f32() - r.as_f32(),
                    }),
                })
            }
            Expr::Cast(cast) => {
                let value = cast.operand.evaluate()?;
                Ok(match cast.target {
                    ScalarKind::I32 => ConstValue::I32(value.as_i32()),
                    ScalarKind::F32 => ConstValue::F32(value.as_f32()),
                })
            }
            other => Err(Error::malformed(other.kind_name(), "not a constant expression")),
        }
    }

    pub fn evaluate_i32(&self) -> Result<i32> {
        match self.evaluate()? {
            ConstValue::I32(value) => Ok(value),
            ConstValue::F32(_) => Err(Error::malformed(self.kind_name(), "not an i32 expression")),
        }
    }

    pub fn evaluate_f32(&self) -> Result<f32> {
        match self.evaluate()? {
            ConstValue::F32(value) => Ok(value),
            ConstValue::I32(_) => Err(Error::malformed(self.kind_name(), "not an f32 expression")),
        }
    }

    pub fn render(&self, w: &mut ScriptWriter) -> Result<()> {
        match self {
            Expr::IntLiteral(lit) => match (&lit.bound, lit.value) {
                (Some(name), _) => {
                    w.write(name);
                }
                (None, Some(value)) => {
                    w.write(value.to_string());
                }
                (None, None) => {
                    return Err(Error::malformed(
                        "int literal",
                        "neither a value nor a bound name",
                    ))
                }
            },
            Expr::FloatLiteral(lit) => match (&lit.bound, lit.value) {
                (Some(name), _) => {
                    w.write(name);
                }
                (None, Some(value)) => {
                    w.write(render_f32(value));
                }
                (None, None) => {
                    return Err(Error::malformed(
                        "float literal",
                        "neither a value nor a bound name",
                    ))
                }
            },
            Expr::BinOp(op) => {
                w.write("(");
                op.lhs.render(w)?;
                w.write(op.kind.symbol());
                op.rhs.render(w)?;
                w.write(")");
            }
            Expr::IterVar(var) => {
                w.write(&var.name);
            }
            Expr::Index(index) => {
                index.base.render(w)?;
                w.write("[");
                match index.index.as_ref() {
                    Expr::Vector(vector) if vector.elements.is_empty() => {
                        w.write("None");
                    }
                    Expr::Vector(vector) => {
                        for elem in &vector.elements {
                            w.write("(");
                            elem.render(w)?;
                            w.write("),");
                        }
                    }
                    other => other.render(w)?,
                }
                w.write("]");
            }
            Expr::Vector(vector) => {
                w.write("ti.Vector([");
                for (i, elem) in vector.elements.iter().enumerate() {
                    if i > 0 {
                        w.write(", ");
                    }
                    elem.render(w)?;
                }
                w.write("])");
            }
            Expr::ArrayBinding(array) => {
                w.write(&array.name);
            }
            Expr::Cast(cast) => {
                w.write(format!("ti.{}(", cast.target));
                cast.operand.render(w)?;
                w.write(")");
            }
        }
        Ok(())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut w = ScriptWriter::with_indent_width(4);
        self.render(&mut w).map_err(|_| std::fmt::Error)?;
        f.write_str(w.as_str())
    }
}

fn missing_value(bound: Option<&str>) -> String {
    match bound {
        Some(name) => format!("bound argument `{name}` carries no value"),
        None => "literal has no value".to_string(),
    }
}

fn render_f32(value: f32) -> String {
    if value.is_nan() {
        "float('nan')".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        }
    } else {
        // Debug keeps a fractional part so the backend sees a float literal
        format!("{value:?}")
    }
}
