use std::sync::Arc;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, ExprRef};
use crate::error::{Error, Result};
use crate::writer::ScriptWriter;

pub type StmtRef = Arc<Stmt>;

/// How a loop walks its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopKind {
    /// Every index of an ndarray, the induction variable is an index vector.
    Grouped,
    /// Cartesian product of the extents in a vector.
    NdRange,
    /// `0..n` over an integer count.
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtStore {
    pub destination: ExprRef,
    pub value: ExprRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtFor {
    pub induction: ExprRef,
    pub range: ExprRef,
    pub kind: LoopKind,
    pub body: Vec<StmtRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum Stmt {
    Store(StmtStore),
    For(StmtFor),
}

impl Stmt {
    pub fn store(destination: &ExprRef, value: &ExprRef) -> StmtRef {
        Arc::new(Stmt::Store(StmtStore {
            destination: Arc::clone(destination),
            value: Arc::clone(value),
        }))
    }

    pub fn for_loop(
        induction: &ExprRef,
        range: &ExprRef,
        kind: LoopKind,
        body: Vec<StmtRef>,
    ) -> StmtRef {
        Arc::new(Stmt::For(StmtFor {
            induction: Arc::clone(induction),
            range: Arc::clone(range),
            kind,
            body,
        }))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Store(_) => "store",
            Stmt::For(_) => "for",
        }
    }

    pub fn render(&self, w: &mut ScriptWriter) -> Result<()> {
        match self {
            Stmt::Store(store) => {
                store.destination.render(w)?;
                w.write(" = (");
                store.value.render(w)?;
                w.write(")");
                Ok(())
            }
            Stmt::For(stmt) => {
                if !matches!(stmt.induction.as_ref(), Expr::IterVar(_)) {
                    return Err(Error::malformed(
                        stmt.induction.kind_name(),
                        "loop induction must be an iteration variable",
                    ));
                }
                w.write("for ");
                stmt.induction.render(w)?;
                w.write(" in ");
                render_range(stmt, w)?;
                w.write(":");
                render_block(&stmt.body, w)
            }
        }
    }
}

fn render_range(stmt: &StmtFor, w: &mut ScriptWriter) -> Result<()> {
    match stmt.kind {
        LoopKind::Grouped => {
            w.write("ti.grouped(");
            stmt.range.render(w)?;
        }
        LoopKind::NdRange => {
            w.write("ti.ndrange(");
            match stmt.range.as_ref() {
                Expr::Vector(vector) => {
                    for (i, extent) in vector.elements.iter().enumerate() {
                        if i > 0 {
                            w.write(", ");
                        }
                        extent.render(w)?;
                    }
                }
                other => {
                    w.write("*");
                    other.render(w)?;
                }
            }
        }
        LoopKind::Scalar => {
            w.write("range(");
            match stmt.range.is_constant().then(|| stmt.range.evaluate_i32()) {
                Some(Ok(bound)) => {
                    w.write(bound.to_string());
                }
                _ => stmt.range.render(w)?,
            }
        }
    }
    w.write(")");
    Ok(())
}

/// Render `stmts` as an indented block below a header the caller has
/// already written. The writer ends on the last body line with the
/// enclosing indentation restored.
pub fn render_block(stmts: &[StmtRef], w: &mut ScriptWriter) -> Result<()> {
    w.push_indent();
    w.commit_line();
    if stmts.is_empty() {
        w.write("pass");
    }
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            w.commit_line();
        }
        stmt.render(w)?;
    }
    w.pop_indent();
    Ok(())
}
