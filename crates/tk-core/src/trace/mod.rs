//! Scoped tracing context.
//!
//! Kernel bodies never append statements to a block themselves: every
//! statement is committed to whichever frame is innermost when it is built.
//! Loop bodies get their own frame through [`TraceContext::for_each`], and
//! the frame is folded back into a single `for` statement when the body
//! returns.

mod looping;
mod registry;

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::ast::{Argument, NamedArgument, StmtRef};
use crate::error::{Error, Result};

pub use looping::IntoRange;
pub use registry::ArgumentRegistry;

thread_local! {
    static ROOT_OPEN: Cell<bool> = const { Cell::new(false) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Kernel body; owns the argument registry.
    Root,
    /// Body of one loop.
    Loop,
}

#[derive(Debug)]
struct ScopeFrame {
    kind: FrameKind,
    stmts: Vec<StmtRef>,
    leaked: Vec<NamedArgument>,
}

impl ScopeFrame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            stmts: Vec::new(),
            leaked: Vec::new(),
        }
    }
}

/// What a closed frame produced. `arguments` is only set for the root frame.
#[derive(Debug)]
pub struct TraceOutput {
    pub arguments: Option<ArgumentRegistry>,
    pub stmts: Vec<StmtRef>,
}

/// Frame stack plus argument registry for one kernel trace at a time.
///
/// The context is neither `Send` nor `Sync`; a thread may hold several
/// contexts but only one of them can have a root trace open.
pub struct TraceContext {
    frames: RefCell<Vec<ScopeFrame>>,
    registry: RefCell<ArgumentRegistry>,
    owns_root: Cell<bool>,
    _not_send: PhantomData<*const ()>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
            registry: RefCell::new(ArgumentRegistry::new()),
            owns_root: Cell::new(false),
            _not_send: PhantomData,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_tracing(&self) -> bool {
        !self.frames.borrow().is_empty()
    }

    /// Snapshot of the arguments registered so far in the open root trace.
    pub fn arguments(&self) -> ArgumentRegistry {
        self.registry.borrow().clone()
    }

    pub fn begin_trace(&self, kind: FrameKind) -> Result<()> {
        let mut frames = self.frames.borrow_mut();
        match kind {
            FrameKind::Root => {
                if !frames.is_empty() {
                    return Err(Error::ReentrantTrace {
                        depth: frames.len(),
                    });
                }
                if ROOT_OPEN.with(|open| open.get()) {
                    return Err(Error::ReentrantTrace { depth: 0 });
                }
                ROOT_OPEN.with(|open| open.set(true));
                self.owns_root.set(true);
                self.registry.borrow_mut().reset();
            }
            FrameKind::Loop => {
                if frames.is_empty() {
                    return Err(Error::NoActiveScope {
                        operation: "open a loop frame",
                    });
                }
            }
        }
        frames.push(ScopeFrame::new(kind));
        trace!(depth = frames.len(), ?kind, "frame opened");
        Ok(())
    }

    /// Register an external argument and return its synthesized name.
    ///
    /// Only the root frame may register; a registration made while a loop
    /// frame is innermost is held on that frame and reported when it closes.
    pub fn register_argument(&self, argument: Argument) -> Result<String> {
        let mut frames = self.frames.borrow_mut();
        let depth = frames.len();
        let frame = frames.last_mut().ok_or(Error::NoActiveScope {
            operation: "register an argument",
        })?;
        let mut registry = self.registry.borrow_mut();
        let name = registry.next_name();
        let kind = argument.kind();
        let named = NamedArgument::new(name.clone(), argument);
        match frame.kind {
            FrameKind::Root => registry.push(named),
            FrameKind::Loop => frame.leaked.push(named),
        }
        trace!(depth, %name, %kind, "argument registered");
        Ok(name)
    }

    pub fn commit(&self, stmt: StmtRef) -> Result<()> {
        let mut frames = self.frames.borrow_mut();
        let depth = frames.len();
        let frame = frames.last_mut().ok_or(Error::NoActiveScope {
            operation: "commit a statement",
        })?;
        trace!(depth, kind = stmt.kind_name(), "statement committed");
        frame.stmts.push(stmt);
        Ok(())
    }

    pub fn end_trace(&self) -> Result<TraceOutput> {
        let (frame, depth) = {
            let mut frames = self.frames.borrow_mut();
            let depth = frames.len();
            let frame = frames
                .pop()
                .ok_or(Error::UnbalancedTrace { depth, expected: 1 })?;
            (frame, depth)
        };
        trace!(depth, kind = ?frame.kind, stmts = frame.stmts.len(), "frame closed");
        match frame.kind {
            FrameKind::Root => {
                self.release_root();
                let arguments = std::mem::take(&mut *self.registry.borrow_mut());
                Ok(TraceOutput {
                    arguments: Some(arguments),
                    stmts: frame.stmts,
                })
            }
            FrameKind::Loop => {
                if !frame.leaked.is_empty() {
                    return Err(Error::LeakedArgument {
                        depth,
                        names: frame.leaked.into_iter().map(|arg| arg.name).collect(),
                    });
                }
                Ok(TraceOutput {
                    arguments: None,
                    stmts: frame.stmts,
                })
            }
        }
    }

    /// Drop every open frame after a fatal error.
    pub fn abort(&self) {
        let dropped = {
            let mut frames = self.frames.borrow_mut();
            let dropped = frames.len();
            frames.clear();
            dropped
        };
        self.registry.borrow_mut().reset();
        self.release_root();
        if dropped > 0 {
            debug!(frames = dropped, "trace aborted");
        }
    }

    fn release_root(&self) {
        if self.owns_root.replace(false) {
            ROOT_OPEN.with(|open| open.set(false));
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TraceContext {
    fn drop(&mut self) {
        if self.is_tracing() {
            warn!(depth = self.depth(), "trace context dropped with open frames");
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};

    fn dummy_store() -> StmtRef {
        Stmt::store(&Expr::int(0), &Expr::int(1))
    }

    #[test]
    fn root_trace_returns_to_idle() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        ctx.begin_trace(FrameKind::Loop).unwrap();
        assert_eq!(ctx.depth(), 2);
        ctx.end_trace().unwrap();
        let out = ctx.end_trace().unwrap();
        assert!(out.arguments.is_some());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn commit_lands_in_innermost_frame() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        ctx.commit(dummy_store()).unwrap();
        ctx.begin_trace(FrameKind::Loop).unwrap();
        ctx.commit(dummy_store()).unwrap();
        ctx.commit(dummy_store()).unwrap();
        let inner = ctx.end_trace().unwrap();
        let root = ctx.end_trace().unwrap();
        assert_eq!(inner.stmts.len(), 2);
        assert!(inner.arguments.is_none());
        assert_eq!(root.stmts.len(), 1);
    }

    #[test]
    fn commit_without_frame_fails() {
        let ctx = TraceContext::new();
        let err = ctx.commit(dummy_store()).unwrap_err();
        assert!(matches!(err, Error::NoActiveScope { .. }));
    }

    #[test]
    fn second_root_on_same_context_is_reentrant() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        let err = ctx.begin_trace(FrameKind::Root).unwrap_err();
        assert!(matches!(err, Error::ReentrantTrace { depth: 1 }));
        ctx.end_trace().unwrap();
    }

    #[test]
    fn second_context_on_same_thread_is_reentrant() {
        let first = TraceContext::new();
        let second = TraceContext::new();
        first.begin_trace(FrameKind::Root).unwrap();
        assert!(matches!(
            second.begin_trace(FrameKind::Root),
            Err(Error::ReentrantTrace { .. })
        ));
        first.end_trace().unwrap();
        second.begin_trace(FrameKind::Root).unwrap();
        second.end_trace().unwrap();
    }

    #[test]
    fn dropping_an_open_context_releases_the_thread() {
        {
            let ctx = TraceContext::new();
            ctx.begin_trace(FrameKind::Root).unwrap();
        }
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        ctx.end_trace().unwrap();
    }

    #[test]
    fn loop_frame_requires_open_root() {
        let ctx = TraceContext::new();
        assert!(matches!(
            ctx.begin_trace(FrameKind::Loop),
            Err(Error::NoActiveScope { .. })
        ));
    }

    #[test]
    fn unbalanced_end_is_reported() {
        let ctx = TraceContext::new();
        assert!(matches!(
            ctx.end_trace(),
            Err(Error::UnbalancedTrace { depth: 0, .. })
        ));
    }

    #[test]
    fn names_follow_registration_order() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        let names = [
            ctx.register_argument(Argument::F32(0.5)).unwrap(),
            ctx.register_argument(Argument::I32(3)).unwrap(),
            ctx.register_argument(Argument::F32(1.0)).unwrap(),
        ];
        assert_eq!(names, ["_0", "_1", "_2"]);
        let out = ctx.end_trace().unwrap();
        assert_eq!(out.arguments.unwrap().names(), vec!["_0", "_1", "_2"]);
    }

    #[test]
    fn registering_inside_loop_leaks() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        ctx.register_argument(Argument::I32(1)).unwrap();
        let before = ctx.arguments();
        ctx.begin_trace(FrameKind::Loop).unwrap();
        ctx.register_argument(Argument::I32(2)).unwrap();
        let err = ctx.end_trace().unwrap_err();
        match err {
            Error::LeakedArgument { depth, names } => {
                assert_eq!(depth, 2);
                assert_eq!(names, vec!["_1".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctx.arguments().names(), before.names());
        ctx.abort();
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn root_registry_is_reset_per_trace() {
        let ctx = TraceContext::new();
        ctx.begin_trace(FrameKind::Root).unwrap();
        ctx.register_argument(Argument::I32(1)).unwrap();
        ctx.end_trace().unwrap();

        ctx.begin_trace(FrameKind::Root).unwrap();
        assert_eq!(ctx.register_argument(Argument::I32(5)).unwrap(), "_0");
        let out = ctx.end_trace().unwrap();
        assert_eq!(out.arguments.unwrap().len(), 1);
    }
}
