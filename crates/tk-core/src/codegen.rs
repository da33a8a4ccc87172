use crate::ast::StmtRef;
use crate::error::Result;
use crate::kernel::TracedKernel;
use crate::writer::ScriptWriter;

/// Backend that turns a traced kernel into program text.
pub trait ProgramRenderer {
    fn render_program(&self, kernel: &TracedKernel) -> Result<String>;

    /// Statements at top level, one per line. Used for logging and tests.
    fn render_stmts(&self, stmts: &[StmtRef]) -> Result<String> {
        let mut w = ScriptWriter::new();
        for (i, stmt) in stmts.iter().enumerate() {
            if i > 0 {
                w.commit_line();
            }
            stmt.render(&mut w)?;
        }
        Ok(w.finish())
    }
}
