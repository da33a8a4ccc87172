use std::fmt;

use crate::config;

/// Line-oriented text sink that tracks the current nesting level.
///
/// The writer never emits a newline on its own: callers decide where lines
/// end with [`ScriptWriter::commit_line`], which starts the next line at the
/// indentation in effect at that moment.
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    unit: String,
    indent: String,
    code: String,
}

impl ScriptWriter {
    pub fn new() -> Self {
        Self::with_indent_width(config::indent_width())
    }

    pub fn with_indent_width(width: usize) -> Self {
        Self {
            unit: " ".repeat(width.max(1)),
            indent: String::new(),
            code: String::new(),
        }
    }

    pub fn write(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.code.push_str(text.as_ref());
        self
    }

    pub fn push_indent(&mut self) {
        self.indent.push_str(&self.unit);
    }

    pub fn pop_indent(&mut self) {
        debug_assert!(!self.indent.is_empty(), "pop_indent at depth 0");
        let len = self.indent.len().saturating_sub(self.unit.len());
        self.indent.truncate(len);
    }

    pub fn commit_line(&mut self) {
        self.code.push('\n');
        self.code.push_str(&self.indent);
    }

    pub fn depth(&self) -> usize {
        self.indent.len() / self.unit.len()
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn finish(self) -> String {
        self.code
    }
}

impl Default for ScriptWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for ScriptWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.code.push_str(s);
        Ok(())
    }
}
