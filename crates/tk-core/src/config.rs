use std::sync::OnceLock;

const DEFAULT_INDENT: usize = 4;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Log every traced kernel as JSON at debug level (`TRACEKERN_DUMP_AST`).
pub fn dump_ast() -> bool {
    static DUMP: OnceLock<bool> = OnceLock::new();
    *DUMP.get_or_init(|| bool_from_env("TRACEKERN_DUMP_AST"))
}

/// Spaces per nesting level for writers built with `ScriptWriter::new`
/// (`TRACEKERN_INDENT`, default 4).
pub fn indent_width() -> usize {
    static INDENT: OnceLock<usize> = OnceLock::new();
    *INDENT.get_or_init(|| {
        std::env::var("TRACEKERN_INDENT")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|width| *width > 0)
            .unwrap_or(DEFAULT_INDENT)
    })
}
