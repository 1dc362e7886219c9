/// Core domain types shared by the parser, the spec store, and the reports.
use std::path::PathBuf;

/// Separator joining enclosing class and function names into an identifier.
pub const SCOPE_SEPARATOR: &str = "::";

/// One function or method definition discovered in a source file.
/// Produced fresh on every parse, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Zero-based byte column of the definition keyword.
    pub column: usize,
    /// File the function was found in.
    pub filepath: PathBuf,
    /// Enclosing class/function names plus `name`, joined by `::`.
    /// Unique within one file.
    pub identifier: String,
    /// One-based line of the definition keyword.
    pub line: usize,
    /// Bare function name.
    pub name: String,
}
