/// Crate-level error types for covspec diagnostics.
use std::path::PathBuf;

/// All errors in covspec carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, identifier, or reason for failure.
///
/// Verification outcomes (missing test file, missing test function) are never
/// errors: they travel as reason strings on scenario reports.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `pyproject.toml` exists but is not valid TOML or has a malformed `[tool.covspec]` table.
    #[error("invalid config in {}: {reason}", path.display())]
    ConfigInvalid {
        /// Path to the offending config file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// `--create` was requested without `--first`.
    #[error("--create requires --first: specs are created for one function at a time")]
    CreateRequiresFirst,

    /// A source file passed to the parser does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Source file exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// The project's `.gitignore` could not be turned into a matcher.
    #[error("invalid .gitignore at {}: {reason}", path.display())]
    GitignoreInvalid {
        /// Path to the `.gitignore` file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A target string is neither empty, a `.py` path, nor `path::function`.
    #[error("invalid identifier: `{input}` (expected `path.py` or `path::function`)")]
    InvalidIdentifier {
        /// The string that failed to parse.
        input: String,
    },

    /// A glob exclude pattern is malformed.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Description of the syntax error.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a spec failed.
    #[error("json serialize: {0}")]
    JsonSer(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// Tree-sitter could not be set up or returned no tree.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A spec file exists but does not match the schema.
    #[error("spec invalid: {}: {reason}", path.display())]
    SpecInvalid {
        /// Path to the spec file.
        path: PathBuf,
        /// What is wrong with it, including the offending field when known.
        reason: String,
    },

    /// No spec file exists next to the source file. Callers treat this as
    /// "no coverage info yet".
    #[error("spec not found: {}", path.display())]
    SpecNotFound {
        /// The spec path that was looked up.
        path: PathBuf,
    },

    /// The Python source contains a syntax error.
    #[error("syntax error: {}:{line}:{column}", file.display())]
    SyntaxError {
        /// Zero-based byte column of the first erroneous node.
        column: usize,
        /// File that failed to parse.
        file: PathBuf,
        /// One-based line of the first erroneous node.
        line: usize,
    },

    /// The file has no supported grammar.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },
}
