use std::path::Path;

use crate::config::PYPROJECT;
use crate::error::Error;

/// ANSI bold, used for markdown headings on stderr.
const BOLD: &str = "\x1b[1m";

/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print it to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened and,
/// where there is one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { path, reason } => render_config_invalid(path, reason),
        Error::CreateRequiresFirst => render_create_requires_first(),
        Error::FileTooLarge { file, max_bytes, size_bytes } => render_file_too_large(file, *size_bytes, *max_bytes),
        Error::InvalidIdentifier { input } => render_invalid_identifier(input),
        Error::SpecInvalid { path, reason } => render_spec_invalid(path, reason),
        Error::SyntaxError { column, file, line } => render_syntax_error(file, *line, *column),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        Error::FileNotFound { .. }
        | Error::GitignoreInvalid { .. }
        | Error::InvalidPattern { .. }
        | Error::Io(_)
        | Error::JsonSer(_)
        | Error::ParseFailed { .. }
        | Error::SpecNotFound { .. } => render_generic(e),
    };
}

/// Errors that need no more than a heading and a sentence.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::GitignoreInvalid { path, reason } => format!("\
# Error: Invalid .gitignore

Could not read `{}`: {reason}
", path.display()),

        Error::InvalidPattern { pattern, reason } => format!("\
# Error: Invalid Exclude Pattern

`{pattern}` is not a valid glob: {reason}

## Fix

Correct the pattern in `[tool.covspec] exclude` of `{PYPROJECT}`.
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),

        Error::JsonSer(e) => format!("\
# Error: JSON Serialization

{e}
"),

        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),

        Error::SpecNotFound { path } => format!("\
# Error: Spec Not Found

`{}` does not exist.

## Fix

    covspec --first --create
", path.display()),

        _ => format!("\
# Error

{e}
"),
    };
}

/// `pyproject.toml` could not be read as configuration.
fn render_config_invalid(path: &Path, reason: &str) -> String {
    return format!("\
# Error: Invalid Config

`{}` could not be read: {reason}

## Fix

The `[tool.covspec]` table takes one key:

    [tool.covspec]
    exclude = [\"generated/*.py\"]
", path.display());
}

/// `--create` given on its own.
fn render_create_requires_first() -> String {
    return "\
# Error: --create Requires --first

Specs are created for one function at a time: the first uncovered one.

## Fix

    covspec --first --create
"
    .to_string();
}

/// A source file over the size limit.
fn render_file_too_large(file: &Path, size_bytes: u64, max_bytes: u64) -> String {
    return format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).

## Fix

Exclude it in `[tool.covspec] exclude` of `{PYPROJECT}`.
", file.display());
}

/// A `--target` that cannot be parsed.
fn render_invalid_identifier(input: &str) -> String {
    return format!("\
# Error: Invalid Target

`{input}` is neither a `.py` path nor `path::function`.

## Fix

Name a whole file or one function in it:

    covspec --target pkg/module.py
    covspec --target pkg/module.py::MyClass::method
");
}

/// A spec file that does not match the schema.
fn render_spec_invalid(path: &Path, reason: &str) -> String {
    return format!("\
# Error: Invalid Spec

`{}`: {reason}

## Expected shape

    {{
      \"filepath\": \"pkg/module.py\",
      \"testpath\": \"pkg/module_test.py\",
      \"functions\": [
        {{
          \"identifier\": \"MyClass::method\",
          \"scenarios\": [{{\"testname\": \"test_method\", \"description\": \"...\"}}]
        }}
      ]
    }}
", path.display());
}

/// A Python file that tree-sitter could not parse cleanly.
fn render_syntax_error(file: &Path, line: usize, column: usize) -> String {
    return format!("\
# Error: Syntax Error

`{}` has a syntax error at line {line}, column {column}.

## Fix

Fix the file, or exclude it in `[tool.covspec] exclude` of `{PYPROJECT}`.
", file.display());
}

/// A file without a grammar.
fn render_unsupported_language(ext: &str) -> String {
    return format!("\
# Error: Unsupported Language

No tree-sitter grammar for `.{ext}` files. Only `.py` files are parsed.
");
}
