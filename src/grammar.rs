/// Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Suffix shared by every file the inventory parser understands.
pub const SOURCE_SUFFIX: &str = ".py";

/// Map a file extension to its tree-sitter language.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for anything that is not Python.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "py" => Ok(tree_sitter_python::LANGUAGE.into()),
        _ => Err(Error::UnsupportedLanguage {
            ext: ext.to_string(),
        }),
    };
}

/// Whether a path names a Python source file.
pub fn is_source_path(path: &Path) -> bool {
    return path.extension().is_some_and(|ext| return ext == "py");
}
