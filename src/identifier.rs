//! Compact `file::function` addressing used to scope a run.

use std::fmt;
use std::path::PathBuf;

use crate::error::Error;
use crate::grammar::SOURCE_SUFFIX;
use crate::types::{Function, SCOPE_SEPARATOR};

/// A file, or one function inside a file, to restrict analysis to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The source file.
    pub filepath: PathBuf,
    /// Qualified function identifier; empty means every function in the file.
    pub function_identifier: String,
}

impl Identifier {
    /// Whether this identifier keeps `function` in a report.
    pub fn matches_function(&self, function: &Function) -> bool {
        return self.function_identifier.is_empty() || function.identifier == self.function_identifier;
    }

    /// Parse `""`, `path.py`, or `path::qualified::name`.
    ///
    /// An empty string means no filter. A string ending in `.py` scopes to the
    /// whole file. Anything else is split on the first `::`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` when a non-empty, non-`.py` string
    /// has no `::` separator.
    pub fn parse(input: &str) -> Result<Option<Self>, Error> {
        if input.is_empty() {
            return Ok(None);
        }

        if input.ends_with(SOURCE_SUFFIX) {
            return Ok(Some(Self {
                filepath: PathBuf::from(input),
                function_identifier: String::new(),
            }));
        }

        let Some((filepath, function_identifier)) = input.split_once(SCOPE_SEPARATOR) else {
            return Err(Error::InvalidIdentifier { input: input.to_string() });
        };

        return Ok(Some(Self {
            filepath: PathBuf::from(filepath),
            function_identifier: function_identifier.to_string(),
        }));
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function_identifier.is_empty() {
            return write!(f, "{}", self.filepath.display());
        }
        return write!(f, "{}{SCOPE_SEPARATOR}{}", self.filepath.display(), self.function_identifier);
    }
}
