use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the project file the configuration is read from.
pub const PYPROJECT: &str = "pyproject.toml";

/// Project configuration loaded from the `[tool.covspec]` table of `pyproject.toml`.
/// Exclude patterns are globs matched against paths relative to the project root.
#[derive(Debug, Default)]
pub struct Config {
    /// Glob patterns for source files that never need specs.
    exclude: Vec<String>,
}

/// The `[tool.covspec]` table.
#[derive(Debug, Default, serde::Deserialize)]
struct CovspecTable {
    /// Root-relative glob patterns to skip.
    #[serde(default)]
    exclude: Vec<String>,
}

/// Raw TOML structure for `pyproject.toml`; every other table is ignored.
#[derive(Debug, Default, serde::Deserialize)]
struct PyprojectToml {
    /// The `[tool]` table.
    #[serde(default)]
    tool: ToolTable,
}

/// The `[tool]` table of `pyproject.toml`.
#[derive(Debug, Default, serde::Deserialize)]
struct ToolTable {
    /// Our own section, absent in most projects.
    #[serde(default)]
    covspec: CovspecTable,
}

impl Config {
    /// Exclude patterns in declaration order.
    pub fn exclude(&self) -> &[String] {
        return &self.exclude;
    }

    /// Load config from `pyproject.toml` in the given root directory.
    /// Returns a default that excludes nothing if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::ConfigInvalid` if the TOML is malformed or `exclude` is not
    /// a list of strings.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(PYPROJECT);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} at {}, using defaults", PYPROJECT, root.display());
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let config = Self::parse(&path, &content)?;
        tracing::debug!("Loaded {} exclude patterns", config.exclude.len());
        return Ok(config);
    }

    /// Parse `pyproject.toml` content. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` if the TOML or the table shape is wrong.
    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        let raw: PyprojectToml = toml::from_str(content).map_err(|e| {
            return Error::ConfigInvalid {
                path: PathBuf::from(path),
                reason: e.to_string(),
            };
        })?;
        return Ok(Self {
            exclude: raw.tool.covspec.exclude,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config, Error> {
        return Config::parse(Path::new(PYPROJECT), content);
    }

    #[test]
    fn missing_file_excludes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.exclude().is_empty());
    }

    #[test]
    fn loads_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PYPROJECT),
            "[tool.covspec]\nexclude = [\"*_test.py\", \"conftest.py\"]\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.exclude(), ["*_test.py", "conftest.py"]);
    }

    #[test]
    fn missing_section_excludes_nothing() {
        let config = parse("[project]\nname = \"test\"\n\n[tool.ruff]\nline-length = 100\n").unwrap();
        assert!(config.exclude().is_empty());
    }

    #[test]
    fn empty_exclude_list() {
        assert!(parse("[tool.covspec]\nexclude = []\n").unwrap().exclude().is_empty());
    }

    #[test]
    fn non_list_exclude_is_invalid() {
        let err = parse("[tool.covspec]\nexclude = \"not a list\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn malformed_toml_is_invalid() {
        let err = parse("[tool.covspec\nexclude = [").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { path, .. } if path == Path::new(PYPROJECT)));
    }
}
