//! File filters deciding which Python files are left out of a run.
//!
//! Every filter answers one question, `is_ignored(path)`. A `CompositeFilter`
//! fans out to several filters and ignores a path as soon as one of them does.
//!
//! - `PatternFilter`: glob patterns, by default the usual test-file layouts
//! - `ConfigFilter`: `[tool.covspec] exclude` globs, relative to the project root
//! - `GitignoreFilter`: the root `.gitignore`
//! - `ExactFilter`: everything except one file

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::Config;
use crate::error::Error;

/// Test files and virtual environments never need specs of their own.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "**/test_*.py",
    "**/tests.py",
    "**/test/*.py",
    "**/tests/*.py",
    "**/*_test.py",
    "**/conftest.py",
    "**/.venv/**",
];

/// Decides whether a candidate source path is skipped.
pub trait FileFilter {
    /// True when `path` must not be reported on.
    fn is_ignored(&self, path: &Path) -> bool;
}

/// Ignores a path when any of its filters does. Checks stop at the first hit.
#[derive(Default)]
pub struct CompositeFilter {
    /// Filters in the order they were added.
    filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
    /// Append another filter.
    pub fn add(&mut self, filter: Box<dyn FileFilter>) {
        self.filters.push(filter);
    }

    /// A composite that ignores nothing.
    pub fn new() -> Self {
        return Self::default();
    }
}

impl FileFilter for CompositeFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        return self.filters.iter().any(|filter| return filter.is_ignored(path));
    }
}

/// Excludes the `[tool.covspec] exclude` globs, matched against the path
/// relative to the project root. Paths outside the root are never ignored.
pub struct ConfigFilter {
    /// Compiled exclude patterns.
    patterns: GlobSet,
    /// Project root the patterns are relative to.
    root: PathBuf,
}

impl ConfigFilter {
    /// Compile the exclude patterns of `config` for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if a pattern is not a valid glob.
    pub fn new(root: &Path, config: &Config) -> Result<Self, Error> {
        return Ok(Self {
            patterns: build_glob_set(config.exclude())?,
            root: root.to_path_buf(),
        });
    }
}

impl FileFilter for ConfigFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        let Some(relative) = relative_to(&self.root, path) else {
            tracing::debug!("Could not determine relative path for {}", path.display());
            return false;
        };
        let ignored = self.patterns.is_match(&relative);
        if ignored {
            tracing::debug!("Path {} matched an exclude pattern", relative.display());
        }
        return ignored;
    }
}

/// Ignores every path except one file.
pub struct ExactFilter {
    /// The only file kept, normalised.
    filepath: PathBuf,
}

impl ExactFilter {
    /// Keep only `filepath`.
    pub fn new(filepath: &Path) -> Self {
        return Self {
            filepath: comparable(filepath),
        };
    }
}

impl FileFilter for ExactFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        return comparable(path) != self.filepath;
    }
}

/// Applies the project's root `.gitignore`. Paths outside the root are never ignored.
pub struct GitignoreFilter {
    /// Compiled `.gitignore` rules.
    matcher: Gitignore,
    /// Directory holding the `.gitignore`.
    root: PathBuf,
}

impl GitignoreFilter {
    /// Load `<root>/.gitignore`. Returns `Ok(None)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns `Error::GitignoreInvalid` if the file cannot be read or compiled.
    pub fn load(root: &Path) -> Result<Option<Self>, Error> {
        let path = root.join(".gitignore");
        if !path.exists() {
            return Ok(None);
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(e) = builder.add(&path) {
            return Err(Error::GitignoreInvalid { path, reason: e.to_string() });
        }
        let matcher = builder.build().map_err(|e| {
            return Error::GitignoreInvalid {
                path: path.clone(),
                reason: e.to_string(),
            };
        })?;

        tracing::debug!("Loaded {} gitignore rules from {}", matcher.num_ignores(), path.display());
        return Ok(Some(Self {
            matcher,
            root: root.to_path_buf(),
        }));
    }
}

impl FileFilter for GitignoreFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        let Some(relative) = relative_to(&self.root, path) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        return self.matcher.matched_path_or_any_parents(&relative, false).is_ignore();
    }
}

/// Ignores paths matching any of a set of glob patterns, applied to the path as given.
pub struct PatternFilter {
    /// Compiled patterns.
    patterns: GlobSet,
}

impl PatternFilter {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if a pattern is not a valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Error> {
        return Ok(Self {
            patterns: build_glob_set(patterns)?,
        });
    }

    /// The default test-file patterns.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` only if the built-in list is broken.
    pub fn with_defaults() -> Result<Self, Error> {
        return Self::new(DEFAULT_PATTERNS);
    }
}

impl FileFilter for PatternFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        return self.patterns.is_match(path);
    }
}

/// Build a `GlobSet` from a list of pattern strings.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` naming the first pattern that fails to compile.
fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern).map_err(|e| {
            return Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            };
        })?;
        builder.add(glob);
    }

    return builder.build().map_err(|e| {
        return Error::InvalidPattern {
            pattern: "<combined>".to_string(),
            reason: e.to_string(),
        };
    });
}

/// Absolute, normalised form of a path for equality checks.
fn comparable(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());
    return normalize_path(&absolute);
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let can_pop = matches!(components.last(), Some(c) if !matches!(c, Component::ParentDir | Component::RootDir));
                if can_pop {
                    components.pop();
                } else {
                    components.push(component);
                }
            },
            other => components.push(other),
        }
    }
    return components.iter().collect();
}

/// `path` relative to `root`, trying the paths as given first and their
/// absolute forms second.
fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }
    let root = comparable(root);
    let path = comparable(path);
    return path.strip_prefix(&root).ok().map(Path::to_path_buf);
}
