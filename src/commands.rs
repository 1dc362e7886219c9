//! Core CLI workflows for covspec: report every file, show the first gap, author its spec.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::error::Error;
use crate::filters::{CompositeFilter, ConfigFilter, ExactFilter, FileFilter, GitignoreFilter, PatternFilter};
use crate::identifier::Identifier;
use crate::report::{FileReport, FunctionReport};
use crate::spec::FileSpec;
use crate::types::SCOPE_SEPARATOR;
use crate::verifier::{FAIL, Verifier};
use crate::walker;

/// Which workflow a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print only the first uncovered function.
    First,
    /// Add a placeholder spec entry for the first uncovered function.
    FirstCreate,
    /// Print every file report.
    Report,
}

impl Mode {
    /// Combine the `--first` and `--create` flags.
    ///
    /// # Errors
    ///
    /// Returns `Error::CreateRequiresFirst` for `--create` without `--first`.
    pub const fn from_flags(first: bool, create: bool) -> Result<Self, Error> {
        return match (first, create) {
            (false, false) => Ok(Self::Report),
            (false, true) => Err(Error::CreateRequiresFirst),
            (true, false) => Ok(Self::First),
            (true, true) => Ok(Self::FirstCreate),
        };
    }
}

/// How a run ended. Each outcome maps to one process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every reported function is covered, or `--first` found no gap.
    Covered,
    /// A placeholder spec entry was written.
    Created,
    /// At least one reported function is not covered.
    Uncovered,
}

impl Outcome {
    /// Exit code: 0 for covered or created, 1 for uncovered.
    pub fn exit_code(self) -> ExitCode {
        return match self {
            Self::Covered | Self::Created => ExitCode::SUCCESS,
            Self::Uncovered => ExitCode::from(1),
        };
    }
}

/// Assemble the filters for a run rooted at `root`: default test-file
/// patterns, `[tool.covspec] exclude`, the root `.gitignore` when present, and
/// the target file when one is given.
///
/// # Errors
///
/// Returns config, gitignore, or glob pattern errors.
pub fn build_filter(root: &Path, target: Option<&Identifier>) -> Result<CompositeFilter, Error> {
    let config = Config::load(root)?;

    let mut filter = CompositeFilter::new();
    filter.add(Box::new(PatternFilter::with_defaults()?));
    filter.add(Box::new(ConfigFilter::new(root, &config)?));
    if let Some(gitignore) = GitignoreFilter::load(root)? {
        filter.add(Box::new(gitignore));
    }
    if let Some(identifier) = target {
        tracing::debug!("Restricting run to {}", identifier.filepath.display());
        filter.add(Box::new(ExactFilter::new(&identifier.filepath)));
    }
    return Ok(filter);
}

/// Lazily produce one report per source file under `root` that `filter` keeps.
/// Nothing is parsed until the iterator is advanced.
pub fn generate_reports<'a>(
    root: &'a Path,
    target: Option<&'a Identifier>,
    filter: &'a dyn FileFilter,
    verifier: &'a mut Verifier,
) -> impl Iterator<Item = Result<FileReport, Error>> + 'a {
    return walker::source_files(root, filter).map(move |path| return FileReport::generate(&path, target, verifier));
}

/// Run one workflow over the project at `root`, writing results to `out`.
///
/// The first per-file error aborts the run; reports written before it stay written.
///
/// # Errors
///
/// Returns `Error::FileNotFound` for a target file that does not exist, and
/// any filter, parser, spec, or write error.
pub fn run(root: &Path, target: Option<&Identifier>, mode: Mode, out: &mut impl Write) -> Result<Outcome, Error> {
    if let Some(identifier) = target.filter(|id| return !id.filepath.exists()) {
        return Err(Error::FileNotFound {
            path: identifier.filepath.clone(),
        });
    }

    let filter = build_filter(root, target)?;
    let mut verifier = Verifier::new();
    let reports = generate_reports(root, target, &filter, &mut verifier);

    return match mode {
        Mode::First => first_uncovered(reports, false, out),
        Mode::FirstCreate => first_uncovered(reports, true, out),
        Mode::Report => report_all(reports, out),
    };
}

/// Add a placeholder entry for `function` to the spec of `report`'s file and save it.
/// A function that already has an entry is printed instead, since its
/// scenarios exist but are not proven yet.
///
/// # Errors
///
/// Returns write or spec save errors.
fn create_spec(report: &FileReport, function: &FunctionReport, out: &mut impl Write) -> Result<Outcome, Error> {
    let identifier = &function.function.identifier;
    let existing = report.filespec.as_ref().and_then(|spec| return spec.function(identifier));
    if existing.is_some() {
        tracing::info!("{identifier} already has a spec entry, nothing to create");
        write_first(report, function, out)?;
        return Ok(Outcome::Uncovered);
    }

    let spec = report.filespec.as_ref().map_or_else(
        || return FileSpec::create(&report.filepath, &function.function),
        |loaded| {
            let mut spec = loaded.clone();
            spec.filepath.clone_from(&report.filepath);
            spec.add(&function.function);
            return spec;
        },
    );
    let spec_path = spec.save()?;

    writeln!(
        out,
        "Created spec for {}{SCOPE_SEPARATOR}{identifier} at {}",
        report.filepath.display(),
        spec_path.display()
    )?;
    return Ok(Outcome::Created);
}

/// Stop at the first uncovered function in walk order and print it, or
/// author its spec entry when `create` is set. Prints nothing when every
/// function is covered.
///
/// # Errors
///
/// Returns the first report error, or write and spec save errors.
fn first_uncovered(
    reports: impl Iterator<Item = Result<FileReport, Error>>,
    create: bool,
    out: &mut impl Write,
) -> Result<Outcome, Error> {
    for report in reports {
        let report = report?;
        let Some(function) = report.first_uncovered() else {
            continue;
        };
        if create {
            return create_spec(&report, function, out);
        }
        write_first(&report, function, out)?;
        return Ok(Outcome::Uncovered);
    }
    tracing::info!("No uncovered functions");
    return Ok(Outcome::Covered);
}

/// Print every file report in walk order and log the uncovered total.
///
/// # Errors
///
/// Returns the first report error or a write error.
fn report_all(reports: impl Iterator<Item = Result<FileReport, Error>>, out: &mut impl Write) -> Result<Outcome, Error> {
    let mut files = 0_usize;
    let mut uncovered = 0_usize;
    for report in reports {
        let report = report?;
        writeln!(out, "{report}")?;
        uncovered = uncovered.saturating_add(report.uncovered_count());
        files = files.saturating_add(1);
    }
    tracing::info!("Reported on {files} files, {uncovered} uncovered functions");

    if uncovered == 0 {
        return Ok(Outcome::Covered);
    }
    return Ok(Outcome::Uncovered);
}

/// Print one uncovered function under its file header.
///
/// # Errors
///
/// Returns `Error::Io` if writing fails.
fn write_first(report: &FileReport, function: &FunctionReport, out: &mut impl Write) -> Result<(), Error> {
    writeln!(out, "{FAIL} {}:", report.filepath.display())?;
    writeln!(out, "  {function}")?;
    return Ok(());
}
