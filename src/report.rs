//! Coverage reconciliation: join parsed functions against the file's spec and
//! the live test files, and render the verdict.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::identifier::Identifier;
use crate::parser;
use crate::spec::{FileSpec, FunctionSpec};
use crate::types::Function;
use crate::verifier::{FAIL, PASS, ScenarioReport, Verifier};

/// Marker printed for a file with nothing to cover.
const EMPTY: &str = "🪽";

/// Marker printed for a function with no scenarios.
const WARN: &str = "⚠️";

/// Verdict for one source file.
#[derive(Debug)]
pub struct FileReport {
    /// The source file.
    pub filepath: PathBuf,
    /// The spec loaded for the file, if one exists.
    pub filespec: Option<FileSpec>,
    /// One report per parsed function kept by the filter, in emission order.
    pub functions: Vec<FunctionReport>,
}

impl FileReport {
    /// True when every function is covered. A file with no functions needs
    /// no tests and is covered.
    pub fn covered(&self) -> bool {
        return self.functions.iter().all(FunctionReport::covered);
    }

    /// The first function, in source order, that is not covered.
    pub fn first_uncovered(&self) -> Option<&FunctionReport> {
        return self.functions.iter().find(|f| return !f.covered());
    }

    /// Parse `filepath`, load its spec, and verify every claimed scenario.
    ///
    /// A missing spec is not an error: every function is then uncovered.
    /// When `identifier` names a function, only that function is reported.
    ///
    /// # Errors
    ///
    /// Returns parser errors for the source or a test file, and spec errors
    /// other than `SpecNotFound`.
    pub fn generate(
        filepath: &Path,
        identifier: Option<&Identifier>,
        verifier: &mut Verifier,
    ) -> Result<Self, Error> {
        tracing::debug!("Generating report for {}", filepath.display());
        let functions = parser::parse_file(filepath)?;

        let filespec = match FileSpec::load(filepath) {
            Err(Error::SpecNotFound { .. }) => {
                tracing::debug!("No spec file found for {}", filepath.display());
                None
            },
            Err(e) => return Err(e),
            Ok(spec) => Some(spec),
        };

        let reports = {
            let spec_map = filespec.as_ref().map(FileSpec::function_map).unwrap_or_default();
            let file_testpath = filespec.as_ref().and_then(|s| return s.testpath.as_deref());

            let mut reports = Vec::new();
            for function in functions {
                if identifier.is_some_and(|id| return !id.matches_function(&function)) {
                    continue;
                }
                let function_spec = spec_map.get(function.identifier.as_str()).copied();
                reports.push(FunctionReport::generate(function, function_spec, file_testpath, verifier)?);
            }
            reports
        };
        tracing::debug!("Generated {} function reports", reports.len());

        return Ok(Self {
            filepath: filepath.to_path_buf(),
            filespec,
            functions: reports,
        });
    }

    /// Number of functions that are not covered.
    pub fn uncovered_count(&self) -> usize {
        return self.functions.iter().filter(|f| return !f.covered()).count();
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.filepath.display();
        if self.functions.is_empty() {
            return write!(f, "{EMPTY} {path}");
        }
        if self.covered() {
            return write!(f, "{PASS} {path}");
        }

        write!(f, "{FAIL} {path}:")?;
        for function in &self.functions {
            write!(f, "\n  {function}")?;
        }
        return Ok(());
    }
}

/// Verdict for one function.
#[derive(Debug)]
pub struct FunctionReport {
    /// The parsed function.
    pub function: Function,
    /// One report per declared scenario; empty when no usable spec exists.
    pub scenarios: Vec<ScenarioReport>,
}

impl FunctionReport {
    /// True when at least one scenario exists and all of them passed.
    pub fn covered(&self) -> bool {
        return !self.scenarios.is_empty() && self.scenarios.iter().all(ScenarioReport::passed);
    }

    /// Verify the scenarios declared for `function`.
    ///
    /// With no spec entry, or no test path at function or file level, the
    /// report has no scenarios and is therefore uncovered.
    ///
    /// # Errors
    ///
    /// Returns parser errors from the test files.
    pub fn generate(
        function: Function,
        function_spec: Option<&FunctionSpec>,
        file_testpath: Option<&Path>,
        verifier: &mut Verifier,
    ) -> Result<Self, Error> {
        tracing::debug!(
            "Checking {} (`{}` at {}:{}:{})",
            function.identifier,
            function.name,
            function.filepath.display(),
            function.line,
            function.column
        );
        let Some(spec) = function_spec else {
            return Ok(Self { function, scenarios: Vec::new() });
        };
        let Some(testpath) = spec.testpath.as_deref().or(file_testpath) else {
            return Ok(Self { function, scenarios: Vec::new() });
        };

        let scenarios = spec
            .scenarios
            .iter()
            .map(|scenario| return verifier.verify(scenario, testpath))
            .collect::<Result<Vec<_>, Error>>()?;

        return Ok(Self { function, scenarios });
    }

    /// Number of passing scenarios.
    fn passed_count(&self) -> usize {
        return self.scenarios.iter().filter(|s| return s.passed()).count();
    }
}

impl fmt::Display for FunctionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identifier = &self.function.identifier;
        let total = self.scenarios.len();
        if total == 0 {
            return write!(f, "{WARN} {identifier}: No scenarios defined");
        }

        let passed = self.passed_count();
        if passed == total {
            return write!(f, "{PASS} {identifier}");
        }

        write!(f, "{FAIL} {identifier} ({}):", percentage(passed, total))?;
        for scenario in &self.scenarios {
            write!(f, "\n    {scenario}")?;
        }
        return Ok(());
    }
}

/// Format `part / whole` as a percentage with two decimals, e.g. `33.33%`.
fn percentage(part: usize, whole: usize) -> String {
    let part = f64::from(u32::try_from(part).unwrap_or(u32::MAX));
    let whole = f64::from(u32::try_from(whole).unwrap_or(u32::MAX));
    return format!("{:.2}%", part / whole * 100.0);
}
