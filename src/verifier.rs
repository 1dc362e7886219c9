//! Scenario verification: does the claimed test function actually exist?

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::parser;
use crate::spec::ScenarioSpec;

/// Marker printed for a failing line.
pub const FAIL: &str = "❌";

/// Marker printed for a passing line.
pub const PASS: &str = "✅";

/// Outcome of verifying one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Why the scenario is not proven; `None` means it passed.
    pub reason: Option<String>,
    /// The test function name that was looked for.
    pub testname: String,
}

impl ScenarioReport {
    /// Whether the named test was found.
    pub const fn passed(&self) -> bool {
        return self.reason.is_none();
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match &self.reason {
            None => write!(f, "{PASS} {}", self.testname),
            Some(reason) => write!(f, "{FAIL} {}: {reason}", self.testname),
        };
    }
}

/// Checks scenarios against test files, parsing each test file at most once
/// per verifier.
#[derive(Debug, Default)]
pub struct Verifier {
    /// Test function identifiers per test file path.
    inventories: HashMap<PathBuf, HashSet<String>>,
}

impl Verifier {
    /// Identifiers defined in `testpath`, parsed on first use.
    ///
    /// # Errors
    ///
    /// Returns parser errors for the test file.
    fn inventory(&mut self, testpath: &Path) -> Result<&HashSet<String>, Error> {
        if !self.inventories.contains_key(testpath) {
            let identifiers = parser::parse_file(testpath)?
                .into_iter()
                .map(|f| return f.identifier)
                .collect();
            self.inventories.insert(testpath.to_path_buf(), identifiers);
        }
        return Ok(self.inventories.entry(testpath.to_path_buf()).or_default());
    }

    /// Create a verifier with an empty cache.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Verify one scenario. The scenario's own test path wins over
    /// `function_testpath`.
    ///
    /// A missing test file or test function is reported through `reason`,
    /// never as an error. A test path that is not a regular file (a
    /// directory, say) counts as a missing test file.
    ///
    /// # Errors
    ///
    /// Returns parser errors (for example a syntax error) from the test file.
    pub fn verify(
        &mut self,
        scenario: &ScenarioSpec,
        function_testpath: &Path,
    ) -> Result<ScenarioReport, Error> {
        let testpath = scenario.testpath.as_deref().unwrap_or(function_testpath);

        if !testpath.is_file() {
            return Ok(ScenarioReport {
                reason: Some(format!("Test file not found: {}", testpath.display())),
                testname: scenario.testname.clone(),
            });
        }

        let found = self.inventory(testpath)?.contains(&scenario.testname);
        let reason = (!found).then(|| return format!("Test function not found: {}", scenario.testname));

        return Ok(ScenarioReport {
            reason,
            testname: scenario.testname.clone(),
        });
    }
}
