//! Spec persistence: the per-file declaration of which test scenarios are
//! expected to cover which functions.
//!
//! Each source file `dir/module.py` owns at most one spec, stored next to it
//! as `dir/module_spec.json`. Optional `testpath` fields fall back from
//! scenario to function to file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Function, SCOPE_SEPARATOR};

/// Number of placeholder scenarios `FileSpec::add` writes for a new function.
const PLACEHOLDER_COUNT: usize = 3;

/// Suffix appended to a source file's stem to name its spec file.
const SPEC_SUFFIX: &str = "_spec.json";

/// Suffix appended to a source file's stem to name its default test file.
const TEST_SUFFIX: &str = "_test.py";

/// One claimed test covering a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::arbitrary_source_item_ordering, reason = "serde writes fields in declaration order, which is the documented JSON layout")]
pub struct ScenarioSpec {
    /// Test file override for this scenario only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testpath: Option<PathBuf>,
    /// Exact identifier of the test function in the test file.
    pub testname: String,
    /// What the scenario checks, in prose.
    pub description: String,
}

/// The scenarios expected for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::arbitrary_source_item_ordering, reason = "serde writes fields in declaration order, which is the documented JSON layout")]
pub struct FunctionSpec {
    /// Test file override for every scenario of this function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testpath: Option<PathBuf>,
    /// Qualified identifier of the source function this entry covers.
    pub identifier: String,
    /// Claimed scenarios, in authoring order.
    pub scenarios: Vec<ScenarioSpec>,
}

/// The spec for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::arbitrary_source_item_ordering, reason = "serde writes fields in declaration order, which is the documented JSON layout")]
pub struct FileSpec {
    /// The source file this spec describes.
    pub filepath: PathBuf,
    /// Default test file for every function of this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testpath: Option<PathBuf>,
    /// Function entries, in the order they were added.
    pub functions: Vec<FunctionSpec>,
}

impl FileSpec {
    /// Append an entry for `function` with placeholder scenarios to be
    /// replaced by the author.
    pub fn add(&mut self, function: &Function) -> &mut Self {
        self.functions.push(FunctionSpec {
            testpath: None,
            identifier: function.identifier.clone(),
            scenarios: placeholder_scenarios(&function.identifier),
        });
        return self;
    }

    /// Start a spec for `filepath` whose first entry covers `function`.
    /// The file-level test path defaults to the sibling `<stem>_test.py`.
    pub fn create(filepath: &Path, function: &Function) -> Self {
        let mut spec = Self {
            filepath: filepath.to_path_buf(),
            testpath: Some(default_testpath_for(filepath)),
            functions: Vec::new(),
        };
        spec.add(function);
        return spec;
    }

    /// Look up the entry for one function identifier.
    pub fn function(&self, identifier: &str) -> Option<&FunctionSpec> {
        return self.functions.iter().find(|f| return f.identifier == identifier);
    }

    /// Index entries by identifier. A later duplicate replaces an earlier one.
    pub fn function_map(&self) -> HashMap<&str, &FunctionSpec> {
        return self.functions.iter().map(|f| return (f.identifier.as_str(), f)).collect();
    }

    /// Load the spec that belongs to the source file `filepath`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SpecNotFound` if no spec file exists (an expected,
    /// recoverable condition), `Error::Io` for other read failures,
    /// or `Error::SpecInvalid` if the content does not match the schema.
    pub fn load(filepath: &Path) -> Result<Self, Error> {
        let spec_path = spec_path_for(filepath);
        tracing::debug!("Loading spec from {}", spec_path.display());

        let content = match std::fs::read_to_string(&spec_path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SpecNotFound { path: spec_path });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let spec = Self::parse(&spec_path, &content)?;
        tracing::debug!("Loaded spec with {} functions", spec.functions.len());
        return Ok(spec);
    }

    /// Parse spec JSON and validate it. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::SpecInvalid` if a required field is missing, a field
    /// has the wrong type, or a required string is empty.
    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        let spec: Self = serde_json::from_str(content).map_err(|e| {
            return Error::SpecInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
        })?;
        spec.validate(path)?;
        return Ok(spec);
    }

    /// Write the spec to its sibling path, replacing whatever is there.
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns `Error::JsonSer` if serialization fails,
    /// or `Error::Io` if the file cannot be written.
    pub fn save(&self) -> Result<PathBuf, Error> {
        let spec_path = spec_path_for(&self.filepath);
        tracing::info!("Saving spec to {}", spec_path.display());
        tracing::debug!("Spec contains {} functions", self.functions.len());

        let mut content = self.serialize()?;
        content.push('\n');
        std::fs::write(&spec_path, content)?;
        return Ok(spec_path);
    }

    /// Serialize to pretty JSON with unset optional fields omitted.
    ///
    /// # Errors
    ///
    /// Returns `Error::JsonSer` if serialization fails.
    pub fn serialize(&self) -> Result<String, Error> {
        return Ok(serde_json::to_string_pretty(self)?);
    }

    /// Reject structurally valid JSON whose identifiers or test names are empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::SpecInvalid` naming the first offending field.
    fn validate(&self, path: &Path) -> Result<(), Error> {
        let invalid = |field: String| {
            return Error::SpecInvalid {
                path: path.to_path_buf(),
                reason: format!("{field} must not be empty"),
            };
        };

        for (i, function) in self.functions.iter().enumerate() {
            if function.identifier.is_empty() {
                return Err(invalid(format!("functions[{i}].identifier")));
            }
            for (j, scenario) in function.scenarios.iter().enumerate() {
                if scenario.testname.is_empty() {
                    return Err(invalid(format!("functions[{i}].scenarios[{j}].testname")));
                }
            }
        }
        return Ok(());
    }
}

/// The test file a new spec points at: `dir/module.py` → `dir/module_test.py`.
pub fn default_testpath_for(filepath: &Path) -> PathBuf {
    return sibling_with_suffix(filepath, TEST_SUFFIX);
}

/// Build the placeholder scenarios for a freshly added function.
fn placeholder_scenarios(identifier: &str) -> Vec<ScenarioSpec> {
    let flattened = identifier.replace(SCOPE_SEPARATOR, "__");
    return (0..PLACEHOLDER_COUNT)
        .map(|i| {
            return ScenarioSpec {
                testpath: None,
                testname: format!("test__{flattened}__placeholder_scenario{i}"),
                description: format!(
                    "Placeholder scenario {i} (These scenarios are just a placeholder. \
                     Replace them with actual scenarios with sensible names and description. \
                     You do not have to limit the number of scenarios: \
                     use as many as is necessary to cover the function.)"
                ),
            };
        })
        .collect();
}

/// Replace the extension of `filepath` with `suffix`, appended to the stem.
fn sibling_with_suffix(filepath: &Path, suffix: &str) -> PathBuf {
    let mut name = filepath.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    return filepath.with_file_name(name);
}

/// Where the spec for a source file lives: `dir/module.py` → `dir/module_spec.json`.
pub fn spec_path_for(filepath: &Path) -> PathBuf {
    return sibling_with_suffix(filepath, SPEC_SUFFIX);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(identifier: &str) -> Function {
        return Function {
            column: 0,
            filepath: PathBuf::from("module.py"),
            identifier: identifier.to_string(),
            line: 1,
            name: identifier.rsplit("::").next().unwrap().to_string(),
        };
    }

    #[test]
    fn spec_path_is_sibling() {
        assert_eq!(spec_path_for(Path::new("pkg/module.py")), Path::new("pkg/module_spec.json"));
        assert_eq!(spec_path_for(Path::new("module.py")), Path::new("module_spec.json"));
    }

    #[test]
    fn spec_paths_do_not_collide() {
        let a = spec_path_for(Path::new("pkg/a.py"));
        let b = spec_path_for(Path::new("pkg/b.py"));
        let nested = spec_path_for(Path::new("pkg/sub/a.py"));
        assert_ne!(a, b);
        assert_ne!(a, nested);
        assert_eq!(a, spec_path_for(Path::new("pkg/a.py")));
    }

    #[test]
    fn default_testpath_is_sibling() {
        assert_eq!(default_testpath_for(Path::new("pkg/module.py")), Path::new("pkg/module_test.py"));
    }

    #[test]
    fn create_adds_one_function_with_placeholders() {
        let spec = FileSpec::create(Path::new("pkg/module.py"), &function("MyClass::method"));
        assert_eq!(spec.filepath, Path::new("pkg/module.py"));
        assert_eq!(spec.testpath.as_deref(), Some(Path::new("pkg/module_test.py")));
        assert_eq!(spec.functions.len(), 1);

        let entry = &spec.functions[0];
        assert_eq!(entry.identifier, "MyClass::method");
        assert_eq!(entry.testpath, None);
        let names: Vec<&str> = entry.scenarios.iter().map(|s| s.testname.as_str()).collect();
        assert_eq!(
            names,
            [
                "test__MyClass__method__placeholder_scenario0",
                "test__MyClass__method__placeholder_scenario1",
                "test__MyClass__method__placeholder_scenario2",
            ]
        );
        assert!(entry.scenarios.iter().all(|s| s.testpath.is_none()));
    }

    #[test]
    fn placeholder_description_asks_for_replacement() {
        let spec = FileSpec::create(Path::new("module.py"), &function("f"));
        let description = &spec.functions[0].scenarios[1].description;
        assert!(description.starts_with("Placeholder scenario 1 "));
        assert!(description.contains("Replace them with actual scenarios"));
        assert!(description.contains("You do not have to limit the number of scenarios"));
    }

    #[test]
    fn add_appends_in_call_order() {
        let mut spec = FileSpec::create(Path::new("module.py"), &function("first"));
        spec.add(&function("second")).add(&function("third"));

        let identifiers: Vec<&str> = spec.functions.iter().map(|f| f.identifier.as_str()).collect();
        assert_eq!(identifiers, ["first", "second", "third"]);
        assert!(spec.functions.iter().all(|f| f.scenarios.len() == 3));
    }

    #[test]
    fn create_then_two_adds_on_empty_spec() {
        let mut spec = FileSpec {
            filepath: PathBuf::from("module.py"),
            testpath: None,
            functions: Vec::new(),
        };
        spec.add(&function("a")).add(&function("b"));
        assert_eq!(spec.functions.len(), 2);
        assert_eq!(spec.functions[0].identifier, "a");
        assert_eq!(spec.functions[1].identifier, "b");
        assert!(spec.functions.iter().all(|f| f.scenarios.len() == 3));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("module.py");
        let mut spec = FileSpec::create(&source, &function("f"));
        spec.add(&function("C::m"));
        spec.functions[1].testpath = Some(dir.path().join("other_test.py"));
        spec.functions[1].scenarios[0].testpath = Some(dir.path().join("third_test.py"));

        let written = spec.save().unwrap();
        assert_eq!(written, dir.path().join("module_spec.json"));

        let loaded = FileSpec::load(&source).unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn save_omits_unset_optionals() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("module.py");
        let written = FileSpec::create(&source, &function("f")).save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert!(raw.get("testpath").is_some());
        let entry = &raw["functions"][0];
        assert!(entry.get("testpath").is_none());
        assert!(entry["scenarios"][0].get("testpath").is_none());
    }

    #[test]
    fn serialized_fields_follow_schema_order() {
        let mut spec = FileSpec::create(Path::new("module.py"), &function("f"));
        spec.functions[0].testpath = Some(PathBuf::from("other_test.py"));
        spec.functions[0].scenarios[0].testpath = Some(PathBuf::from("third_test.py"));
        let json = spec.serialize().unwrap();

        let position = |key: &str| json.find(&format!("\"{key}\"")).unwrap();
        assert!(position("filepath") < position("testpath"), "{json}");
        assert!(position("testpath") < position("functions"), "{json}");

        let function = &json[position("functions")..];
        let at = |key: &str| function.find(&format!("\"{key}\"")).unwrap();
        assert!(at("testpath") < at("identifier"), "{function}");
        assert!(at("identifier") < at("scenarios"), "{function}");

        let scenario = &function[at("scenarios")..];
        let within = |key: &str| scenario.find(&format!("\"{key}\"")).unwrap();
        assert!(within("testpath") < within("testname"), "{scenario}");
        assert!(within("testname") < within("description"), "{scenario}");
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("module.py");
        let mut spec = FileSpec::create(&source, &function("f"));
        spec.save().unwrap();
        spec.add(&function("g"));
        spec.save().unwrap();

        assert_eq!(FileSpec::load(&source).unwrap().functions.len(), 2);
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSpec::load(&dir.path().join("module.py")).unwrap_err();
        assert!(matches!(err, Error::SpecNotFound { path } if path == dir.path().join("module_spec.json")));
    }

    #[test]
    fn null_and_absent_optionals_are_none() {
        let content = r#"{
            "filepath": "module.py",
            "testpath": null,
            "functions": [
                {
                    "identifier": "f",
                    "testpath": null,
                    "scenarios": [{"testname": "test_f", "description": "d"}]
                }
            ]
        }"#;
        let spec = FileSpec::parse(Path::new("module_spec.json"), content).unwrap();
        assert_eq!(spec.testpath, None);
        assert_eq!(spec.functions[0].testpath, None);
        assert_eq!(spec.functions[0].scenarios[0].testpath, None);
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let content = r#"{"filepath": "m.py", "functions": [{"identifier": "f", "scenarios": [{"description": "d"}]}]}"#;
        let err = FileSpec::parse(Path::new("m_spec.json"), content).unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { reason, .. } if reason.contains("testname")));
    }

    #[test]
    fn wrong_type_is_invalid() {
        let content = r#"{"filepath": "m.py", "functions": [{"identifier": "f", "scenarios": "none"}]}"#;
        let err = FileSpec::parse(Path::new("m_spec.json"), content).unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { .. }));
    }

    #[test]
    fn empty_identifier_is_invalid() {
        let content = r#"{"filepath": "m.py", "functions": [{"identifier": "", "scenarios": []}]}"#;
        let err = FileSpec::parse(Path::new("m_spec.json"), content).unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { reason, .. } if reason.contains("functions[0].identifier")));
    }

    #[test]
    fn empty_testname_is_invalid() {
        let content = r#"{"filepath": "m.py", "functions": [
            {"identifier": "f", "scenarios": [{"testname": "t", "description": ""}]},
            {"identifier": "g", "scenarios": [{"testname": "t", "description": ""}, {"testname": "", "description": ""}]}
        ]}"#;
        let err = FileSpec::parse(Path::new("m_spec.json"), content).unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { reason, .. } if reason.contains("functions[1].scenarios[1].testname")));
    }

    #[test]
    fn malformed_file_on_disk_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("module_spec.json"), "{ not json").unwrap();
        let err = FileSpec::load(&dir.path().join("module.py")).unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { .. }));
    }

    #[test]
    fn lookup_by_identifier() {
        let mut spec = FileSpec::create(Path::new("module.py"), &function("f"));
        spec.add(&function("C::m"));
        assert!(spec.function("C::m").is_some());
        assert!(spec.function("m").is_none());

        let map = spec.function_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["f"].identifier, "f");
    }
}
