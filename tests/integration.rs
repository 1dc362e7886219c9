use std::path::Path;
use std::process::{Command, Output};

fn covspec_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_covspec"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd
}

fn covspec_in(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_covspec"));
    cmd.arg("--root").arg(root);
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn reports_every_file() {
    let output = covspec_cmd("project").output().unwrap();
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
❌ ./pkg/calc.py:
  ✅ add
  ❌ Calculator::multiply (0.00%):
    ❌ test_multiply: Test function not found: test_multiply
🪽 ./pkg/empty.py
"
    );
}

#[test]
fn covered_project_exits_zero() {
    let output = covspec_cmd("covered").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "✅ ./greet.py\n");
}

#[test]
fn first_prints_one_function() {
    let output = covspec_cmd("project").arg("--first").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "\
❌ ./pkg/calc.py:
  ❌ Calculator::multiply (0.00%):
    ❌ test_multiply: Test function not found: test_multiply
"
    );
}

#[test]
fn target_restricts_to_one_function() {
    let output = covspec_cmd("project").args(["--target", "pkg/calc.py::add"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "✅ ./pkg/calc.py\n");
}

#[test]
fn create_then_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("shapes.py"), "class Square:\n    def area(self):\n        return 0\n").unwrap();

    let created = covspec_in(dir.path()).args(["--first", "--create"]).output().unwrap();
    assert!(created.status.success(), "stderr: {}", stderr(&created));
    let spec_path = dir.path().join("shapes_spec.json");
    assert_eq!(
        stdout(&created),
        format!(
            "Created spec for {}::Square::area at {}\n",
            dir.path().join("shapes.py").display(),
            spec_path.display()
        )
    );

    let spec: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&spec_path).unwrap()).unwrap();
    let scenarios = spec["functions"][0]["scenarios"].as_array().unwrap();
    assert_eq!(spec["functions"][0]["identifier"], "Square::area");
    assert_eq!(scenarios.len(), 3);
    assert_eq!(scenarios[0]["testname"], "test__Square__area__placeholder_scenario0");

    let report = covspec_in(dir.path()).arg("--first").output().unwrap();
    assert_eq!(report.status.code(), Some(1));
    assert!(stdout(&report).contains("❌ Square::area (0.00%):"));
    assert!(stdout(&report).contains("Test file not found"));

    let before = std::fs::read_to_string(&spec_path).unwrap();
    let again = covspec_in(dir.path()).args(["--first", "--create"]).output().unwrap();
    assert_eq!(again.status.code(), Some(1));
    assert_eq!(std::fs::read_to_string(&spec_path).unwrap(), before);
}

#[test]
fn create_requires_first() {
    let output = covspec_cmd("project").arg("--create").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("--create Requires --first"));
}

#[test]
fn invalid_target_is_an_error() {
    let output = covspec_cmd("project").args(["--target", "nodotpy"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid Target"));
}

#[test]
fn syntax_error_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "def g(:\n").unwrap();
    std::fs::write(dir.path().join("c.py"), "def h():\n    pass\n").unwrap();

    let output = covspec_in(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("a.py"));
    assert!(!stdout(&output).contains("c.py"));
    assert!(stderr(&output).contains("Syntax Error"));
}
