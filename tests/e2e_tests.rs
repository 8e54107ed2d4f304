//! End-to-end tests for the bowersync CLI
//!
//! These tests verify:
//! - Help and version output
//! - Manifest commands that never spawn bower
//! - Error reporting and exit codes when bower is unavailable

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const MISSING_BOWER: &str = "/nonexistent/bin/bower";

fn bowersync() -> Command {
    Command::cargo_bin("bowersync").expect("binary should be built")
}

/// Create a project directory with a bower.json
fn create_test_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let bower_json = r#"{
  "name": "test-project",
  "main": "index.js",
  "dependencies": {
    "jquery": "~2.1.0"
  },
  "devDependencies": {
    "mocha": "^2.0.0"
  }
}
"#;
    fs::write(temp_dir.path().join("bower.json"), bower_json).unwrap();
    temp_dir
}

mod cli_surface {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        bowersync()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("install"))
            .stdout(predicate::str::contains("uninstall"))
            .stdout(predicate::str::contains("prune"));
    }

    #[test]
    fn test_version() {
        bowersync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        bowersync()
            .args(["--timeout", "soon", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid timeout"));
    }
}

mod missing_tool {
    use super::*;

    #[test]
    fn test_status_reports_missing_bower() {
        let project = create_test_project();
        bowersync()
            .args(["status", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("'bower' is not installed"));
    }

    #[test]
    fn test_json_error_schema() {
        let project = create_test_project();
        let output = bowersync()
            .args(["list", "--json", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .output()
            .unwrap();

        assert!(!output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["error"]["kind"], "external_tool_missing");
    }

    #[test]
    fn test_missing_project_directory() {
        bowersync()
            .args(["status", "--cwd", "/nonexistent/project"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a directory"));
    }
}

mod manifest_commands {
    use super::*;

    #[test]
    fn test_entry_moves_dependency_and_keeps_metadata() {
        let project = create_test_project();
        bowersync()
            .args(["entry", "jquery", "--dev", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .success();

        let written = fs::read_to_string(project.path().join("bower.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["main"], "index.js");
        assert!(json["dependencies"].get("jquery").is_none());
        assert_eq!(json["devDependencies"]["jquery"], "~2.1.0");
    }

    #[test]
    fn test_entry_unknown_package_fails() {
        let project = create_test_project();
        let original = fs::read_to_string(project.path().join("bower.json")).unwrap();

        bowersync()
            .args(["entry", "lodash", "--range", "^3.0.0", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("lodash"));

        let after = fs::read_to_string(project.path().join("bower.json")).unwrap();
        assert_eq!(original, after);
    }

    #[test]
    fn test_remove_manifest() {
        let project = create_test_project();
        bowersync()
            .args(["remove-manifest", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .success();
        assert!(!project.path().join("bower.json").exists());

        // nothing left to remove
        bowersync()
            .args(["remove-manifest", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .failure();
    }

    #[test]
    fn test_config_reads_bowerrc() {
        let project = create_test_project();
        fs::write(project.path().join(".bowerrc"), r#"{"directory": "vendor"}"#).unwrap();

        bowersync()
            .args(["config", "--bower", MISSING_BOWER])
            .arg("--cwd")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("directory = vendor"));
    }
}
