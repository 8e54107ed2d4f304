//! Runner that spawns the `bower` binary

use super::{BowerCommand, OptionMap, PackageManagerRunner, ToolError, COMMAND_TIMEOUT_CODE};
use async_trait::async_trait;
use serde_json::{Deserializer, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default package manager runner that executes the real tool
#[derive(Debug, Clone)]
pub struct SystemPackageManager {
    binary: PathBuf,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl SystemPackageManager {
    /// Create a runner for `binary` executing in `working_dir`
    pub fn new(binary: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
            timeout: None,
        }
    }

    /// Kill the child process after `timeout` (builder pattern)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the argument vector for one invocation
    fn build_args(
        command: BowerCommand,
        args: &[String],
        options: &OptionMap,
        config: &OptionMap,
    ) -> Vec<String> {
        let mut argv: Vec<String> = command
            .name()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        argv.extend(args.iter().cloned());

        for (key, value) in options {
            match value {
                Value::Bool(true) => argv.push(format!("--{}", key)),
                Value::Bool(false) | Value::Null => {}
                Value::String(s) => argv.push(format!("--{}={}", key, s)),
                other => argv.push(format!("--{}={}", key, other)),
            }
        }

        argv.push("--json".to_string());
        argv.push("--config.interactive=false".to_string());
        for (key, value) in config {
            if key == "interactive" {
                continue;
            }
            match value {
                Value::String(s) => argv.push(format!("--config.{}={}", key, s)),
                Value::Null => {}
                other => argv.push(format!("--config.{}={}", key, other)),
            }
        }
        argv
    }

    fn tool_name(&self) -> String {
        self.binary
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.binary.display().to_string())
    }
}

#[async_trait]
impl PackageManagerRunner for SystemPackageManager {
    async fn execute(
        &self,
        command: BowerCommand,
        args: &[String],
        options: &OptionMap,
        config: &OptionMap,
    ) -> Result<Value, ToolError> {
        // Nothing to spawn: the merged config is already known here
        if command == BowerCommand::GetConfiguration {
            return Ok(Value::Object(config.clone()));
        }

        let argv = Self::build_args(command, args, options, config);
        debug!(binary = %self.binary.display(), args = ?argv, "spawning package manager");

        let child = Command::new(&self.binary)
            .args(&argv)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::new(
                        "ENOENT",
                        format!("{} was not found on this system", self.tool_name()),
                    )
                    .with_details(serde_json::json!({ "tool": self.tool_name() }))
                } else {
                    ToolError::new(
                        "ECMDERR",
                        format!("Failed to execute {}: {}", self.tool_name(), e),
                    )
                }
            })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ToolError::new(
                        COMMAND_TIMEOUT_CODE,
                        format!("{} did not finish within {:?}", command, limit),
                    )
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| ToolError::new("ECMDERR", e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            parse_stdout(&stdout)
        } else {
            Err(parse_failure(&stderr, output.status.code()))
        }
    }
}

/// Parse the JSON payload printed on success
fn parse_stdout(stdout: &str) -> Result<Value, ToolError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|e| {
        ToolError::new("ECMDERR", format!("unreadable output: {}", e))
            .with_details(Value::String(trimmed.to_string()))
    })
}

/// Extract the structured error from the log stream on stderr
///
/// With `--json` the tool logs one JSON object per event; the last one at
/// level `error` carries `id` (the error code), `message` and `data`.
fn parse_failure(stderr: &str, status: Option<i32>) -> ToolError {
    let mut last_error = None;
    for value in Deserializer::from_str(stderr).into_iter::<Value>() {
        let Ok(value) = value else {
            break;
        };
        if value.get("level").and_then(Value::as_str) == Some("error") {
            last_error = Some(value);
        }
    }

    match last_error {
        Some(entry) => {
            let code = entry
                .get("id")
                .or_else(|| entry.get("code"))
                .and_then(Value::as_str)
                .unwrap_or("EUNKNOWN");
            let message = entry
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let details = entry
                .get("data")
                .or_else(|| entry.get("details"))
                .cloned()
                .unwrap_or(Value::Null);
            ToolError::new(code, message).with_details(details)
        }
        None => {
            let text = stderr.trim();
            let message = if text.is_empty() {
                format!("exited with status {}", status.unwrap_or(-1))
            } else {
                text.to_string()
            };
            ToolError::new("ECMDERR", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> OptionMap {
        match value {
            Value::Object(m) => m,
            _ => OptionMap::new(),
        }
    }

    #[test]
    fn test_build_args_install() {
        let argv = SystemPackageManager::build_args(
            BowerCommand::Install,
            &["jquery#~2.1".to_string()],
            &map(json!({"force-latest": true, "production": false})),
            &map(json!({"directory": "lib", "timeout": 60000})),
        );
        assert_eq!(
            argv,
            vec![
                "install",
                "jquery#~2.1",
                "--force-latest",
                "--json",
                "--config.interactive=false",
                "--config.directory=lib",
                "--config.timeout=60000",
            ]
        );
    }

    #[test]
    fn test_build_args_cache_list() {
        let argv = SystemPackageManager::build_args(
            BowerCommand::CacheList,
            &[],
            &OptionMap::new(),
            &OptionMap::new(),
        );
        assert_eq!(
            argv,
            vec!["cache", "list", "--json", "--config.interactive=false"]
        );
    }

    #[test]
    fn test_build_args_never_interactive() {
        let argv = SystemPackageManager::build_args(
            BowerCommand::Prune,
            &[],
            &OptionMap::new(),
            &map(json!({"interactive": true})),
        );
        assert!(argv.contains(&"--config.interactive=false".to_string()));
        assert!(!argv.contains(&"--config.interactive=true".to_string()));
    }

    #[test]
    fn test_parse_stdout() {
        assert_eq!(parse_stdout("").unwrap(), Value::Null);
        assert_eq!(parse_stdout("  {\"a\": 1}\n").unwrap(), json!({"a": 1}));
        assert_eq!(parse_stdout("not json").unwrap_err().code, "ECMDERR");
    }

    #[test]
    fn test_parse_failure_takes_last_error() {
        let stderr = r#"{"level":"info","id":"cached","message":"jquery#2.1.4"}
{"level":"error","id":"ENOTFOUND","message":"Package nope not found","data":{}}
{"level":"error","id":"ECONFLICT","message":"Unable to find suitable version for angular","data":{"picks":[]}}
"#;
        let err = parse_failure(stderr, Some(1));
        assert_eq!(err.code, "ECONFLICT");
        assert!(err.message.contains("angular"));
        assert_eq!(err.details, json!({"picks": []}));
    }

    #[test]
    fn test_parse_failure_plain_text() {
        let err = parse_failure("Segmentation fault\n", Some(139));
        assert_eq!(err.code, "ECMDERR");
        assert_eq!(err.message, "Segmentation fault");

        let err = parse_failure("", Some(2));
        assert_eq!(err.message, "exited with status 2");
    }

    #[tokio::test]
    async fn test_configuration_is_local() {
        let runner = SystemPackageManager::new("/nonexistent/bower", ".");
        let config = map(json!({"directory": "lib"}));
        let value = runner
            .execute(BowerCommand::GetConfiguration, &[], &OptionMap::new(), &config)
            .await
            .unwrap();
        assert_eq!(value, json!({"directory": "lib"}));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_enoent() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemPackageManager::new("/nonexistent/bower-cli", dir.path());
        let err = runner
            .execute(BowerCommand::List, &[], &OptionMap::new(), &OptionMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, "ENOENT");
        assert_eq!(err.details["tool"], "bower-cli");
    }
}
