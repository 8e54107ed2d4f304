//! Error-code classification
//!
//! Maps the codes reported by the package manager (`ECONFLICT`, `ENOTFOUND`,
//! ...) to `CommandError` variants carrying the package names a UI needs to
//! render a specific message.

use super::{BowerCommand, ToolError, COMMAND_TIMEOUT_CODE};
use crate::error::CommandError;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::LazyLock;

static CONFLICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"suitable version for ([^\s,]+)").unwrap());
static NOT_INSTALLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([^\s]+) is not installed").unwrap());
static NOT_FOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Package ([^\s]+) not found").unwrap());

/// Classifies a raw tool error.
///
/// `package` is the package the command was issued for, used when the tool's
/// message does not name one.
pub fn classify(command: BowerCommand, package: Option<&str>, error: ToolError) -> CommandError {
    let ToolError {
        code,
        message,
        details,
    } = error;
    match code.as_str() {
        "ECONFLICT" => {
            let mut packages = conflict_picks(&details);
            if packages.is_empty() {
                packages.extend(named(&CONFLICT_RE, &message, package));
            }
            CommandError::PackageConflict { packages, message }
        }
        "ENOTINS" => CommandError::PackageNotInstalled {
            package: named(&NOT_INSTALLED_RE, &message, package),
            message,
        },
        "ENOTFOUND" => CommandError::SourceNotFound {
            package: named(&NOT_FOUND_RE, &message, package),
            message,
        },
        "ENORESOLVER" => CommandError::ResolverNotFound {
            package: package.map(str::to_string),
            message,
        },
        "ENORESTARGET" => CommandError::TargetNotFound {
            package: package.map(str::to_string),
            message,
        },
        "ENOGIT" => CommandError::ExternalToolMissing {
            tool: "git".to_string(),
        },
        "ENOENT" => match details.get("tool").and_then(Value::as_str) {
            Some(tool) => CommandError::ExternalToolMissing {
                tool: tool.to_string(),
            },
            None => CommandError::ManifestAbsent {
                path: PathBuf::from("bower.json"),
            },
        },
        "EMALFORMED" => CommandError::ManifestMalformed { message },
        "ECMDERR" => CommandError::ExecutionFailed {
            command: command.name().to_string(),
            message,
        },
        "ECONNRESET" => CommandError::ConnectionReset { message },
        "EINCOMPLETE" => CommandError::DownloadIncomplete { message },
        COMMAND_TIMEOUT_CODE => CommandError::TimedOut {
            command: command.name().to_string(),
            message,
        },
        _ => CommandError::Unknown {
            code: code.clone(),
            message,
        },
    }
}

/// Package named in `message`, falling back to the hint
fn named(re: &Regex, message: &str, package: Option<&str>) -> Option<String> {
    re.captures(message)
        .map(|caps| caps[1].to_string())
        .or_else(|| package.map(str::to_string))
}

/// Names of the packages whose constraints collided
fn conflict_picks(details: &Value) -> Vec<String> {
    let Some(picks) = details.get("picks").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for pick in picks {
        let name = pick
            .pointer("/endpoint/name")
            .or_else(|| pick.pointer("/pkgMeta/name"))
            .and_then(Value::as_str);
        if let Some(name) = name {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn kind_of(code: &str) -> ErrorKind {
        classify(BowerCommand::Install, None, ToolError::new(code, "boom")).kind()
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(kind_of("ECONFLICT"), ErrorKind::PackageConflict);
        assert_eq!(kind_of("ENOTINS"), ErrorKind::PackageNotInstalled);
        assert_eq!(kind_of("ENOTFOUND"), ErrorKind::SourceNotFound);
        assert_eq!(kind_of("ENORESOLVER"), ErrorKind::ResolverNotFound);
        assert_eq!(kind_of("ENORESTARGET"), ErrorKind::TargetNotFound);
        assert_eq!(kind_of("ENOGIT"), ErrorKind::ExternalToolMissing);
        assert_eq!(kind_of("ENOENT"), ErrorKind::ManifestAbsent);
        assert_eq!(kind_of("EMALFORMED"), ErrorKind::ManifestMalformed);
        assert_eq!(kind_of("ECMDERR"), ErrorKind::ExecutionFailed);
        assert_eq!(kind_of("ECONNRESET"), ErrorKind::ConnectionReset);
        assert_eq!(kind_of("EINCOMPLETE"), ErrorKind::DownloadIncomplete);
        assert_eq!(kind_of(COMMAND_TIMEOUT_CODE), ErrorKind::TimedOut);
        assert_eq!(kind_of("ETIMEDOUT"), ErrorKind::Unknown);
        assert_eq!(kind_of("EWHATEVER"), ErrorKind::Unknown);
    }

    #[test]
    fn test_conflict_names_from_picks() {
        let error = ToolError::new("ECONFLICT", "Unable to find suitable version for angular")
            .with_details(json!({
                "name": "angular",
                "picks": [
                    {"endpoint": {"name": "angular", "target": "1.2.x"}},
                    {"endpoint": {"name": "angular-route"}, "pkgMeta": {"name": "angular-route"}},
                    {"pkgMeta": {"name": "angular"}}
                ]
            }));

        let err = classify(BowerCommand::Install, Some("angular-route"), error);
        assert_eq!(err.packages(), vec!["angular", "angular-route"]);
    }

    #[test]
    fn test_conflict_name_from_message() {
        let error = ToolError::new("ECONFLICT", "Unable to find suitable version for jquery");
        let err = classify(BowerCommand::Install, None, error);
        assert_eq!(err.packages(), vec!["jquery"]);
    }

    #[test]
    fn test_not_found_uses_message_then_hint() {
        let err = classify(
            BowerCommand::Install,
            Some("hint"),
            ToolError::new("ENOTFOUND", "Package jquerry not found"),
        );
        assert_eq!(err.packages(), vec!["jquerry"]);

        let err = classify(
            BowerCommand::Install,
            Some("hint"),
            ToolError::new("ENOTFOUND", "Registry lookup failed"),
        );
        assert_eq!(err.packages(), vec!["hint"]);
    }

    #[test]
    fn test_not_installed_name() {
        let err = classify(
            BowerCommand::Uninstall,
            None,
            ToolError::new("ENOTINS", "jquery is not installed"),
        );
        assert_eq!(err.packages(), vec!["jquery"]);
    }

    #[test]
    fn test_missing_binary() {
        let error =
            ToolError::new("ENOENT", "bower not found").with_details(json!({"tool": "bower"}));
        let err = classify(BowerCommand::List, None, error);
        assert_eq!(
            err,
            CommandError::ExternalToolMissing {
                tool: "bower".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_keeps_code() {
        let err = classify(BowerCommand::Prune, None, ToolError::new("EPERM", "denied"));
        assert_eq!(
            err,
            CommandError::Unknown {
                code: "EPERM".to_string(),
                message: "denied".to_string()
            }
        );
    }
}
