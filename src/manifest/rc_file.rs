//! .bowerrc project configuration

use super::StructuredFile;
use serde_json::{Map, Value};

/// Parsed .bowerrc
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RcDocument {
    object: Map<String, Value>,
}

impl StructuredFile for RcDocument {
    const FILE_NAME: &'static str = ".bowerrc";

    fn from_object(object: Map<String, Value>) -> Result<Self, String> {
        for key in ["directory", "cwd", "registry", "proxy", "https-proxy"] {
            match object.get(key) {
                None | Some(Value::String(_)) => {}
                // bower accepts a registry object with search/register endpoints
                Some(Value::Object(_)) if key == "registry" => {}
                Some(_) => return Err(format!("'{}' must be a string", key)),
            }
        }
        if let Some(timeout) = object.get("timeout") {
            if !timeout.is_u64() {
                return Err("'timeout' must be a number of milliseconds".to_string());
            }
        }
        Ok(Self { object })
    }

    fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }
}

impl RcDocument {
    fn string(&self, key: &str) -> Option<&str> {
        self.object.get(key).and_then(Value::as_str)
    }

    /// Working directory override
    pub fn cwd(&self) -> Option<&str> {
        self.string("cwd")
    }

    /// All settings, to be handed to the package manager as its config map
    pub fn to_config_map(&self) -> Map<String, Value> {
        self.object.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rc = RcDocument::parse("{}").unwrap();
        assert!(rc.cwd().is_none());
        assert!(rc.to_config_map().is_empty());
    }

    #[test]
    fn test_known_settings() {
        let rc = RcDocument::parse(
            r#"{
  "directory": "vendor/lib",
  "cwd": "web",
  "registry": "https://registry.example.com",
  "proxy": "http://proxy:8080",
  "https-proxy": "http://proxy:8443",
  "timeout": 60000,
  "analytics": false
}"#,
        )
        .unwrap();

        assert_eq!(rc.cwd(), Some("web"));
        let map = rc.to_config_map();
        assert_eq!(map["directory"], "vendor/lib");
        assert_eq!(map["https-proxy"], "http://proxy:8443");
        assert_eq!(map["timeout"], 60000);
        assert_eq!(map.get("analytics"), Some(&Value::Bool(false)));
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "directory");
    }

    #[test]
    fn test_registry_object_allowed() {
        let rc = RcDocument::parse(r#"{"registry": {"search": ["https://a"]}}"#).unwrap();
        assert!(rc.to_config_map()["registry"].is_object());
    }

    #[test]
    fn test_rejects_bad_types() {
        assert!(RcDocument::parse(r#"{"directory": 3}"#).is_err());
        assert!(RcDocument::parse(r#"{"cwd": ["web"]}"#).is_err());
        assert!(RcDocument::parse(r#"{"timeout": "slow"}"#).is_err());
        assert!(RcDocument::parse("directory=lib").is_err());
    }
}
