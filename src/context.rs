//! Generation context handling.
//! The hooks never see template variables directly: the scaffolding tool
//! hands them the resolved answers, either through the hook protocol on stdin
//! (`{"template_dir", "output_dir", "context"}`) or as a plain answers file.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Immutable set of choices resolved before any hook runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationContext {
    pub project_name: String,
    pub project_slug: String,
    pub python_version: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, deserialize_with = "flag")]
    pub include_ml_libs: bool,
    #[serde(default, deserialize_with = "flag")]
    pub include_visualization: bool,
    #[serde(default, deserialize_with = "flag")]
    pub include_jupyter: bool,
    #[serde(default, deserialize_with = "flag")]
    pub include_data_analysis: bool,
    #[serde(default, deserialize_with = "flag")]
    pub include_documentation: bool,
    #[serde(default, deserialize_with = "flag")]
    pub include_tests: bool,
    #[serde(default, deserialize_with = "flag")]
    pub with_cuda: bool,
    #[serde(default = "no_license")]
    pub open_source_license: String,
}

impl GenerationContext {
    /// Creates a context with every optional feature declined and no license.
    pub fn new(project_name: &str, project_slug: &str, python_version: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            project_slug: project_slug.to_string(),
            python_version: python_version.to_string(),
            author_name: String::new(),
            include_ml_libs: false,
            include_visualization: false,
            include_jupyter: false,
            include_data_analysis: false,
            include_documentation: false,
            include_tests: false,
            with_cuda: false,
            open_source_license: no_license(),
        }
    }
}

fn no_license() -> String {
    "None".to_string()
}

/// Accepts JSON booleans as well as the string forms template engines render
/// (`"True"`, `"yes"`, `"1"`, ...).
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => parse_flag(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("'{s}' is not a boolean flag"))
        }),
    }
}

/// Parses the textual form of a boolean answer.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Payload written to a hook's stdin by the scaffolding tool.
#[derive(Debug, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    pub context: GenerationContext,
}

impl HookInput {
    /// Parses hook input from JSON or YAML text.
    ///
    /// Both the wrapped hook payload and a bare answers object are accepted.
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::ContextError("no generation context was provided".to_string()));
        }

        // Try parsing as JSON first, fall back to YAML
        let raw: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => serde_yaml::from_str(content).map_err(|e| {
                Error::ContextError(format!("Invalid context format: {e}"))
            })?,
        };

        if raw.get("context").is_some_and(|c| c.is_object()) {
            debug!("Context wrapped in hook payload");
            serde_json::from_value(raw)
                .map_err(|e| Error::ContextError(format!("Invalid hook payload: {e}")))
        } else {
            let context = serde_json::from_value(raw)
                .map_err(|e| Error::ContextError(format!("Invalid answers: {e}")))?;
            Ok(Self { template_dir: None, output_dir: None, context })
        }
    }

    /// Reads hook input from `path`, or from stdin when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!("Loading context from {}", path.display());
                Self::parse(&std::fs::read_to_string(path)?)
            }
            None => {
                debug!("Loading context from stdin");
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                Self::parse(&buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_forms() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("y"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_rejects_unknown_flag_text() {
        let content = r#"{"project_name": "A", "project_slug": "a",
            "python_version": "3.10", "with_cuda": "sometimes"}"#;
        assert!(HookInput::parse(content).is_err());
    }
}
