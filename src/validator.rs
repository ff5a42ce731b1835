//! Pre-generation validation of the generation context.
//! Fatal problems (empty name, malformed slug, unparsable Python version)
//! abort generation; everything else is reported and generation proceeds.

use crate::constants::MIN_PYTHON_VERSION;
use crate::context::GenerationContext;
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };
        write!(f, "{label}: {}", self.message)
    }
}

/// Outcome of validating a [`GenerationContext`].
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic { severity, message: message.into() });
    }

    /// True when no error-level diagnostic was recorded.
    pub fn passed(&self) -> bool {
        !self.has(Severity::Error)
    }

    pub fn has(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }
}

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid slug pattern"))
}

/// Returns true if `slug` is a valid Python package name for the template.
pub fn is_valid_slug(slug: &str) -> bool {
    slug_regex().is_match(slug)
}

/// Parses the leading `major.minor` of a version string.
///
/// Components after the minor version are not inspected, so `3.10.4` and
/// `3.11.dev` both parse.
pub fn parse_python_version(version: &str) -> Result<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let mut component = || -> Result<u32> {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "Invalid Python version format: {version}. Expected format like '3.10'"
                ))
            })
    };
    let major = component()?;
    let minor = component()?;
    Ok((major, minor))
}

/// Validates the context against the template's syntactic and semantic rules.
///
/// # Arguments
/// * `context` - Resolved generation choices
/// * `virtual_env` - Value of `VIRTUAL_ENV`, if a virtualenv is active
pub fn validate(context: &GenerationContext, virtual_env: Option<&str>) -> ValidationReport {
    let mut report = ValidationReport::default();

    if context.project_name.trim().is_empty() {
        report.push(Severity::Error, "Project name cannot be empty");
    }

    if !is_valid_slug(&context.project_slug) {
        report.push(
            Severity::Error,
            "Project slug must start with a letter and contain only lowercase letters, numbers, and underscores",
        );
    }

    match parse_python_version(&context.python_version) {
        Ok(version) if version < MIN_PYTHON_VERSION => report.push(
            Severity::Warning,
            format!(
                "Python {} is older than the recommended version ({}.{}+)",
                context.python_version, MIN_PYTHON_VERSION.0, MIN_PYTHON_VERSION.1
            ),
        ),
        Ok(_) => {}
        Err(Error::ValidationError(message)) => report.push(Severity::Error, message),
        Err(e) => report.push(Severity::Error, e.to_string()),
    }

    if context.include_visualization && !context.include_data_analysis {
        report.push(
            Severity::Warning,
            "Visualization libraries were requested without data analysis libraries; the generated plots expect pandas and numpy",
        );
    }
    if context.with_cuda && !context.include_ml_libs {
        report.push(
            Severity::Warning,
            "CUDA support was requested without machine learning libraries; only the conda CUDA toolchain will be added",
        );
    }

    if virtual_env.is_some_and(|v| !v.is_empty()) {
        report.push(
            Severity::Note,
            "You are currently in a virtual environment. This project will create a Conda environment. Consider deactivating your current venv first.",
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_version() {
        assert_eq!(parse_python_version("3.10").unwrap(), (3, 10));
        assert_eq!(parse_python_version("3.11.4").unwrap(), (3, 11));
        assert_eq!(parse_python_version("3.12.rc1").unwrap(), (3, 12));
        assert!(parse_python_version("3").is_err());
        assert!(parse_python_version("three.ten").is_err());
        assert!(parse_python_version("").is_err());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic { severity: Severity::Warning, message: "old".to_string() };
        assert_eq!(diagnostic.to_string(), "WARNING: old");
    }
}
