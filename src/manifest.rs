//! Dependency injection into the generated Poetry manifest.

use crate::constants::MANIFEST_FILE;
use crate::context::GenerationContext;
use crate::error::Result;
use log::{debug, info, warn};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Section header the optional dependencies are spliced in front of.
pub const DEV_DEPENDENCIES_ANCHOR: &str = "[tool.poetry.group.dev.dependencies]";

/// Header prefix of the pytest configuration section.
pub const PYTEST_SECTION_PREFIX: &str = "[tool.pytest.ini_options]";

const ML_DEPENDENCIES: &[&str] = &[r#"scikit-learn = "^1.2.0""#];
const ML_CUDA_DEPENDENCIES: &[&str] =
    &[r#"scikit-learn = "^1.2.0""#, r#"tensorflow = "^2.12.0""#];
const VISUALIZATION_DEPENDENCIES: &[&str] =
    &[r#"matplotlib = "^3.7.0""#, r#"seaborn = "^0.12.0""#, r#"plotly = "^5.13.0""#];
const DATA_ANALYSIS_DEPENDENCIES: &[&str] =
    &[r#"pandas = "^2.0.0""#, r#"numpy = "^1.24.0""#, r#"scipy = "^1.10.0""#];
const JUPYTER_DEPENDENCIES: &[&str] = &[r#"jupyterlab = "^3.6.0""#];

fn pytest_declaration() -> &'static Regex {
    static PYTEST: OnceLock<Regex> = OnceLock::new();
    PYTEST.get_or_init(|| {
        Regex::new(r"^\s*pytest(-cov)?\s*=").expect("valid pytest declaration pattern")
    })
}

/// Builds the ordered dependency lines for every enabled feature.
pub fn feature_dependencies(context: &GenerationContext) -> Vec<&'static str> {
    let mut dependencies = Vec::new();

    if context.include_ml_libs {
        debug!("Including machine learning libraries");
        let group =
            if context.with_cuda { ML_CUDA_DEPENDENCIES } else { ML_DEPENDENCIES };
        dependencies.extend_from_slice(group);
    }
    if context.include_visualization {
        debug!("Including visualization libraries");
        dependencies.extend_from_slice(VISUALIZATION_DEPENDENCIES);
    }
    if context.include_data_analysis {
        debug!("Including data analysis libraries");
        dependencies.extend_from_slice(DATA_ANALYSIS_DEPENDENCIES);
    }
    if context.include_jupyter {
        debug!("Including Jupyter libraries");
        dependencies.extend_from_slice(JUPYTER_DEPENDENCIES);
    }

    dependencies
}

/// Splices the feature dependencies in front of the dev-dependencies header.
///
/// Returns the content unchanged when nothing is enabled or the anchor is
/// missing. Running it twice duplicates the entries.
pub fn inject_dependencies(content: &str, context: &GenerationContext) -> String {
    let dependencies = feature_dependencies(context);
    if dependencies.is_empty() {
        return content.to_string();
    }

    let Some(position) = find_anchor(content) else {
        warn!("{DEV_DEPENDENCIES_ANCHOR} not found, optional libraries were not added");
        return content.to_string();
    };

    let mut updated = String::with_capacity(content.len() + dependencies.len() * 32);
    updated.push_str(&content[..position]);
    updated.push_str(&dependencies.join("\n"));
    updated.push_str("\n\n");
    updated.push_str(&content[position..]);
    updated
}

/// Byte offset of the anchor, only when it sits at the start of a line.
fn find_anchor(content: &str) -> Option<usize> {
    content.match_indices(DEV_DEPENDENCIES_ANCHOR).map(|(i, _)| i).find(|&i| {
        i == 0 || content.as_bytes()[i - 1] == b'\n'
    })
}

/// Removes pytest declarations and the pytest configuration section.
pub fn strip_test_tooling(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_pytest_section = false;

    for line in content.split('\n') {
        if line.starts_with(PYTEST_SECTION_PREFIX) {
            in_pytest_section = true;
            continue;
        } else if in_pytest_section && line.starts_with('[') {
            in_pytest_section = false;
        }

        if in_pytest_section || pytest_declaration().is_match(line) {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Applies the dependency edits to `pyproject.toml` in `project_dir`.
pub fn update_manifest<P: AsRef<Path>>(project_dir: P, context: &GenerationContext) -> Result<()> {
    let manifest_path = project_dir.as_ref().join(MANIFEST_FILE);
    let original = std::fs::read_to_string(&manifest_path)?;

    let mut content = inject_dependencies(&original, context);
    if !context.include_tests {
        content = strip_test_tooling(&content);
        info!("Removed testing packages from {MANIFEST_FILE}");
    }

    if content != original {
        std::fs::write(&manifest_path, content)?;
        info!("Updated {MANIFEST_FILE} with selected libraries");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_must_start_a_line() {
        let content = "# see [tool.poetry.group.dev.dependencies]\n";
        assert_eq!(find_anchor(content), None);
        let content = "a = 1\n[tool.poetry.group.dev.dependencies]\n";
        assert_eq!(find_anchor(content), Some(6));
    }

    #[test]
    fn test_pytest_declaration_pattern() {
        assert!(pytest_declaration().is_match(r#"pytest = "^7.3.1""#));
        assert!(pytest_declaration().is_match(r#"pytest-cov = "^4.1.0""#));
        assert!(!pytest_declaration().is_match(r#"pytest-benchmark = "^4.0""#));
        assert!(!pytest_declaration().is_match("# pytest = none"));
    }
}
