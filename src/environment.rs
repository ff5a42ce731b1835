//! Conda environment file patching.

use crate::constants::ENVIRONMENT_FILE;
use crate::context::GenerationContext;
use crate::error::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;

/// Top-level key holding the package list.
pub const DEPENDENCIES_HEADER: &str = "dependencies:";

const CUDA_PACKAGES: &[&str] = &["cudatoolkit", "cudnn"];

/// Conda packages the selected features need, in insertion order.
pub fn feature_packages(context: &GenerationContext) -> Vec<&'static str> {
    let mut packages = Vec::new();
    if context.with_cuda {
        packages.extend_from_slice(CUDA_PACKAGES);
    }
    if context.include_jupyter {
        packages.push("jupyterlab");
    }
    if context.include_visualization {
        packages.push("matplotlib-base");
    }
    if context.include_data_analysis {
        packages.extend_from_slice(&["numpy", "pandas"]);
    }
    packages
}

/// Strips channel prefixes and version pins: `conda-forge::numpy>=1.24` -> `numpy`.
fn package_name(requirement: &str) -> &str {
    let requirement = requirement.rsplit("::").next().unwrap_or(requirement).trim();
    let end = requirement
        .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | ' ' | '['))
        .unwrap_or(requirement.len());
    &requirement[..end]
}

/// Package names listed under `dependencies`, or `None` if the document does
/// not parse as a mapping with that key.
fn declared_packages(content: &str) -> Option<HashSet<String>> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).ok()?;
    let dependencies = document.get("dependencies")?.as_sequence()?;
    Some(
        dependencies
            .iter()
            .filter_map(|entry| entry.as_str())
            .map(|requirement| package_name(requirement).to_string())
            .collect(),
    )
}

fn listed_literally(content: &str, package: &str) -> bool {
    content.lines().any(|line| {
        line.trim_start()
            .strip_prefix('-')
            .is_some_and(|requirement| package_name(requirement) == package)
    })
}

/// Byte offset just past the top-level `dependencies:` header line.
fn header_end(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_end() == DEPENDENCIES_HEADER {
            return Some(offset + line.len());
        }
        offset += line.len();
    }
    None
}

/// Adds the packages required by the enabled features to the environment file.
///
/// Packages already present (with or without a version pin) are skipped, and
/// the rest are inserted as one block directly below the header, so the
/// patched list never holds duplicates.
pub fn patch_environment(content: &str, context: &GenerationContext) -> String {
    let wanted = feature_packages(context);
    if wanted.is_empty() {
        return content.to_string();
    }

    let Some(insert_at) = header_end(content) else {
        warn!("No top-level '{DEPENDENCIES_HEADER}' in {ENVIRONMENT_FILE}, packages were not added");
        return content.to_string();
    };

    let declared = declared_packages(content);
    if declared.is_none() {
        debug!("{ENVIRONMENT_FILE} did not parse, falling back to literal package checks");
    }
    let missing: Vec<&str> = wanted
        .into_iter()
        .filter(|package| match &declared {
            Some(declared) => !declared.contains(*package),
            None => !listed_literally(content, package),
        })
        .collect();
    if missing.is_empty() {
        return content.to_string();
    }

    let mut block: String = missing.iter().map(|p| format!("  - {p}\n")).collect();
    // Header on the last line without a trailing newline.
    if !content[..insert_at].ends_with('\n') {
        block.insert(0, '\n');
        block.pop();
    }

    let mut updated = String::with_capacity(content.len() + block.len());
    updated.push_str(&content[..insert_at]);
    updated.push_str(&block);
    updated.push_str(&content[insert_at..]);
    updated
}

/// Applies the package edits to `environment.yml` in `project_dir`.
pub fn update_environment<P: AsRef<Path>>(
    project_dir: P,
    context: &GenerationContext,
) -> Result<()> {
    let env_path = project_dir.as_ref().join(ENVIRONMENT_FILE);
    let original = std::fs::read_to_string(&env_path)?;
    let content = patch_environment(&original, context);
    if content != original {
        std::fs::write(&env_path, content)?;
    }
    info!("Updated {ENVIRONMENT_FILE}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("numpy"), "numpy");
        assert_eq!(package_name(" numpy>=1.24"), "numpy");
        assert_eq!(package_name("python=3.10"), "python");
        assert_eq!(package_name("conda-forge::pandas==2.0"), "pandas");
    }

    #[test]
    fn test_header_end_ignores_nested_keys() {
        let content = "name: demo\n  dependencies:\ndependencies:\n  - pip\n";
        let end = header_end(content).unwrap();
        assert_eq!(&content[end..], "  - pip\n");
    }

    #[test]
    fn test_literal_fallback_matches_whole_names() {
        let content = "dependencies:\n  - numpyro\n  - pandas=2.0\n";
        assert!(!listed_literally(content, "numpy"));
        assert!(listed_literally(content, "pandas"));
    }
}
