//! Removal of optional components the user declined.

use crate::constants::{DOCS_DIR, ENTRY_POINT_FILE, NOTEBOOKS_DIR, TESTS_DIR};
use crate::context::GenerationContext;
use crate::error::Result;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Code belonging to one optional feature of the generated entry point.
struct FeatureCode {
    imports: &'static [&'static str],
    function: &'static str,
    call_comment: &'static str,
}

const VISUALIZATION_CODE: FeatureCode = FeatureCode {
    imports: &["import matplotlib.pyplot as plt", "import seaborn as sns"],
    function: "visualize_data",
    call_comment: "# Visualize the data",
};

const DATA_ANALYSIS_CODE: FeatureCode = FeatureCode {
    imports: &["import pandas as pd", "import numpy as np"],
    function: "analyze_data",
    call_comment: "# Analyze the data",
};

/// Deletes `docs`, `notebooks` and `tests` when their feature was declined.
///
/// Removal is best effort: failures are logged and the directory is left in
/// whatever state the failed removal produced.
///
/// # Returns
/// The directories that were actually removed.
pub fn remove_optional_dirs<P: AsRef<Path>>(
    project_dir: P,
    context: &GenerationContext,
) -> Vec<PathBuf> {
    let candidates = [
        (DOCS_DIR, context.include_documentation, "documentation"),
        (NOTEBOOKS_DIR, context.include_jupyter, "notebooks"),
        (TESTS_DIR, context.include_tests, "tests"),
    ];

    let mut removed = Vec::new();
    for (dir, wanted, what) in candidates {
        let path = project_dir.as_ref().join(dir);
        if wanted || !path.exists() {
            continue;
        }
        info!("Removing {what} directory (not requested)");
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed.push(path),
            Err(e) => warn!("Could not remove {}: {e}", path.display()),
        }
    }
    removed
}

fn strip_feature(source: &str, code: &FeatureCode) -> String {
    let definition = format!("def {}(", code.function);
    let call = format!("{}(", code.function);

    let mut kept: Vec<&str> = Vec::new();
    let mut in_function = false;
    for line in source.split('\n') {
        if in_function {
            // The body ends at the first non-blank line back at column zero.
            if line.trim().is_empty() || line.starts_with([' ', '\t']) {
                continue;
            }
            in_function = false;
        }

        if line.starts_with(&definition) {
            while kept.last().is_some_and(|previous| previous.starts_with('@')) {
                kept.pop();
            }
            in_function = true;
            continue;
        }

        let trimmed = line.trim();
        if code.imports.contains(&trimmed)
            || trimmed == code.call_comment
            || trimmed.starts_with(&call)
        {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Removes the code of declined features from the entry-point source.
///
/// For each declined feature this drops its imports, its whole function
/// definition (decorators, the `def` line and its indented body), and its
/// call site in `main`.
pub fn strip_entry_point(source: &str, context: &GenerationContext) -> String {
    let mut content = source.to_string();
    if !context.include_visualization {
        content = strip_feature(&content, &VISUALIZATION_CODE);
    }
    if !context.include_data_analysis {
        content = strip_feature(&content, &DATA_ANALYSIS_CODE);
    }
    content
}

/// Rewrites `src/main.py` when visualization or data analysis was declined.
///
/// # Returns
/// * `Ok(true)` if the file was rewritten
/// * `Ok(false)` if both features are enabled or the file does not exist
pub fn adjust_entry_point<P: AsRef<Path>>(project_dir: P, context: &GenerationContext) -> Result<bool> {
    if context.include_visualization && context.include_data_analysis {
        return Ok(false);
    }
    let entry_point = project_dir.as_ref().join(ENTRY_POINT_FILE);
    if !entry_point.exists() {
        return Ok(false);
    }

    info!("Adjusting {ENTRY_POINT_FILE} for selected features");
    let source = std::fs::read_to_string(&entry_point)?;
    std::fs::write(&entry_point, strip_entry_point(&source, context))?;
    info!("Adjusted {ENTRY_POINT_FILE} based on selected features");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "import os\n\n\ndef visualize_data(data):\n    \"\"\"Plot.\"\"\"\n    plt.plot(data)\n\n    plt.show()\n\n\ndef main():\n    data = 1\n    # Visualize the data\n    visualize_data(data)\n    print(data)\n";

    #[test]
    fn test_strip_feature_removes_whole_block() {
        let stripped = strip_feature(SOURCE, &VISUALIZATION_CODE);
        assert_eq!(
            stripped,
            "import os\n\n\ndef main():\n    data = 1\n    print(data)\n"
        );
    }

    #[test]
    fn test_strip_feature_keeps_unrelated_code() {
        let stripped = strip_feature(SOURCE, &DATA_ANALYSIS_CODE);
        assert_eq!(stripped, SOURCE);
    }
}
