//! Common constants used throughout the hooks.

/// Poetry manifest, relative to the project root
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Conda environment definition, relative to the project root
pub const ENVIRONMENT_FILE: &str = "environment.yml";

/// Experiment metadata document, relative to the project root
pub const METADATA_FILE: &str = "config/experiment.toml";

/// Generated entry point, relative to the project root
pub const ENTRY_POINT_FILE: &str = "src/main.py";

pub const LICENSE_FILE: &str = "LICENSE";

pub const DOCS_DIR: &str = "docs";
pub const NOTEBOOKS_DIR: &str = "notebooks";
pub const TESTS_DIR: &str = "tests";

/// Environment variable overriding the license copyright year
pub const YEAR_ENV: &str = "YEAR";

/// Copyright year used when `YEAR` is not set
pub const DEFAULT_LICENSE_YEAR: &str = "2024";

/// Oldest Python release the template targets
pub const MIN_PYTHON_VERSION: (u32, u32) = (3, 8);
