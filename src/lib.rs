//! sciforge-hooks customizes projects generated from the scientific Python
//! template. It provides the validation gate that runs before generation and
//! the post-generation pass that tailors the generated tree to the answers.

/// Command-line interface of the hook binaries
pub mod cli;

/// Common file names and defaults
pub mod constants;

/// Generation context loading (hook payload, JSON or YAML answers)
pub mod context;

/// Conda environment file patching
pub mod environment;

/// Error types and handling
pub mod error;

/// Pre and post generation hook orchestration
pub mod hooks;

/// License file installation
pub mod license;

/// Logger setup for the hook binaries
pub mod logger;

/// Poetry manifest dependency injection
pub mod manifest;

/// Host facts reconciliation into the experiment metadata document
pub mod metadata;

/// Removal of declined optional components
pub mod pruner;

/// Pre-generation validation rules
pub mod validator;
