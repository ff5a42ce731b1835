//! Command-line interface of the hook binaries.
//! Both hooks work without arguments: the context comes from stdin and the
//! project directory from the hook payload or the current directory.

use clap::Parser;
use std::path::PathBuf;

/// Arguments of the `pre_gen_project` hook.
#[derive(Parser, Debug)]
#[command(author, version, about = "Validates the template answers before the project is generated", long_about = None)]
pub struct PreGenArgs {
    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Read the generation context from this JSON or YAML file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,
}

/// Arguments of the `post_gen_project` hook.
#[derive(Parser, Debug)]
#[command(author, version, about = "Customizes a freshly generated scientific Python project", long_about = None)]
pub struct PostGenArgs {
    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Read the generation context from this JSON or YAML file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Generated project directory.
    /// Defaults to the output directory from the hook payload, then to the
    /// current directory.
    #[arg(short, long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}
