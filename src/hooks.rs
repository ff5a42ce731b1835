//! Pre and post generation hook orchestration.
//! The pre-generation hook is a gate; the post-generation hook runs every
//! customization step in a fixed order, and a failing step never stops the
//! ones after it.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::constants::METADATA_FILE;
use crate::context::GenerationContext;
use crate::environment::update_environment;
use crate::error::Result;
use crate::license::{install_license, license_year};
use crate::manifest::update_manifest;
use crate::metadata::{
    prober_for_host, reconcile, CommandRunner, HardwareProber, ReconcileOutcome,
    SystemCommandRunner,
};
use crate::pruner::{adjust_entry_point, remove_optional_dirs};
use crate::validator::{validate, ValidationReport};

/// Validates the context and prints every diagnostic to stdout.
pub fn run_pre_gen(context: &GenerationContext) -> ValidationReport {
    let virtual_env = std::env::var("VIRTUAL_ENV").ok();
    let report = validate(context, virtual_env.as_deref());

    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    if report.passed() {
        println!("Pre-generation checks passed. Creating project {}...", context.project_name);
    }
    report
}

/// Post-generation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Manifest,
    Environment,
    License,
    EntryPoint,
    Metadata,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Manifest => "update pyproject.toml",
            Step::Environment => "update environment.yml",
            Step::License => "create license file",
            Step::EntryPoint => "adjust main.py",
            Step::Metadata => "record system information",
        })
    }
}

/// What the post-generation pass did; failures were already reported as
/// warnings.
#[derive(Debug, Default)]
pub struct PostGenReport {
    pub failures: Vec<(Step, String)>,
    pub license: Option<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    pub entry_point_adjusted: bool,
    pub metadata: Option<ReconcileOutcome>,
}

impl PostGenReport {
    fn record<T>(&mut self, step: Step, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Could not {step}: {e}");
                self.failures.push((step, e.to_string()));
                None
            }
        }
    }
}

fn print_success(message: &str) {
    println!("✓ {message}");
}

/// Runs the post-generation pass against the real host.
pub fn run_post_gen<P: AsRef<Path>>(project_dir: P, context: &GenerationContext) -> PostGenReport {
    let prober = prober_for_host();
    run_post_gen_with(project_dir, context, &*prober, &SystemCommandRunner, &license_year())
}

/// Runs the post-generation pass with explicit probing collaborators.
pub fn run_post_gen_with<P: AsRef<Path>>(
    project_dir: P,
    context: &GenerationContext,
    prober: &dyn HardwareProber,
    runner: &dyn CommandRunner,
    year: &str,
) -> PostGenReport {
    let project_dir = project_dir.as_ref();
    let mut report = PostGenReport::default();
    info!("Setting up project: {}", context.project_name);

    report.record(Step::Manifest, update_manifest(project_dir, context));

    info!("Setting up conda environment");
    report.record(Step::Environment, update_environment(project_dir, context));

    if context.open_source_license != "None" {
        info!("Setting up {} license", context.open_source_license);
        report.license = report
            .record(Step::License, install_license(project_dir, context, year))
            .flatten();
    }

    report.removed_dirs = remove_optional_dirs(project_dir, context);
    report.entry_point_adjusted = report
        .record(Step::EntryPoint, adjust_entry_point(project_dir, context))
        .unwrap_or(false);

    let metadata_path = project_dir.join(METADATA_FILE);
    report.metadata =
        report.record(Step::Metadata, reconcile(&metadata_path, context, prober, runner));

    print_success("Project setup complete!");
    info!("To get started:");
    println!("  cd {}", context.project_slug);
    println!("  conda env create -f environment.yml");
    println!("  conda activate {}", context.project_slug);
    println!("  poetry install");

    report
}
