//! Post-generation hook: tailors the generated project to the answers.
//! Individual step failures are reported as warnings; the hook only fails when
//! the context itself cannot be loaded.

use std::path::PathBuf;

use clap::Parser;
use sciforge_hooks::{
    cli::PostGenArgs,
    context::HookInput,
    error::{default_error_handler, Result},
    hooks::run_post_gen,
    logger::init_logger,
};

fn main() {
    let args = PostGenArgs::parse();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: PostGenArgs) -> Result<()> {
    let input = HookInput::load(args.context.as_deref())?;
    let project_dir = match args.project_dir.or(input.output_dir) {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    log::debug!("Post-generation hook running in {}", project_dir.display());

    let report = run_post_gen(&project_dir, &input.context);
    if !report.failures.is_empty() {
        log::debug!("{} step(s) reported warnings", report.failures.len());
    }
    Ok(())
}
