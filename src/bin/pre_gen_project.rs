//! Pre-generation hook: validates the answers and aborts generation with a
//! non-zero exit status when they are unusable.

use clap::Parser;
use sciforge_hooks::{
    cli::PreGenArgs, context::HookInput, error::default_error_handler, hooks::run_pre_gen,
    logger::init_logger,
};

fn main() {
    let args = PreGenArgs::parse();
    init_logger(args.verbose);

    let input = match HookInput::load(args.context.as_deref()) {
        Ok(input) => input,
        Err(err) => return default_error_handler(err),
    };

    if !run_pre_gen(&input.context).passed() {
        std::process::exit(1);
    }
}
