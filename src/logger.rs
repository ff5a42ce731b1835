use std::io::Write;

/// Initializes `env_logger` for a hook binary.
///
/// Hooks talk to the user through stdout, so log records go there too.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .target(env_logger::Target::Stdout)
        .format(|buf, record| match record.level() {
            log::Level::Warn | log::Level::Error => {
                writeln!(buf, "! {}", record.args())
            }
            log::Level::Info => writeln!(buf, "→ {}", record.args()),
            _ => writeln!(buf, "  [{}] {}", record.level(), record.args()),
        })
        .init();
}
