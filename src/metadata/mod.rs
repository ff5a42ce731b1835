//! System metadata reconciliation.
//! Merges host facts (OS, CPU, memory, GPU, tool versions) into the generated
//! experiment metadata document without adding top-level structure.

use crate::context::GenerationContext;
use crate::error::Result;
use log::{debug, info, warn};
use std::path::Path;

pub mod facts;
pub mod probe;
pub mod writer;

pub use facts::{HostFacts, Subtrees};
pub use probe::{prober_for_host, CommandRunner, HardwareProber, SystemCommandRunner};
pub use writer::{default_writers, MetadataWriter};

/// What [`reconcile`] did with the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The document does not exist
    Skipped,
    /// The document declares none of the system/hardware/software subtrees
    Unchanged,
    /// The document was rewritten by the named writer
    Written { writer: &'static str },
}

/// Merges host facts into the metadata document at `path` using the default
/// writer chain.
pub fn reconcile<P: AsRef<Path>>(
    path: P,
    context: &GenerationContext,
    prober: &dyn HardwareProber,
    runner: &dyn CommandRunner,
) -> Result<ReconcileOutcome> {
    reconcile_with(path, context, prober, runner, &default_writers())
}

/// Same as [`reconcile`] with an explicit writer chain.
///
/// # Errors
/// * `Error::IoError` if the document cannot be read or written
/// * `Error::TomlError` if the document is not valid TOML
/// * the last writer's error if every writer in the chain fails
pub fn reconcile_with<P: AsRef<Path>>(
    path: P,
    context: &GenerationContext,
    prober: &dyn HardwareProber,
    runner: &dyn CommandRunner,
    writers: &[Box<dyn MetadataWriter>],
) -> Result<ReconcileOutcome> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No metadata document at {}", path.display());
        return Ok(ReconcileOutcome::Skipped);
    }

    let original = std::fs::read_to_string(path)?;
    let document: toml::Table = toml::from_str(&original)?;
    let subtrees = Subtrees::detect(&document);
    debug!("Metadata subtrees present: {subtrees:?}");
    if !subtrees.any() {
        return Ok(ReconcileOutcome::Unchanged);
    }

    let patches = HostFacts::collect(subtrees, context, prober, runner).patches();
    if patches.is_empty() {
        return Ok(ReconcileOutcome::Unchanged);
    }

    let mut last_error = None;
    for writer in writers {
        match writer.render(&original, &patches) {
            Ok(rendered) => {
                std::fs::write(path, rendered)?;
                info!("Recorded system information in {}", path.display());
                return Ok(ReconcileOutcome::Written { writer: writer.name() });
            }
            Err(e) => {
                warn!("{} writer failed for {}: {e}", writer.name(), path.display());
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(ReconcileOutcome::Unchanged),
    }
}
