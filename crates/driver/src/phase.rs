//! Phase classification
//!
//! Decides from the scanned paths alone which parts of the pipeline a
//! command line asks for:
//!
//! | input  | output        | phases                                 |
//! |--------|---------------|----------------------------------------|
//! | source | object        | `CompileToObject`                      |
//! | source | anything else | `CompileToObject`, `LinkToExecutable`  |
//! | object | not an object | `LinkToExecutable`                     |
//! | other  | -             | `PassThroughLink`                      |
//!
//! A missing output always lands in the last row. When in doubt the
//! classifier forwards the invocation instead of dropping it.

use crate::config::{DriverConfig, FileKind};
use crate::scan::ParsedArgs;
use tracing::debug;

/// One discrete stage of the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Source to object: front end, optimizer pass, code generator
    CompileToObject,
    /// Object to executable
    LinkToExecutable,
    /// Hand the original arguments to the front end unchanged
    PassThroughLink,
}

/// Ordered phases for one invocation
pub fn classify(parsed: &ParsedArgs, config: &DriverConfig) -> Vec<Phase> {
    let input = parsed.input_path.as_deref().map(|p| config.kind_of(p));
    let output = parsed.output_path.as_deref().map(|p| config.kind_of(p));

    let phases = match (input, output) {
        (Some(FileKind::Source), Some(FileKind::Object)) => vec![Phase::CompileToObject],
        (Some(FileKind::Source), Some(_)) => {
            vec![Phase::CompileToObject, Phase::LinkToExecutable]
        }
        (Some(FileKind::Object), Some(kind)) if kind != FileKind::Object => {
            vec![Phase::LinkToExecutable]
        }
        _ => vec![Phase::PassThroughLink],
    };

    debug!(?input, ?output, ?phases, "classified invocation");
    phases
}

/// Name of the object produced for `output_path`: the output itself if it
/// already carries the object suffix, otherwise the output plus the suffix.
pub fn object_file_name(output_path: &str, object_suffix: &str) -> String {
    if output_path.ends_with(object_suffix) {
        output_path.to_string()
    } else {
        format!("{}{}", output_path, object_suffix)
    }
}
