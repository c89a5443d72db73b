//! passcc Driver Library
//!
//! A clang-compatible front end that routes compilation through an
//! out-of-tree optimizer pass. Build systems call `passcc` the way they
//! call `cc`; the driver decides from `-o` and the file suffixes alone
//! whether the command line means compile, link, both, or neither, and
//! runs the external toolchain accordingly:
//!
//! ```text
//! argv -> scan -> ParsedArgs -> classify -> [Phase] -> Dispatcher -> ToolInvoker
//! ```
//!
//! Anything the classifier cannot interpret is forwarded verbatim to the
//! front-end compiler.
//!
//! ```rust,ignore
//! use passcc::{DriverConfig, ProcessInvoker};
//!
//! let config = DriverConfig::c().with_pass("pre");
//! passcc::run(&["prog.c", "-o", "prog"], &config, ProcessInvoker)?;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod invoke;
pub mod phase;
pub mod scan;

pub use config::{DriverConfig, FileKind, ToolLocator};
pub use dispatch::{Dispatcher, PhasePlan};
pub use error::DriverError;
pub use invoke::{ProcessInvoker, ToolCommand, ToolInvoker};
pub use phase::{Phase, classify, object_file_name};
pub use scan::{OUTPUT_FLAG, ParsedArgs, scan};

/// Printed when the driver is run without arguments
pub const USAGE: &str = "passcc: clang-compatible driver for an out-of-tree optimizer pass\n\
                         usage: passcc [clang options] <file.c|file.o> -o <output>";

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PASSCC_LOG";

/// Drive one invocation (`argv` without the program name).
///
/// An empty command line runs nothing. Otherwise the phases are
/// classified and dispatched in order; the classified phases are returned
/// on success.
pub fn run<S, I>(argv: &[S], config: &DriverConfig, invoker: I) -> Result<Vec<Phase>, DriverError>
where
    S: AsRef<str>,
    I: ToolInvoker,
{
    if argv.is_empty() {
        return Ok(Vec::new());
    }

    let parsed = scan(argv, config);
    let phases = classify(&parsed, config);
    Dispatcher::new(config, invoker).dispatch(&phases, &parsed, argv)?;
    Ok(phases)
}
