//! Argument scanning
//!
//! One pass over a clang-style command line that picks out the `-o` value
//! and the input file. Every other flag is ignored here; pass-through
//! invocations forward the original arguments untouched.

use crate::config::DriverConfig;
use tracing::debug;

/// Flag whose following argument names the output
pub const OUTPUT_FLAG: &str = "-o";

/// Input and output paths found on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
}

impl ParsedArgs {
    pub fn new(input_path: Option<&str>, output_path: Option<&str>) -> Self {
        ParsedArgs {
            input_path: input_path.map(str::to_string),
            output_path: output_path.map(str::to_string),
        }
    }
}

/// Scan `argv` (without the program name).
///
/// `-o` consumes the next argument; a trailing `-o` leaves the output unset.
/// A non-flag argument with a recognized suffix is an input candidate and
/// the last candidate wins. Nothing is validated here.
pub fn scan<S: AsRef<str>>(argv: &[S], config: &DriverConfig) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut tokens = argv.iter().map(AsRef::<str>::as_ref);

    while let Some(token) = tokens.next() {
        if token == OUTPUT_FLAG {
            parsed.output_path = tokens.next().map(str::to_string);
        } else if !token.starts_with('-') && config.is_recognized(token) {
            if let Some(previous) = &parsed.input_path {
                debug!(previous = %previous, replacement = token, "multiple input candidates");
            }
            parsed.input_path = Some(token.to_string());
        }
    }

    parsed
}
