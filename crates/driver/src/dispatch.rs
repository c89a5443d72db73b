//! Pipeline dispatch
//!
//! Turns classified phases into tool invocations and runs them in order.
//! A compile phase is three separate invocations joined by files in a
//! a private scratch directory (`.passcc-XXXXXX`) next to the object:
//!
//! ```text
//! frontend -c <compile_flags> prog.c -o -   > $SCRATCH/prog.bc
//! optimizer <flags> -load <module> -<pass>  < $SCRATCH/prog.bc      > $SCRATCH/prog.opt.bc
//! codegen -filetype=obj                     < $SCRATCH/prog.opt.bc  > prog.o
//! ```
//!
//! so a failure in any stage is seen on its own, and no file the user owns
//! is touched besides the object and the final output. The object is left on
//! disk after linking; the scratch directory is removed unless the
//! configuration keeps it.

use crate::config::{DriverConfig, FileKind};
use crate::error::DriverError;
use crate::invoke::{ToolCommand, ToolInvoker};
use crate::phase::{Phase, object_file_name};
use crate::scan::ParsedArgs;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

/// Prefix of the per-compile scratch directory
pub const SCRATCH_PREFIX: &str = ".passcc-";

/// Commands for one phase plus the scratch directory they write into
#[derive(Debug)]
pub struct PhasePlan {
    pub phase: Phase,
    pub commands: Vec<ToolCommand>,
    /// Holds the intermediate IR; removed on drop
    pub scratch: Option<TempDir>,
}

/// Runs phases through a [`ToolInvoker`]
pub struct Dispatcher<'a, I: ToolInvoker> {
    config: &'a DriverConfig,
    invoker: I,
}

impl<'a, I: ToolInvoker> Dispatcher<'a, I> {
    pub fn new(config: &'a DriverConfig, invoker: I) -> Self {
        Dispatcher { config, invoker }
    }

    /// Plan every phase, then run them in order.
    ///
    /// Planning happens up front, so a missing input or output fails before
    /// any tool starts. The first non-zero exit stops the run.
    pub fn dispatch<S: AsRef<str>>(
        &mut self,
        phases: &[Phase],
        parsed: &ParsedArgs,
        invocation: &[S],
    ) -> Result<(), DriverError> {
        let plans = phases
            .iter()
            .map(|phase| self.plan(*phase, parsed, invocation))
            .collect::<Result<Vec<_>, _>>()?;

        let keep = self.config.keep_intermediates;
        for mut plan in plans {
            debug!(phase = ?plan.phase, "starting phase");
            let result = plan
                .commands
                .iter()
                .try_for_each(|command| self.execute(command));
            if let Some(scratch) = plan.scratch.take().filter(|_| keep) {
                let path = scratch.keep();
                debug!(path = %path.display(), "kept intermediates");
            }
            result?;
        }

        Ok(())
    }

    /// Build the commands for one phase without running anything.
    ///
    /// A compile phase creates its (empty) scratch directory here.
    pub fn plan<S: AsRef<str>>(
        &self,
        phase: Phase,
        parsed: &ParsedArgs,
        invocation: &[S],
    ) -> Result<PhasePlan, DriverError> {
        match phase {
            Phase::CompileToObject => {
                let input = parsed
                    .input_path
                    .as_deref()
                    .ok_or(DriverError::MissingInputPath)?;
                let output = parsed
                    .output_path
                    .as_deref()
                    .ok_or(DriverError::MissingOutputPath)?;
                self.compile_plan(input, &self.object_for(output))
            }
            Phase::LinkToExecutable => {
                let output = parsed
                    .output_path
                    .as_deref()
                    .ok_or(DriverError::MissingOutputPath)?;
                let object = match parsed.input_path.as_deref() {
                    Some(input) if self.config.kind_of(input) == FileKind::Object => {
                        input.to_string()
                    }
                    _ => self.object_for(output),
                };
                Ok(PhasePlan {
                    phase,
                    commands: vec![self.link_command(&object, output)],
                    scratch: None,
                })
            }
            Phase::PassThroughLink => Ok(PhasePlan {
                phase,
                commands: vec![
                    ToolCommand::new("frontend", &self.config.tools.frontend)
                        .args(invocation.iter().map(AsRef::<str>::as_ref)),
                ],
                scratch: None,
            }),
        }
    }

    /// Give back the invoker, e.g. to inspect a recorder
    pub fn into_invoker(self) -> I {
        self.invoker
    }

    fn object_for(&self, output: &str) -> String {
        object_file_name(output, &self.config.object_suffix)
    }

    fn compile_plan(&self, input: &str, object: &str) -> Result<PhasePlan, DriverError> {
        let tools = &self.config.tools;
        let scratch = scratch_dir(object)?;
        let stem = Path::new(object)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ir");
        let ir = scratch.path().join(format!("{}.bc", stem));
        let optimized_ir = scratch.path().join(format!("{}.opt.bc", stem));

        let frontend = ToolCommand::new("frontend", &tools.frontend)
            .arg("-c")
            .args(self.config.compile_flags.iter().map(String::as_str))
            .arg(input)
            .args(["-o", "-"])
            .stdout_to(&ir);

        let mut optimizer = ToolCommand::new("optimizer", &tools.optimizer)
            .args(self.config.optimizer_flags.iter().map(String::as_str));
        if let Some(module) = &self.config.optimizer_module {
            optimizer = optimizer.arg("-load").arg(module.to_string_lossy());
        }
        let optimizer = optimizer
            .args(self.config.optimizer_passes.iter().map(|pass| format!("-{}", pass)))
            .stdin_from(&ir)
            .stdout_to(&optimized_ir);

        let codegen = ToolCommand::new("codegen", &tools.codegen)
            .arg("-filetype=obj")
            .stdin_from(&optimized_ir)
            .stdout_to(object);

        Ok(PhasePlan {
            phase: Phase::CompileToObject,
            commands: vec![frontend, optimizer, codegen],
            scratch: Some(scratch),
        })
    }

    fn link_command(&self, object: &str, output: &str) -> ToolCommand {
        ToolCommand::new("linker", &self.config.tools.linker)
            .args(self.config.link_flags.iter().map(String::as_str))
            .arg(object)
            .args(["-o", output])
    }

    fn execute(&mut self, command: &ToolCommand) -> Result<(), DriverError> {
        match self.invoker.run(command)? {
            0 => Ok(()),
            code => {
                debug!(tool = command.tool, code, "tool failed; skipping remaining stages");
                Err(DriverError::ToolFailed {
                    tool: command.tool,
                    code,
                })
            }
        }
    }
}

/// Fresh scratch directory beside the object
fn scratch_dir(object: &str) -> Result<TempDir, DriverError> {
    let dir = match Path::new(object).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(dir)
        .map_err(|source| DriverError::Io {
            path: dir.to_path_buf(),
            source,
        })
}
