//! Driver configuration
//!
//! Everything that differs between toolchain setups lives here: which
//! suffixes count as sources, which programs run each stage, where the
//! optimizer plugin is and which passes it applies. The phase logic only
//! ever sees a [`DriverConfig`], never a literal path.
//!
//! # Example
//!
//! ```rust,ignore
//! use passcc::DriverConfig;
//!
//! let config = DriverConfig::c()
//!     .with_optimizer_module("/opt/llvm/lib/PREviaLCM.so")
//!     .with_pass("pre");
//! ```
//!
//! # Resolution
//!
//! [`DriverConfig::load`] starts from the defaults, layers the TOML file
//! named by `PASSCC_CONFIG` (or the per-user file if one exists), then
//! applies the `PASSCC_*` environment overrides.

use crate::error::DriverError;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Names an explicit config file
pub const CONFIG_ENV: &str = "PASSCC_CONFIG";

/// Default object suffix
pub const OBJECT_SUFFIX: &str = ".o";

/// How a filename is treated, decided by suffix alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Object,
    Unrecognized,
}

/// Programs run for each stage, looked up on `PATH` unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolLocator {
    /// Front-end compiler; also receives pass-through invocations
    pub frontend: String,
    /// Optimizer that loads the pass module
    pub optimizer: String,
    /// Code generator producing native objects
    pub codegen: String,
    pub linker: String,
}

impl Default for ToolLocator {
    fn default() -> Self {
        ToolLocator {
            frontend: "clang".to_string(),
            optimizer: "opt".to_string(),
            codegen: "llc".to_string(),
            linker: "clang".to_string(),
        }
    }
}

/// Configuration for the driver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Suffixes of files that need compiling (e.g. `.c`, `.cpp`)
    pub source_suffixes: Vec<String>,

    /// Suffix of compiled-but-unlinked objects
    pub object_suffix: String,

    /// Plugin handed to the optimizer with `-load`
    pub optimizer_module: Option<PathBuf>,

    /// Passes to run, without the leading dash (`pre` becomes `-pre`)
    pub optimizer_passes: Vec<String>,

    /// Flags for the front end, placed after `-c`
    pub compile_flags: Vec<String>,

    pub optimizer_flags: Vec<String>,

    /// Flags placed before the object file on the link line
    pub link_flags: Vec<String>,

    /// Keep the scratch directory holding the `.bc` files between stages
    pub keep_intermediates: bool,

    pub tools: ToolLocator,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            source_suffixes: vec![".c".to_string(), ".cpp".to_string()],
            object_suffix: OBJECT_SUFFIX.to_string(),
            optimizer_module: None,
            optimizer_passes: Vec::new(),
            compile_flags: vec!["-O0".to_string(), "-emit-llvm".to_string()],
            optimizer_flags: vec!["-stats".to_string()],
            link_flags: vec!["-g".to_string()],
            keep_intermediates: false,
            tools: ToolLocator::default(),
        }
    }
}

impl DriverConfig {
    /// General preset: C and C++ sources
    pub fn cxx() -> Self {
        DriverConfig::default()
    }

    /// Narrow preset: C sources only
    pub fn c() -> Self {
        DriverConfig {
            source_suffixes: vec![".c".to_string()],
            ..DriverConfig::default()
        }
    }

    /// Set the optimizer plugin (builder pattern)
    pub fn with_optimizer_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.optimizer_module = Some(path.into());
        self
    }

    /// Append a pass to run
    pub fn with_pass(mut self, pass: impl AsRef<str>) -> Self {
        self.optimizer_passes.push(pass_name(pass.as_ref()));
        self
    }

    /// Recognize another source suffix; the leading dot is optional
    pub fn with_source_suffix(mut self, suffix: impl AsRef<str>) -> Self {
        if let Some(suffix) = normalize_suffix(suffix.as_ref()) {
            self.source_suffixes.push(suffix);
        }
        self
    }

    pub fn with_tools(mut self, tools: ToolLocator) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Classify a path by suffix. The object suffix is checked first, so it
    /// wins even if it also appears among the source suffixes.
    pub fn kind_of(&self, path: &str) -> FileKind {
        if path.ends_with(&self.object_suffix) {
            FileKind::Object
        } else if self.source_suffixes.iter().any(|s| path.ends_with(s)) {
            FileKind::Source
        } else {
            FileKind::Unrecognized
        }
    }

    /// True for anything the scanner may take as an input file
    pub fn is_recognized(&self, path: &str) -> bool {
        self.kind_of(path) != FileKind::Unrecognized
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: DriverConfig = toml::from_str(toml_str).map_err(|e| e.to_string())?;
        config.normalized()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DriverError> {
        let content = fs::read_to_string(path).map_err(|e| DriverError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|message| DriverError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Resolve the configuration for this process
    pub fn load() -> Result<Self, DriverError> {
        let base = match env::var_os(CONFIG_ENV) {
            Some(path) => {
                debug!(path = ?path, "loading config named by {}", CONFIG_ENV);
                Self::from_file(Path::new(&path))?
            }
            None => match user_config_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "loading user config");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(base.with_env_overrides(|key| env::var(key).ok()))
    }

    /// Apply `PASSCC_*` overrides using `lookup` to read variables
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(module) = lookup("PASSCC_OPT_MODULE") {
            self.optimizer_module = Some(PathBuf::from(module));
        }
        if let Some(passes) = lookup("PASSCC_PASSES") {
            self.optimizer_passes = split_list(&passes).map(pass_name).collect();
        }
        if let Some(suffixes) = lookup("PASSCC_SOURCE_SUFFIXES") {
            self.source_suffixes = split_list(&suffixes).filter_map(normalize_suffix).collect();
        }
        let tools = [
            ("PASSCC_FRONTEND", &mut self.tools.frontend),
            ("PASSCC_OPT", &mut self.tools.optimizer),
            ("PASSCC_LLC", &mut self.tools.codegen),
            ("PASSCC_LINKER", &mut self.tools.linker),
        ];
        for (key, slot) in tools {
            if let Some(program) = lookup(key).filter(|p| !p.is_empty()) {
                *slot = program;
            }
        }
        self
    }

    fn normalized(mut self) -> Result<Self, String> {
        self.source_suffixes = self
            .source_suffixes
            .iter()
            .filter_map(|s| normalize_suffix(s))
            .collect();
        self.object_suffix = normalize_suffix(&self.object_suffix)
            .ok_or_else(|| "object_suffix cannot be empty".to_string())?;
        self.optimizer_passes = self.optimizer_passes.iter().map(|p| pass_name(p)).collect();
        Ok(self)
    }
}

/// Per-user config: $XDG_CONFIG_HOME/passcc/config.toml or ~/.config/passcc/config.toml
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config);
        if path.is_absolute() {
            return Some(path.join("passcc").join("config.toml"));
        }
    }

    if let Ok(home) = env::var("HOME") {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("passcc")
                .join("config.toml"),
        );
    }

    None
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_suffix(suffix: &str) -> Option<String> {
    let suffix = suffix.trim();
    match suffix {
        "" | "." => None,
        s if s.starts_with('.') => Some(s.to_string()),
        s => Some(format!(".{}", s)),
    }
}

fn pass_name(pass: &str) -> String {
    pass.trim().trim_start_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_kind_of_default_suffixes() {
        let config = DriverConfig::default();
        assert_eq!(config.kind_of("prog.c"), FileKind::Source);
        assert_eq!(config.kind_of("prog.cpp"), FileKind::Source);
        assert_eq!(config.kind_of("prog.o"), FileKind::Object);
        assert_eq!(config.kind_of("prog"), FileKind::Unrecognized);
        assert_eq!(config.kind_of("prog.cc"), FileKind::Unrecognized);
        assert_eq!(config.kind_of(""), FileKind::Unrecognized);
    }

    #[test]
    fn test_c_preset_rejects_cpp() {
        let config = DriverConfig::c();
        assert_eq!(config.kind_of("prog.c"), FileKind::Source);
        assert_eq!(config.kind_of("prog.cpp"), FileKind::Unrecognized);
        assert!(config.is_recognized("prog.o"));
    }

    #[test]
    fn test_object_suffix_wins_over_source_list() {
        let config = DriverConfig::default().with_source_suffix("o");
        assert_eq!(config.kind_of("prog.o"), FileKind::Object);
    }

    #[test]
    fn test_builder() {
        let config = DriverConfig::c()
            .with_optimizer_module("/opt/llvm/lib/PREviaLCM.so")
            .with_pass("-pre")
            .with_source_suffix("cc")
            .with_keep_intermediates(true);

        assert_eq!(
            config.optimizer_module,
            Some(PathBuf::from("/opt/llvm/lib/PREviaLCM.so"))
        );
        assert_eq!(config.optimizer_passes, vec!["pre"]);
        assert_eq!(config.source_suffixes, vec![".c", ".cc"]);
        assert!(config.keep_intermediates);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DriverConfig::from_toml(
            r#"
            source_suffixes = ["c", ".ll"]
            optimizer_module = "/usr/local/lib/PREviaLCM.so"
            optimizer_passes = ["pre", "-dce"]

            [tools]
            optimizer = "opt-17"
            "#,
        )
        .unwrap();

        assert_eq!(config.source_suffixes, vec![".c", ".ll"]);
        assert_eq!(config.optimizer_passes, vec!["pre", "dce"]);
        assert_eq!(config.tools.optimizer, "opt-17");
        assert_eq!(config.tools.codegen, "llc");
        assert_eq!(config.object_suffix, ".o");
        assert_eq!(config.link_flags, vec!["-g"]);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = DriverConfig::from_toml("optimiser_passes = [\"pre\"]").unwrap_err();
        assert!(err.contains("optimiser_passes"), "unexpected error: {}", err);
    }

    #[test]
    fn test_from_toml_rejects_empty_object_suffix() {
        let err = DriverConfig::from_toml("object_suffix = \"\"").unwrap_err();
        assert!(err.contains("object_suffix"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = DriverConfig::from_file(Path::new("/nonexistent/passcc.toml")).unwrap_err();
        assert!(matches!(err, DriverError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PASSCC_OPT_MODULE", "/tmp/PREviaLCM.dylib"),
            ("PASSCC_PASSES", "pre, -licm,,"),
            ("PASSCC_SOURCE_SUFFIXES", "c"),
            ("PASSCC_LLC", "llc-17"),
            ("PASSCC_LINKER", ""),
        ]
        .into_iter()
        .collect();

        let config = DriverConfig::default()
            .with_env_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.optimizer_module,
            Some(PathBuf::from("/tmp/PREviaLCM.dylib"))
        );
        assert_eq!(config.optimizer_passes, vec!["pre", "licm"]);
        assert_eq!(config.source_suffixes, vec![".c"]);
        assert_eq!(config.tools.codegen, "llc-17");
        // Empty values leave the tool alone
        assert_eq!(config.tools.linker, "clang");
    }

    #[test]
    #[serial]
    fn test_load_from_named_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "optimizer_passes = [\"pre\"]").unwrap();

        let orig_config = env::var_os(CONFIG_ENV);
        let orig_passes = env::var_os("PASSCC_PASSES");

        // SAFETY: serialized with the other environment-mutating tests
        unsafe {
            env::set_var(CONFIG_ENV, file.path());
            env::set_var("PASSCC_PASSES", "gvn");
        }
        let config = DriverConfig::load();

        // SAFETY: Restoring environment to original state
        unsafe {
            match orig_config {
                Some(v) => env::set_var(CONFIG_ENV, v),
                None => env::remove_var(CONFIG_ENV),
            }
            match orig_passes {
                Some(v) => env::set_var("PASSCC_PASSES", v),
                None => env::remove_var("PASSCC_PASSES"),
            }
        }

        // The environment beats the file
        assert_eq!(config.unwrap().optimizer_passes, vec!["gvn"]);
    }

    #[test]
    #[serial]
    fn test_user_config_path_with_xdg() {
        let orig_xdg = env::var("XDG_CONFIG_HOME").ok();

        // SAFETY: serialized with the other environment-mutating tests
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        }
        let path = user_config_path();

        // SAFETY: Restoring environment to original state
        unsafe {
            match orig_xdg {
                Some(v) => env::set_var("XDG_CONFIG_HOME", v),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(
            path,
            Some(PathBuf::from("/tmp/test-xdg-config/passcc/config.toml"))
        );
    }
}
