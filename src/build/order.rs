//! Build order - the parameters one resolution pass runs under.

use std::path::PathBuf;

use crate::engine::types::{Architecture, Platform};

/// The immutable parameter set for a single resolution pass.
///
/// One description file is interpreted once per (configuration,
/// architecture) pair; each pass gets its own `BuildOrder` so passes never
/// share mutable parameter state and can run concurrently. Relative paths
/// resolve against `base_path` rather than the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
    /// Root name this order was issued for (may be empty until chosen).
    pub root: String,

    /// Active configuration name, e.g. "Debug".
    pub configuration: String,

    /// Active target architecture.
    pub architecture: Architecture,

    /// Active target platform.
    pub platform: Platform,

    /// Directory the root description file lives in; the anchor for
    /// relative path resolution.
    pub base_path: PathBuf,

    /// Validation mode: conditional directives enter their bodies
    /// unconditionally so every branch is checked for errors.
    pub validation_mode: bool,

    /// Treat `Include()` directives as no-ops (single-file validation).
    pub disable_includes: bool,
}

impl BuildOrder {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        BuildOrder {
            root: String::new(),
            configuration: "Debug".to_string(),
            architecture: Architecture::host(),
            platform: Platform::host(),
            base_path: base_path.into(),
            validation_mode: false,
            disable_includes: false,
        }
    }

    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn for_validation(mut self, disable_includes: bool) -> Self {
        self.validation_mode = true;
        self.disable_includes = disable_includes;
        self
    }
}
