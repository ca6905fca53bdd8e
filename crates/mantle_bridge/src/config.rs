//! # Bridge Configuration
//!
//! Loaded once at module startup from a TOML file.
//!
//! ```toml
//! project_path = "/opt/game"
//! hosting_library = "/opt/game/Managed/libmantle_host.so"
//! entry_point = "mantle_managed_command"
//! tick_phases = ["pre-physics", "post-update"]
//! ```

use std::path::{Path, PathBuf};

use mantle_protocol::TickPhase;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Symbol the hosting library exports by default.
pub const DEFAULT_ENTRY_POINT: &str = "mantle_managed_command";

/// Directory under the project that holds user assemblies by default.
pub const DEFAULT_ASSEMBLIES_DIR: &str = "Managed";

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_owned()
}

fn default_tick_phases() -> Vec<TickPhase> {
    TickPhase::ALL.to_vec()
}

fn default_hosting_library() -> PathBuf {
    PathBuf::from(libloading::library_filename("mantle_host"))
}

/// Bridge configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Project root.
    pub project_path: PathBuf,
    /// Where user assemblies live. Defaults to `<project>/Managed`.
    #[serde(default)]
    pub user_assemblies_path: Option<PathBuf>,
    /// Shared library that hosts the managed runtime.
    #[serde(default = "default_hosting_library")]
    pub hosting_library: PathBuf,
    /// Exported symbol returning the managed command function.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Phases to register tick hooks for.
    #[serde(default = "default_tick_phases")]
    pub tick_phases: Vec<TickPhase>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            user_assemblies_path: None,
            hosting_library: default_hosting_library(),
            entry_point: default_entry_point(),
            tick_phases: default_tick_phases(),
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration for a project root with defaults elsewhere.
    #[must_use]
    pub fn for_project(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigParse`] on malformed input and
    /// [`BridgeError::InvalidConfig`] if validation fails.
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigIo`] if the file can't be read, otherwise
    /// as [`BridgeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.project_path.as_os_str().is_empty() {
            return Err(BridgeError::InvalidConfig("project_path is empty".into()));
        }
        if self.hosting_library.as_os_str().is_empty() {
            return Err(BridgeError::InvalidConfig("hosting_library is empty".into()));
        }
        if self.entry_point.is_empty() {
            return Err(BridgeError::InvalidConfig("entry_point is empty".into()));
        }
        if self.entry_point.contains('\0') {
            return Err(BridgeError::InvalidConfig("entry_point contains a NUL byte".into()));
        }
        let mut phases = self.tick_phases.clone();
        phases.sort_unstable();
        phases.dedup();
        if phases.len() != self.tick_phases.len() {
            return Err(BridgeError::InvalidConfig("tick_phases lists a phase twice".into()));
        }
        Ok(())
    }

    /// Resolved user assemblies directory.
    #[must_use]
    pub fn user_assemblies_dir(&self) -> PathBuf {
        self.user_assemblies_path
            .clone()
            .unwrap_or_else(|| self.project_path.join(DEFAULT_ASSEMBLIES_DIR))
    }

    /// Returns true if the phase should get a tick hook.
    #[must_use]
    pub fn ticks(&self, phase: TickPhase) -> bool {
        self.tick_phases.contains(&phase)
    }
}
