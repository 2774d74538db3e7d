//! JSON configuration for the bootstrap policy and explicit binds.
//!
//! ```json
//! {
//!   "asset_dir": "assets",
//!   "override_disables_fallback": true,
//!   "bind_exe_dir": false,
//!   "binds": [
//!     { "source": "/srv/site-overrides", "mode": "before", "label": "dev" },
//!     { "source": "vendor", "mount": "static/vendor" }
//!   ]
//! }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::bootstrap::BootstrapConfig;
use super::constants::{LABEL_OVERRIDE, ROOT_MOUNT};
use super::dir::DirBackend;
use super::error::{Error, Result};
use super::namespace::{BindMode, Namespace};

fn default_mount() -> String {
    ROOT_MOUNT.to_string()
}

/// One explicit directory bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindSpec {
    /// Directory to serve. Relative paths resolve against the config file's directory.
    pub source: PathBuf,
    /// Mount path inside the namespace
    #[serde(default = "default_mount")]
    pub mount: String,
    /// Position relative to layers already bound at `mount`
    #[serde(default)]
    pub mode: BindMode,
    /// Diagnostic label, defaults to `"override"`
    #[serde(default)]
    pub label: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection settings.
    #[serde(flatten)]
    pub bootstrap: BootstrapConfig,
    /// Also bind the program's own directory as a fallback.
    pub bind_exe_dir: bool,
    /// Explicit binds applied after detection, in order.
    pub binds: Vec<BindSpec>,
}

impl Config {
    /// Loads a configuration file.
    ///
    /// Relative bind sources are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Config` if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;

        if let Some(base) = path.parent() {
            for spec in &mut config.binds {
                if spec.source.is_relative() {
                    spec.source = base.join(&spec.source);
                }
            }
        }
        Ok(config)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Applies the explicit binds, in order.
    pub fn apply(&self, ns: &Namespace) -> Result<()> {
        for spec in &self.binds {
            let label = spec.label.as_deref().unwrap_or(LABEL_OVERRIDE);
            info!(
                "binding {} at {} ({:?}) as {}",
                spec.source.display(),
                spec.mount,
                spec.mode,
                label
            );
            ns.bind(&spec.mount, DirBackend::new(&spec.source), label, spec.mode)?;
        }
        Ok(())
    }
}
