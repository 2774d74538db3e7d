//! Startup policy binding the stores found next to the running program.
//!
//! Detection runs once:
//!
//! 1. If `<exe dir>/<asset_dir>` is a directory it is bound at `.` as
//!    `"asset dir"`. With `override_disables_fallback` set (the default)
//!    detection stops here.
//! 2. Otherwise, or when the fallback stays enabled, the program file is
//!    probed for an appended zip archive, bound after the asset dir as
//!    `"builtin"`.
//! 3. If neither exists the namespace stays empty until the caller binds
//!    something.
//!
//! Failing to open a candidate store is not an error. Failing to locate
//! the program is.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::archive::ArchiveBackend;
use super::backend::Backend;
use super::constants::*;
use super::dir::DirBackend;
use super::error::{Error, Result};
use super::namespace::{BindMode, Namespace};
use super::sub::SubBackend;

/// Knobs for the detection sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Name of the override directory next to the program.
    pub asset_dir: String,
    /// Skip the archive probe once an asset directory was found.
    pub override_disables_fallback: bool,
    /// Probe the program file for an appended archive at all.
    pub probe_archive: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            asset_dir: ASSET_DIR_NAME.to_string(),
            override_disables_fallback: true,
            probe_archive: true,
        }
    }
}

/// What [`Bootstrap::detect`] bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// The asset directory, if one was bound.
    pub asset_dir: Option<PathBuf>,
    /// Whether an archive bundled with the program was bound.
    pub archive: bool,
}

impl Detection {
    /// True when no store was found.
    pub fn is_empty(&self) -> bool {
        self.asset_dir.is_none() && !self.archive
    }
}

/// Binds stores relative to the running program's location.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    exe: PathBuf,
    exe_dir: PathBuf,
    config: BootstrapConfig,
}

impl Bootstrap {
    /// Creates a bootstrap policy for the program at `exe`.
    ///
    /// # Errors
    ///
    /// `ProgramLocation` if `exe` has no parent directory.
    pub fn new(exe: impl Into<PathBuf>, config: BootstrapConfig) -> Result<Self> {
        let exe = exe.into();
        let exe_dir = match exe.parent() {
            Some(dir) if dir.as_os_str().is_empty() => PathBuf::from("."),
            Some(dir) => dir.to_path_buf(),
            None => {
                return Err(Error::ProgramLocation(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no parent directory", exe.display()),
                )))
            }
        };
        Ok(Self {
            exe,
            exe_dir,
            config,
        })
    }

    /// Creates a bootstrap policy for the currently running program.
    ///
    /// # Errors
    ///
    /// `ProgramLocation` if the executable path cannot be determined. This
    /// is the one bootstrap failure callers should treat as fatal.
    pub fn from_current_exe(config: BootstrapConfig) -> Result<Self> {
        let exe = std::env::current_exe().map_err(Error::ProgramLocation)?;
        Self::new(exe, config)
    }

    /// Path of the program.
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Directory containing the program.
    pub fn exe_dir(&self) -> &Path {
        &self.exe_dir
    }

    /// The detection settings in use.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Runs the detection sequence and binds what it finds at `.`.
    pub fn detect(&self, ns: &Namespace) -> Result<Detection> {
        let mut detection = Detection::default();

        let asset_dir = self.exe_dir.join(&self.config.asset_dir);
        match fs::metadata(&asset_dir) {
            Ok(meta) if meta.is_dir() => {
                info!("asset: found local directory {}", asset_dir.display());
                ns.bind(
                    ROOT_MOUNT,
                    DirBackend::new(&asset_dir),
                    LABEL_ASSET_DIR,
                    BindMode::After,
                )?;
                detection.asset_dir = Some(asset_dir);
                if self.config.override_disables_fallback {
                    return Ok(detection);
                }
            }
            Ok(_) => debug!("{} is not a directory, ignoring", asset_dir.display()),
            Err(e) => debug!("no asset directory at {}: {}", asset_dir.display(), e),
        }

        if self.config.probe_archive {
            match ArchiveBackend::open_file(&self.exe) {
                Ok(archive) => {
                    info!("asset: found archive in {}", self.exe.display());
                    ns.bind(ROOT_MOUNT, archive, LABEL_BUILTIN, BindMode::After)?;
                    detection.archive = true;
                }
                Err(e) => debug!("no archive in {}: {}", self.exe.display(), e),
            }
        }

        if detection.is_empty() {
            info!("asset: no asset store found, namespace left empty");
        }
        Ok(detection)
    }

    /// Binds the program's own directory as a last-resort fallback.
    pub fn bind_exe_dir(&self, ns: &Namespace) -> Result<()> {
        ns.bind(
            ROOT_MOUNT,
            DirBackend::new(&self.exe_dir),
            LABEL_EXE_DIR,
            BindMode::After,
        )
    }

    /// Binds `<exe dir>/<name>` ahead of everything bound so far.
    pub fn bind_exe_sub_dir(&self, ns: &Namespace, name: &str) -> Result<()> {
        ns.bind(
            ROOT_MOUNT,
            DirBackend::new(self.exe_dir.join(name)),
            LABEL_EXE_DIR,
            BindMode::Before,
        )
    }

    /// Binds a developer override directory with the highest precedence.
    pub fn bind_override(&self, ns: &Namespace, dir: impl Into<PathBuf>) -> Result<()> {
        ns.bind(
            ROOT_MOUNT,
            DirBackend::new(dir),
            LABEL_OVERRIDE,
            BindMode::Before,
        )
    }

    /// Installs `backend`, restricted to its sub-tree `root`, as the
    /// default store when detection bound nothing.
    ///
    /// Returns whether it was installed.
    pub fn set_default<B: Backend + 'static>(
        &self,
        ns: &Namespace,
        backend: B,
        root: &str,
        label: &str,
    ) -> Result<bool> {
        let sub = SubBackend::new(backend, root)?;
        ns.bind_if_empty(ROOT_MOUNT, sub, label)
    }
}
