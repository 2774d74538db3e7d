#![doc(html_root_url = "https://docs.rs/tadpole/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! tadpole: one logical namespace over layered asset stores
//! 
//! Assets may live in an override directory, next to the running program,
//! or in a zip archive appended to the program. Callers address all of them
//! by a single logical path; the namespace decides which store wins.
//! 
//! ## Features
//! 
//! - Ordered layers per mount point with Replace, Before and After binds
//! - Merged directory listings that agree with single-file precedence
//! - Directory, zip archive and in-memory backends
//! - Startup detection of an asset directory or appended archive
//! 
//! ## Quick Start
//! 
//! ```rust,no_run
//! use tadpole::{BindMode, Bootstrap, BootstrapConfig, DirBackend, Namespace};
//! 
//! # fn main() -> tadpole::Result<()> {
//! let ns = Namespace::new();
//! let bootstrap = Bootstrap::from_current_exe(BootstrapConfig::default())?;
//! bootstrap.detect(&ns)?;
//! 
//! // A developer override takes precedence over everything detected
//! ns.bind(".", DirBackend::new("/tmp/site-dev"), "dev", BindMode::Before)?;
//! 
//! let page = ns.read_to_string("index.html")?;
//! # Ok(())
//! # }
//! ```
//! 
//! ## Bind Modes
//! 
//! - `Replace`: Replaces every layer at the mount point
//! - `Before`: Adds a layer with higher priority
//! - `After`: Adds a layer with lower priority
//! 
//! [`Namespace::bind_if_empty`] installs a layer only when the mount point
//! has none.

pub mod modules;

pub use modules::archive::ArchiveBackend;
pub use modules::backend::{AssetFile, AssetReader, Backend, DirEntry, FileType, Metadata};
pub use modules::bootstrap::{Bootstrap, BootstrapConfig, Detection};
pub use modules::config::{BindSpec, Config};
pub use modules::dir::DirBackend;
pub use modules::error::{Error, Result};
pub use modules::memory::MemoryBackend;
pub use modules::sub::SubBackend;

// Re-export commonly used types
pub use modules::namespace::{BindMode, Layer, LayerInfo, Namespace};
