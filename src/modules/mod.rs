//! Core asset namespace modules.
//! 
//! This module provides the main components of the namespace:
//! 
//! - `path`: Logical path normalization and mount-prefix arithmetic
//! - `error`: Error type shared by every component
//! - `backend`: The contract every backing store implements
//! - `dir`, `archive`, `memory`, `sub`: Backing store implementations
//! - `namespace`: Layers, bind modes and path resolution
//! - `bootstrap`: Startup detection of the stores next to the program
//! - `config`: JSON configuration
//! - `constants`: Default names and labels

pub mod archive;
pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod dir;
pub mod error;
pub mod memory;
/// Namespace management and binding operations implementation.
pub mod namespace;
pub mod path;
pub mod sub;
