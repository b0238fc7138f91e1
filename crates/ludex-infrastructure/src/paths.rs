//! Unified path management for ludex client files.
//!
//! All persisted client state lives under the platform config directory,
//! resolved via the `dirs` crate so the layout is consistent across
//! Linux, macOS, and Windows.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Platform config directory could not be determined.
    #[error("Cannot find platform config directory")]
    ConfigDirNotFound,
}

/// Unified path management for ludex.
///
/// # Directory structure
///
/// ```text
/// ~/.config/ludex/          # Config directory
/// └── client.toml           # Persisted client state (credential, OAuth pair, language)
/// ```
pub struct LudexPaths;

impl LudexPaths {
    /// Returns the ludex configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/ludex/`)
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("ludex"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the persisted client state file.
    ///
    /// The file holds the long-lived OAuth credential; it should carry
    /// restrictive permissions (e.g., 600) on Unix systems.
    pub fn client_state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("client.toml"))
    }
}
