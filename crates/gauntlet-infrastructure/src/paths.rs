//! Unified path management for gauntlet data files.
//!
//! All profiles and session records live under a single data root so
//! repositories agree on layout across platforms.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for gauntlet.
///
/// # Directory Structure
///
/// ```text
/// ~/.gauntlet/                 # Data root
/// ├── config.toml              # Platform configuration
/// ├── profiles/                # One TOML file per user profile
/// │   └── <user_id>.toml
/// └── records/                 # One TOML file per completed session
///     └── <session_id>.toml
/// ```
pub struct GauntletPaths;

impl GauntletPaths {
    /// Returns the gauntlet data root (`~/.gauntlet`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::home_dir()
            .map(|home| home.join(".gauntlet"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the profiles directory.
    pub fn profiles_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("profiles"))
    }

    /// Returns the session records directory.
    pub fn records_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("records"))
    }

    /// Returns the platform configuration file path.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("config.toml"))
    }
}
