//! TOML-based ProfileRepository implementation.
//!
//! One file per user under `profiles/`. The atomic `update` takes an
//! exclusive advisory lock on a per-user lock file around the
//! read-modify-write, which gives the per-user isolation the contract
//! requires without any global lock.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs;
use std::path::{Path, PathBuf};

use gauntlet_core::profile::{ProfileRepository, UserProfile};
use gauntlet_core::{GauntletError, Result};

use crate::dto::ProfileDocument;
use crate::paths::GauntletPaths;

/// A repository implementation storing user profiles as TOML files.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── profiles/
///     ├── <user_id>.toml
///     └── <user_id>.lock
/// ```
pub struct TomlProfileRepository {
    profiles_dir: PathBuf,
}

impl TomlProfileRepository {
    /// Creates a repository rooted at `base_dir`, creating the profiles
    /// directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let profiles_dir = base_dir.as_ref().join("profiles");
        fs::create_dir_all(&profiles_dir)?;
        Ok(Self { profiles_dir })
    }

    /// Creates a repository at the default location (`~/.gauntlet`).
    pub fn default_location() -> Result<Self> {
        let base_dir = GauntletPaths::data_dir()
            .map_err(|e| GauntletError::internal(format!("Failed to resolve data dir: {e}")))?;
        Self::new(base_dir)
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.profiles_dir.join(format!("{user_id}.toml"))
    }

    fn lock_path(&self, user_id: &str) -> PathBuf {
        self.profiles_dir.join(format!("{user_id}.lock"))
    }

    fn read_profile(&self, user_id: &str) -> Result<UserProfile> {
        let path = self.profile_path(user_id);
        if !path.exists() {
            return Ok(UserProfile::new(user_id));
        }
        let content = fs::read_to_string(&path)?;
        let document: ProfileDocument = toml::from_str(&content)?;
        Ok(document.into_domain())
    }

    fn write_profile(&self, profile: &UserProfile) -> Result<()> {
        let document = ProfileDocument::from(profile);
        let content = toml::to_string_pretty(&document)?;
        fs::write(self.profile_path(&profile.user_id), content)?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for TomlProfileRepository {
    async fn load(&self, user_id: &str) -> Result<UserProfile> {
        self.read_profile(user_id)
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        self.write_profile(profile)
    }

    async fn update(
        &self,
        user_id: &str,
        mutate: Box<dyn for<'a> FnOnce(&'a mut UserProfile) + Send>,
    ) -> Result<UserProfile> {
        let lock_file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(user_id))?;
        lock_file.lock_exclusive()?;

        let result: Result<UserProfile> = (|| {
            let mut profile = self.read_profile(user_id)?;
            mutate(&mut profile);
            self.write_profile(&profile)?;
            Ok(profile)
        })();

        if let Err(err) = fs2::FileExt::unlock(&lock_file) {
            tracing::warn!(user = %user_id, error = %err, "failed to release profile lock");
        }
        result
    }
}
