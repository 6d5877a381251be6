//! TOML-based SessionRecordRepository implementation.
//!
//! Append-only: one file per completed session under `records/`.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use gauntlet_core::profile::{SessionRecordRepository, SessionSummary};
use gauntlet_core::{GauntletError, Result};

use crate::dto::RecordDocument;
use crate::paths::GauntletPaths;

/// A repository implementation storing session summaries as TOML files.
pub struct TomlRecordRepository {
    records_dir: PathBuf,
}

impl TomlRecordRepository {
    /// Creates a repository rooted at `base_dir`, creating the records
    /// directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let records_dir = base_dir.as_ref().join("records");
        fs::create_dir_all(&records_dir)?;
        Ok(Self { records_dir })
    }

    /// Creates a repository at the default location (`~/.gauntlet`).
    pub fn default_location() -> Result<Self> {
        let base_dir = GauntletPaths::data_dir()
            .map_err(|e| GauntletError::internal(format!("Failed to resolve data dir: {e}")))?;
        Self::new(base_dir)
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        self.records_dir.join(format!("{session_id}.toml"))
    }
}

#[async_trait]
impl SessionRecordRepository for TomlRecordRepository {
    async fn append(&self, summary: &SessionSummary) -> Result<()> {
        let document = RecordDocument::from(summary);
        let content = toml::to_string_pretty(&document)?;
        fs::write(self.record_path(&summary.session_id), content)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();

        for entry in fs::read_dir(&self.records_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match toml::from_str::<RecordDocument>(&content) {
                Ok(document) => {
                    let summary = document.into_domain();
                    if summary.user_id == user_id {
                        summaries.push(summary);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable record");
                }
            }
        }

        summaries.sort_by_key(|s| s.completed_at);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gauntlet_core::scoring::RiskLevel;
    use gauntlet_core::taxonomy::{DifficultyLevel, ThreatType};
    use tempfile::TempDir;

    fn summary(session_id: &str, user_id: &str, age_minutes: i64) -> SessionSummary {
        SessionSummary {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            threat_type: ThreatType::Vishing,
            difficulty: DifficultyLevel::Novice,
            pattern_id: None,
            overall_score: Some(85.0),
            risk_level: RiskLevel::Low,
            failed_categories: vec![],
            decisions_analyzed: 1,
            hints_used: 0,
            duration_secs: 90,
            completed_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn append_and_list_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlRecordRepository::new(temp_dir.path()).unwrap();

        let first = summary("s1", "user-1", 10);
        let second = summary("s2", "user-1", 5);
        let other_user = summary("s3", "user-2", 1);
        repository.append(&second).await.unwrap();
        repository.append(&first).await.unwrap();
        repository.append(&other_user).await.unwrap();

        let records = repository.list_for_user("user-1").await.unwrap();
        assert_eq!(records.len(), 2);
        // Oldest first.
        assert_eq!(records[0].session_id, "s1");
        assert_eq!(records[1].session_id, "s2");
        assert_eq!(records[0], first);
    }

    #[tokio::test]
    async fn unknown_user_gets_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlRecordRepository::new(temp_dir.path()).unwrap();
        assert!(repository.list_for_user("nobody").await.unwrap().is_empty());
    }
}
