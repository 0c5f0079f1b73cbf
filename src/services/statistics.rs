use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const EXPORT_KINDS: [&str; 4] = ["excel", "word", "image", "print"];

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub export_stats: BTreeMap<String, u64>,
    pub import_stats: ImportStats,
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_usage: u64,
}

impl Default for UsageStatistics {
    fn default() -> Self {
        Self {
            export_stats: EXPORT_KINDS.iter().map(|k| (k.to_string(), 0)).collect(),
            import_stats: ImportStats::default(),
            last_updated: None,
            total_usage: 0,
        }
    }
}

impl UsageStatistics {
    fn with_total(mut self) -> Self {
        self.total_usage = self.export_stats.values().sum::<u64>() + self.import_stats.total;
        self
    }
}

/// Hook the export handlers call after a successful export.
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn track_export(&self, kind: &str) -> Result<UsageStatistics, StatsError>;
    async fn track_import(&self) -> Result<UsageStatistics, StatsError>;
    async fn snapshot(&self) -> UsageStatistics;
}

/// Counters persisted as pretty JSON; every update rewrites the file.
pub struct StatisticsService {
    path: PathBuf,
    stats: Mutex<UsageStatistics>,
}

impl StatisticsService {
    /// Starts from zeroed counters when the file is missing or unreadable.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = match read_stats(&path).await {
            Ok(Some(stats)) => stats,
            Ok(None) => UsageStatistics::default(),
            Err(e) => {
                warn!("ignoring unreadable statistics file {}: {}", path.display(), e);
                UsageStatistics::default()
            }
        };
        info!("usage statistics at {}", path.display());
        Self {
            path,
            stats: Mutex::new(stats),
        }
    }

    async fn update<F>(&self, apply: F) -> Result<UsageStatistics, StatsError>
    where
        F: FnOnce(&mut UsageStatistics) -> bool,
    {
        let mut stats = self.stats.lock().await;
        let mut next = stats.clone();
        if apply(&mut next) {
            next.last_updated = Some(Utc::now().to_rfc3339());
            let next = next.with_total();
            // memory only moves once the file holds the same counts
            tokio::fs::write(&self.path, serde_json::to_vec_pretty(&next)?).await?;
            *stats = next;
        }
        Ok(stats.clone().with_total())
    }
}

#[async_trait]
impl UsageTracker for StatisticsService {
    async fn track_export(&self, kind: &str) -> Result<UsageStatistics, StatsError> {
        self.update(|stats| match stats.export_stats.get_mut(kind) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        })
        .await
    }

    async fn track_import(&self) -> Result<UsageStatistics, StatsError> {
        self.update(|stats| {
            stats.import_stats.total += 1;
            true
        })
        .await
    }

    async fn snapshot(&self) -> UsageStatistics {
        self.stats.lock().await.clone().with_total()
    }
}

async fn read_stats(path: &Path) -> Result<Option<UsageStatistics>, StatsError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Tracker used when statistics are switched off.
pub struct NoopTracker;

#[async_trait]
impl UsageTracker for NoopTracker {
    async fn track_export(&self, _kind: &str) -> Result<UsageStatistics, StatsError> {
        Ok(UsageStatistics::default())
    }

    async fn track_import(&self) -> Result<UsageStatistics, StatsError> {
        Ok(UsageStatistics::default())
    }

    async fn snapshot(&self) -> UsageStatistics {
        UsageStatistics::default()
    }
}
