use tokio::sync::RwLock;

use crate::models::CourseEntry;

/// Ordered, append-only course list living as long as the process.
#[derive(Debug, Default)]
pub struct CourseStore {
    entries: RwLock<Vec<CourseEntry>>,
}

impl CourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch_courses(&self) -> Vec<CourseEntry> {
        self.entries.read().await.clone()
    }

    /// Returns the number of stored entries after the append.
    pub async fn insert_course(&self, entry: CourseEntry) -> usize {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        entries.len()
    }

    /// Returns how many entries were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
