use std::sync::Arc;

use crate::repository::CourseStore;
use crate::services::statistics::{NoopTracker, UsageTracker};

#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<CourseStore>,
    pub stats: Arc<dyn UsageTracker>,
}

impl AppState {
    pub fn new(courses: Arc<CourseStore>, stats: Arc<dyn UsageTracker>) -> Self {
        Self { courses, stats }
    }

    /// Empty store, statistics off.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(CourseStore::new()), Arc::new(NoopTracker))
    }
}
