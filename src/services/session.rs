use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use polars::prelude::DataFrame;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::analysis::ColumnClassification;

/// One uploaded dataset and its classification, immutable once created.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub file_name: String,
    pub dataset: DataFrame,
    pub classification: ColumnClassification,
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, Arc<Session>>,
}

impl SessionStore {
    pub fn new(capacity: u64, idle: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle)
                .build(),
        }
    }

    pub fn create(&self, file_name: String, dataset: DataFrame, classification: ColumnClassification) -> Arc<Session> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session {
            id: id.clone(),
            file_name,
            dataset,
            classification,
        });
        self.cache.insert(id.clone(), session.clone());
        tracing::info!("Opened session {} for {}", id, session.file_name);
        session
    }

    pub fn get(&self, id: &str) -> Result<Arc<Session>, AppError> {
        self.cache
            .get(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn sessions_are_found_by_id() {
        let store = SessionStore::new(8, Duration::from_secs(60));
        let df = df!("x" => &[1.0, 2.0]).unwrap();
        let session = store.create("data.csv".into(), df, ColumnClassification::default());

        let found = store.get(&session.id).unwrap();
        assert_eq!(found.file_name, "data.csv");
        assert_eq!(found.dataset.height(), 2);
    }

    #[test]
    fn each_upload_gets_a_fresh_id() {
        let store = SessionStore::new(8, Duration::from_secs(60));
        let a = store.create("a.csv".into(), DataFrame::empty(), ColumnClassification::default());
        let b = store.create("a.csv".into(), DataFrame::empty(), ColumnClassification::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unknown_id_is_session_not_found() {
        let store = SessionStore::new(8, Duration::from_secs(60));
        assert!(matches!(store.get("nope"), Err(AppError::SessionNotFound(_))));
    }
}
