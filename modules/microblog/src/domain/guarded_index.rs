use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ports::{Document, IndexError, IndexHits, SearchIndex};

/// The search index as the rest of the domain sees it: optional, bounded by a
/// timeout, and never failing its caller.
#[derive(Clone)]
pub struct GuardedIndex {
    inner: Option<Arc<dyn SearchIndex>>,
    timeout: Duration,
}

impl GuardedIndex {
    pub fn new(inner: Option<Arc<dyn SearchIndex>>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T, IndexError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Some(v),
            Ok(Err(e)) => {
                warn!(op, error = %e, "search index unavailable");
                None
            }
            Err(_) => {
                warn!(op, error = %IndexError::Timeout(self.timeout), "search index unavailable");
                None
            }
        }
    }

    /// Returns true if the index acknowledged the write.
    pub async fn upsert(&self, index: &str, id: i64, doc: &Document) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        debug!(index, id, "index upsert");
        self.bounded("upsert", inner.upsert(index, id, doc))
            .await
            .is_some()
    }

    /// Returns true if the index acknowledged the removal.
    pub async fn remove(&self, index: &str, id: i64) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        debug!(index, id, "index remove");
        self.bounded("remove", inner.remove(index, id)).await.is_some()
    }

    /// `None` when the index is disabled or unavailable.
    pub async fn query(&self, index: &str, text: &str, from: u64, size: u64) -> Option<IndexHits> {
        let inner = self.inner.as_ref()?;
        self.bounded("query", inner.query(index, text, from, size))
            .await
    }
}
