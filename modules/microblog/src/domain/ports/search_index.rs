use async_trait::async_trait;
use thiserror::Error;

/// Indexed fields of one record, keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Ordered ids for one result window plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexHits {
    pub ids: Vec<i64>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("search index request failed: {0}")]
    Transport(String),

    #[error("search index answered HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected search index response: {0}")]
    Decode(String),

    #[error("search index call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid search index configuration: {0}")]
    Config(String),
}

/// Output port: an external full-text index addressed by (index name, document id).
///
/// Implementations may fail freely; callers go through the guarded wrapper
/// which bounds every call and absorbs failures.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or fully replace a document.
    async fn upsert(&self, index: &str, id: i64, doc: &Document) -> Result<(), IndexError>;

    /// Remove a document. Removing a missing document is not an error.
    async fn remove(&self, index: &str, id: i64) -> Result<(), IndexError>;

    /// Multi-field free-text query over the window `[from, from + size)`.
    async fn query(
        &self,
        index: &str,
        text: &str,
        from: u64,
        size: u64,
    ) -> Result<IndexHits, IndexError>;
}
