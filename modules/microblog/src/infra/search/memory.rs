//! Process-local search index.
//!
//! Relevance is the number of query-token occurrences in a document; ties go
//! to the lower id. Good enough for development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::ports::{Document, IndexError, IndexHits, SearchIndex};

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    indexes: RwLock<HashMap<String, BTreeMap<i64, Document>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored document, if any.
    pub fn get(&self, index: &str, id: i64) -> Option<Document> {
        self.indexes.read().get(index)?.get(&id).cloned()
    }

    /// Ids stored in `index`, ascending.
    pub fn ids(&self, index: &str) -> Vec<i64> {
        self.indexes
            .read()
            .get(index)
            .map(|docs| docs.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.indexes.write().clear();
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn score(doc: &Document, terms: &[String]) -> usize {
    doc.values()
        .filter_map(Value::as_str)
        .flat_map(tokenize)
        .filter(|tok| terms.contains(tok))
        .count()
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn upsert(&self, index: &str, id: i64, doc: &Document) -> Result<(), IndexError> {
        self.indexes
            .write()
            .entry(index.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(())
    }

    async fn remove(&self, index: &str, id: i64) -> Result<(), IndexError> {
        if let Some(docs) = self.indexes.write().get_mut(index) {
            docs.remove(&id);
        }
        Ok(())
    }

    async fn query(
        &self,
        index: &str,
        text: &str,
        from: u64,
        size: u64,
    ) -> Result<IndexHits, IndexError> {
        let terms: Vec<String> = tokenize(text).collect();
        let guard = self.indexes.read();
        let Some(docs) = guard.get(index) else {
            return Ok(IndexHits::default());
        };

        let mut scored: Vec<(usize, i64)> = docs
            .iter()
            .map(|(id, doc)| (score(doc, &terms), *id))
            .filter(|(s, _)| *s > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let total = scored.len() as u64;
        let ids = scored
            .into_iter()
            .skip(usize::try_from(from).unwrap_or(usize::MAX))
            .take(usize::try_from(size).unwrap_or(usize::MAX))
            .map(|(_, id)| id)
            .collect();
        Ok(IndexHits { ids, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(body: &str) -> Document {
        json!({ "body": body }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn relevance_then_id_ordering() {
        let idx = InMemoryIndex::new();
        idx.upsert("post", 1, &doc("rust")).await.unwrap();
        idx.upsert("post", 2, &doc("rust rust rust")).await.unwrap();
        idx.upsert("post", 3, &doc("go")).await.unwrap();
        idx.upsert("post", 4, &doc("Rust!")).await.unwrap();

        let hits = idx.query("post", "rust", 0, 10).await.unwrap();
        assert_eq!(hits.ids, vec![2, 1, 4]);
        assert_eq!(hits.total, 3);

        let page = idx.query("post", "rust", 1, 1).await.unwrap();
        assert_eq!(page.ids, vec![1]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn upsert_replaces_and_remove_is_idempotent() {
        let idx = InMemoryIndex::new();
        idx.upsert("post", 1, &doc("old")).await.unwrap();
        idx.upsert("post", 1, &doc("new")).await.unwrap();
        assert_eq!(idx.get("post", 1), Some(doc("new")));

        idx.remove("post", 1).await.unwrap();
        idx.remove("post", 1).await.unwrap();
        idx.remove("missing", 9).await.unwrap();
        assert!(idx.ids("post").is_empty());
    }
}
