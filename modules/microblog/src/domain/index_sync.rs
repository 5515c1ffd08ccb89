//! Keeps the search index in step with committed store writes.
//!
//! Writers open an [`IndexedTx`], perform store writes through its connection
//! and report every touched searchable record. The transaction seals the net
//! change set in a pre-commit hook and hands it to a post-commit hook, which
//! applies it to the index only once the store commit is durable. A rollback
//! (explicit or by drop) discards both hooks, so nothing reaches the index.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use db::TxContext;
use futures::future::join_all;
use parking_lot::Mutex;
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{Post, ReindexReport, User};
use crate::domain::error::DomainError;
use crate::domain::guarded_index::GuardedIndex;
use crate::domain::ports::Document;
use crate::domain::searchable::Searchable;
use crate::infra::storage::{PostsDao, UsersDao};

const REINDEX_BATCH: u64 = 200;

/// Net changes for one record type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeChanges {
    pub added: BTreeMap<i64, Document>,
    pub updated: BTreeMap<i64, Document>,
    pub removed: BTreeSet<i64>,
}

impl TypeChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Net changes of one transaction, partitioned by index name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    by_type: BTreeMap<&'static str, TypeChanges>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(TypeChanges::is_empty)
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeChanges> {
        self.by_type.get(type_name)
    }

    pub fn types(&self) -> impl Iterator<Item = (&'static str, &TypeChanges)> {
        self.by_type.iter().map(|(k, v)| (*k, v))
    }

    fn entry(&mut self, type_name: &'static str) -> &mut TypeChanges {
        self.by_type.entry(type_name).or_default()
    }

    fn add(&mut self, type_name: &'static str, id: i64, doc: Document) {
        let t = self.entry(type_name);
        // Removed then re-added under the same id: the new document replaces the old one.
        t.removed.remove(&id);
        t.updated.remove(&id);
        t.added.insert(id, doc);
    }

    fn update(&mut self, type_name: &'static str, id: i64, doc: Document) {
        let t = self.entry(type_name);
        if t.removed.contains(&id) {
            return;
        }
        if let Some(pending) = t.added.get_mut(&id) {
            *pending = doc;
        } else {
            t.updated.insert(id, doc);
        }
    }

    fn remove(&mut self, type_name: &'static str, id: i64) {
        let t = self.entry(type_name);
        if t.added.remove(&id).is_some() {
            return;
        }
        t.updated.remove(&id);
        t.removed.insert(id);
    }

    /// Push every change to the index. Returns the number of acknowledged calls.
    async fn apply(self, index: &GuardedIndex) -> usize {
        let mut calls = Vec::new();
        for (type_name, changes) in self.by_type {
            for id in changes.removed {
                calls.push(futures::future::Either::Left(async move {
                    index.remove(type_name, id).await
                }));
            }
            for (id, doc) in changes.added.into_iter().chain(changes.updated) {
                calls.push(futures::future::Either::Right(async move {
                    index.upsert(type_name, id, &doc).await
                }));
            }
        }
        join_all(calls).await.into_iter().filter(|ok| *ok).count()
    }
}

/// Collects changes while a transaction is open; sealed exactly once.
#[derive(Debug)]
pub struct ChangeTracker {
    pending: Mutex<Option<ChangeSet>>,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Some(ChangeSet::default())),
        }
    }

    fn with_pending(&self, f: impl FnOnce(&mut ChangeSet)) {
        match self.pending.lock().as_mut() {
            Some(set) => f(set),
            None => warn!("change recorded after the change set was sealed; ignored"),
        }
    }

    pub fn added(&self, record: &dyn Searchable) {
        self.with_pending(|s| s.add(record.type_name(), record.id(), record.indexed_fields()));
    }

    pub fn updated(&self, record: &dyn Searchable) {
        self.with_pending(|s| s.update(record.type_name(), record.id(), record.indexed_fields()));
    }

    pub fn removed(&self, record: &dyn Searchable) {
        self.with_pending(|s| s.remove(record.type_name(), record.id()));
    }

    /// Take the accumulated change set. Later calls return `None`.
    pub fn seal(&self) -> Option<ChangeSet> {
        self.pending.lock().take()
    }
}

/// A store transaction whose searchable writes reach the index on commit.
pub struct IndexedTx {
    tx: TxContext,
    tracker: Arc<ChangeTracker>,
}

impl IndexedTx {
    /// Connection for store writes inside this transaction.
    pub fn conn(&self) -> &DatabaseTransaction {
        self.tx.conn()
    }

    pub fn track_added(&self, record: &dyn Searchable) {
        self.tracker.added(record);
    }

    pub fn track_updated(&self, record: &dyn Searchable) {
        self.tracker.updated(record);
    }

    pub fn track_removed(&self, record: &dyn Searchable) {
        self.tracker.removed(record);
    }

    pub async fn commit(self) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(Into::into)
    }

    pub async fn rollback(self) -> Result<(), DomainError> {
        self.tx.rollback().await.map_err(Into::into)
    }
}

#[derive(Clone)]
pub struct IndexSynchronizer {
    db: DatabaseConnection,
    index: GuardedIndex,
}

impl IndexSynchronizer {
    pub fn new(db: DatabaseConnection, index: GuardedIndex) -> Self {
        Self { db, index }
    }

    pub fn index(&self) -> &GuardedIndex {
        &self.index
    }

    /// Open a transaction wired to the index.
    pub async fn begin(&self) -> Result<IndexedTx, DomainError> {
        let mut tx = TxContext::begin(&self.db).await?;
        let tracker = Arc::new(ChangeTracker::new());
        let (sealed_tx, sealed_rx) = oneshot::channel::<ChangeSet>();

        let t = tracker.clone();
        tx.on_pre_commit(move || {
            let set = t.seal().unwrap_or_default();
            sealed_tx
                .send(set)
                .map_err(|_| anyhow::anyhow!("change set receiver dropped"))
        });

        let index = self.index.clone();
        tx.on_post_commit(move || async move {
            let Ok(set) = sealed_rx.await else {
                return;
            };
            if set.is_empty() {
                return;
            }
            if !index.is_enabled() {
                debug!("search index disabled; change set dropped");
                return;
            }
            let applied = set.apply(&index).await;
            debug!(applied, "change set applied to search index");
        });

        Ok(IndexedTx { tx, tracker })
    }

    /// Upsert every live searchable record. Used after index loss or a
    /// mapping change.
    #[instrument(name = "microblog.index_sync.reindex_all", skip(self))]
    pub async fn reindex_all(&self) -> Result<ReindexReport, DomainError> {
        let mut report = ReindexReport::default();
        if !self.index.is_enabled() {
            info!("search index disabled; nothing to rebuild");
            return Ok(report);
        }

        let users = UsersDao::new(&self.db);
        let mut after = 0;
        loop {
            let batch: Vec<User> = users
                .batch_after(after, REINDEX_BATCH)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let Some(last) = batch.last() else { break };
            after = last.id;
            report.users += self.upsert_all(&batch).await;
        }

        let posts = PostsDao::new(&self.db);
        let mut after = 0;
        loop {
            let batch: Vec<Post> = posts
                .batch_after(after, REINDEX_BATCH)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let Some(last) = batch.last() else { break };
            after = last.id;
            report.posts += self.upsert_all(&batch).await;
        }

        info!(users = report.users, posts = report.posts, "search index rebuilt");
        Ok(report)
    }

    async fn upsert_all<T: Searchable>(&self, records: &[T]) -> u64 {
        let calls = records.iter().map(|r| {
            let doc = r.indexed_fields();
            async move { self.index.upsert(r.type_name(), r.id(), &doc).await }
        });
        join_all(calls).await.into_iter().filter(|ok| *ok).count() as u64
    }
}
