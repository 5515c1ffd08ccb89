//! Transaction context with explicit commit hooks.
//!
//! Hooks are registered on the context that owns the transaction, never on a
//! shared session:
//! * pre-commit hooks run in registration order before the store commit; the
//!   first failure rolls the transaction back and is returned to the caller;
//! * post-commit hooks run in registration order once the commit is durable.
//!
//! Dropping the context or calling [`TxContext::rollback`] discards every hook.

use std::future::Future;

use futures::future::BoxFuture;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::{debug, warn};

use crate::{DbError, Result};

pub type PreCommitHook = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;
pub type PostCommitHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

pub struct TxContext {
    txn: DatabaseTransaction,
    pre_commit: Vec<PreCommitHook>,
    post_commit: Vec<PostCommitHook>,
}

impl TxContext {
    /// Open a transaction on any SeaORM connection (or nest inside one).
    pub async fn begin<C>(conn: &C) -> Result<Self>
    where
        C: TransactionTrait,
    {
        let txn = conn.begin().await?;
        Ok(Self {
            txn,
            pre_commit: Vec::new(),
            post_commit: Vec::new(),
        })
    }

    /// Connection to run statements inside this transaction.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn on_pre_commit<F>(&mut self, hook: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.pre_commit.push(Box::new(hook));
    }

    pub fn on_post_commit<F, Fut>(&mut self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.post_commit
            .push(Box::new(move || -> BoxFuture<'static, ()> { Box::pin(hook()) }));
    }

    /// Run pre-commit hooks, commit, then run post-commit hooks.
    pub async fn commit(self) -> Result<()> {
        let TxContext {
            txn,
            pre_commit,
            post_commit,
        } = self;

        for hook in pre_commit {
            if let Err(e) = hook() {
                warn!(error = %e, "pre-commit hook failed; rolling back");
                txn.rollback().await?;
                return Err(DbError::PreCommit(e));
            }
        }

        txn.commit().await?;
        debug!(hooks = post_commit.len(), "transaction committed");

        for hook in post_commit {
            hook().await;
        }
        Ok(())
    }

    /// Roll back and discard every registered hook.
    pub async fn rollback(self) -> Result<()> {
        debug!(
            pre = self.pre_commit.len(),
            post = self.post_commit.len(),
            "transaction rolled back; hooks discarded"
        );
        self.txn.rollback().await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::{ConnectOpts, DbHandle};
    use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
    use std::sync::{Arc, Mutex};

    async fn setup() -> DatabaseConnection {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        let conn = db.sea();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            "CREATE TABLE t (v INTEGER NOT NULL)",
        ))
        .await
        .unwrap();
        conn
    }

    async fn insert(conn: &impl ConnectionTrait, v: i64) {
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            format!("INSERT INTO t (v) VALUES ({v})"),
        ))
        .await
        .unwrap();
    }

    async fn count(conn: &DatabaseConnection) -> i64 {
        let row = conn
            .query_one(Statement::from_string(
                conn.get_database_backend(),
                "SELECT COUNT(*) AS n FROM t",
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i64>("", "n").unwrap()
    }

    #[tokio::test]
    async fn commit_runs_hooks_in_order() {
        let conn = setup().await;
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));

        let mut tx = TxContext::begin(&conn).await.unwrap();
        insert(tx.conn(), 1).await;

        let l = log.clone();
        tx.on_post_commit(move || async move { l.lock().unwrap().push("post") });
        let l = log.clone();
        tx.on_pre_commit(move || {
            l.lock().unwrap().push("pre-1");
            Ok(())
        });
        let l = log.clone();
        tx.on_pre_commit(move || {
            l.lock().unwrap().push("pre-2");
            Ok(())
        });

        tx.commit().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["pre-1", "pre-2", "post"]);
        assert_eq!(count(&conn).await, 1);
    }

    #[tokio::test]
    async fn rollback_discards_hooks_and_writes() {
        let conn = setup().await;
        let fired = Arc::new(Mutex::new(false));

        let mut tx = TxContext::begin(&conn).await.unwrap();
        insert(tx.conn(), 1).await;
        let f = fired.clone();
        tx.on_post_commit(move || async move { *f.lock().unwrap() = true });
        tx.rollback().await.unwrap();

        assert!(!*fired.lock().unwrap());
        assert_eq!(count(&conn).await, 0);
    }

    #[tokio::test]
    async fn dropped_context_never_fires() {
        let conn = setup().await;
        let fired = Arc::new(Mutex::new(false));

        {
            let mut tx = TxContext::begin(&conn).await.unwrap();
            insert(tx.conn(), 1).await;
            let f = fired.clone();
            tx.on_post_commit(move || async move { *f.lock().unwrap() = true });
        }

        assert!(!*fired.lock().unwrap());
        assert_eq!(count(&conn).await, 0);
    }

    #[tokio::test]
    async fn failing_pre_commit_rolls_back() {
        let conn = setup().await;
        let fired = Arc::new(Mutex::new(false));

        let mut tx = TxContext::begin(&conn).await.unwrap();
        insert(tx.conn(), 7).await;
        tx.on_pre_commit(|| Err(anyhow::anyhow!("boom")));
        let f = fired.clone();
        tx.on_post_commit(move || async move { *f.lock().unwrap() = true });

        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, DbError::PreCommit(_)));
        assert!(!*fired.lock().unwrap());
        assert_eq!(count(&conn).await, 0);
    }
}
