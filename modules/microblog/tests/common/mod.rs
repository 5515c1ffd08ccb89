#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::{ConnectOpts, DbHandle};
use parking_lot::Mutex;

use microblog::contract::{client::MicroblogApi, model::NewUser, model::User};
use microblog::domain::ports::{
    Document, IndexError, IndexHits, LanguageDetector, Mailer, ManualClock, SearchIndex,
};
use microblog::infra::search::InMemoryIndex;
use microblog::{Collaborators, Microblog, MicroblogConfig};

pub const START: i64 = 1_700_000_000;

/// A migrated in-memory store with the module wired over it.
pub struct TestEnv {
    pub db: DbHandle,
    pub module: Microblog,
    pub api: Arc<dyn MicroblogApi>,
    pub clock: Arc<ManualClock>,
    pub mailer: Arc<RecordingMailer>,
}

pub async fn memory_db() -> DbHandle {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    Microblog::migrate(db.sea_ref())
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn env_with_index(index: Option<Arc<dyn SearchIndex>>) -> TestEnv {
    env_with(MicroblogConfig::default(), index).await
}

pub async fn env_with(cfg: MicroblogConfig, index: Option<Arc<dyn SearchIndex>>) -> TestEnv {
    let db = memory_db().await;
    let clock = Arc::new(ManualClock::at_unix(START));
    let mailer = Arc::new(RecordingMailer::default());
    let collab = Collaborators {
        index,
        clock: clock.clone(),
        mailer: mailer.clone(),
        language: Arc::new(FixedLanguage("en")),
    };
    let module = Microblog::new(&cfg, db.sea(), collab);
    let api = module.client();
    TestEnv {
        db,
        module,
        api,
        clock,
        mailer,
    }
}

/// Environment backed by a fresh in-memory index, returned alongside it.
pub async fn env_with_memory_index() -> (TestEnv, Arc<InMemoryIndex>) {
    let index = Arc::new(InMemoryIndex::new());
    let env = env_with_index(Some(index.clone())).await;
    (env, index)
}

impl TestEnv {
    pub async fn register(&self, username: &str) -> User {
        self.api
            .register(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: format!("{username}-password"),
            })
            .await
            .expect("register")
    }

    /// Post as `author`, one second after the previous clock reading.
    pub async fn post(&self, author: &User, body: &str) -> i64 {
        self.clock.advance(chrono::Duration::seconds(1));
        self.api
            .create_post(author.id, body)
            .await
            .expect("create_post")
            .id
    }
}

pub struct FixedLanguage(pub &'static str);

impl LanguageDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> String {
        self.0.to_string()
    }
}

/// Captures every reset mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: Mutex<bool>,
}

impl RecordingMailer {
    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, user: &User, token: &str) -> anyhow::Result<()> {
        if *self.fail.lock() {
            anyhow::bail!("smtp relay refused connection");
        }
        self.sent.lock().push((user.email.clone(), token.to_string()));
        Ok(())
    }
}

/// Index that answers every query with a fixed hit list and records writes.
#[derive(Default)]
pub struct ScriptedIndex {
    pub hits: Mutex<IndexHits>,
    pub removed: Mutex<Vec<(String, i64)>>,
    pub upserts: Mutex<Vec<(String, i64)>>,
}

impl ScriptedIndex {
    pub fn answering(ids: Vec<i64>, total: u64) -> Self {
        Self {
            hits: Mutex::new(IndexHits { ids, total }),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SearchIndex for ScriptedIndex {
    async fn upsert(&self, index: &str, id: i64, _doc: &Document) -> Result<(), IndexError> {
        self.upserts.lock().push((index.to_string(), id));
        Ok(())
    }

    async fn remove(&self, index: &str, id: i64) -> Result<(), IndexError> {
        self.removed.lock().push((index.to_string(), id));
        Ok(())
    }

    async fn query(
        &self,
        _index: &str,
        _text: &str,
        _from: u64,
        _size: u64,
    ) -> Result<IndexHits, IndexError> {
        Ok(self.hits.lock().clone())
    }
}

/// Index whose every call fails.
pub struct BrokenIndex;

#[async_trait]
impl SearchIndex for BrokenIndex {
    async fn upsert(&self, _: &str, _: i64, _: &Document) -> Result<(), IndexError> {
        Err(IndexError::Transport("connection refused".into()))
    }

    async fn remove(&self, _: &str, _: i64) -> Result<(), IndexError> {
        Err(IndexError::Transport("connection refused".into()))
    }

    async fn query(&self, _: &str, _: &str, _: u64, _: u64) -> Result<IndexHits, IndexError> {
        Err(IndexError::Status { status: 503 })
    }
}

/// Index that never answers within any reasonable timeout.
pub struct StalledIndex;

#[async_trait]
impl SearchIndex for StalledIndex {
    async fn upsert(&self, _: &str, _: i64, _: &Document) -> Result<(), IndexError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    async fn remove(&self, _: &str, _: i64) -> Result<(), IndexError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    async fn query(&self, _: &str, _: &str, _: u64, _: u64) -> Result<IndexHits, IndexError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(IndexHits::default())
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("valid timestamp")
}
