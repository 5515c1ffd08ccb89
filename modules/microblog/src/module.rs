use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::{MicroblogConfig, SearchBackend, SearchConfig};
use crate::contract::client::MicroblogApi;
use crate::domain::accounts::{AccountConfig, AccountService};
use crate::domain::credentials::CredentialService;
use crate::domain::feed::{FeedConfig, FeedService};
use crate::domain::guarded_index::GuardedIndex;
use crate::domain::index_sync::IndexSynchronizer;
use crate::domain::ports::{Clock, LanguageDetector, Mailer, SearchIndex, SystemClock, UndetectedLanguage};
use crate::domain::posts::PostService;
use crate::domain::search::SearchService;
use crate::domain::social_graph::SocialGraph;
use crate::gateways::local::MicroblogLocalClient;
use crate::infra::notify::LogMailer;
use crate::infra::search::{ElasticsearchIndex, InMemoryIndex};

/// External collaborators the core calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub index: Option<Arc<dyn SearchIndex>>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,
    pub language: Arc<dyn LanguageDetector>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            index: None,
            clock: Arc::new(SystemClock),
            mailer: Arc::new(LogMailer),
            language: Arc::new(UndetectedLanguage),
        }
    }
}

impl Collaborators {
    /// Default collaborators with the index selected by `search`.
    pub fn from_config(search: &SearchConfig) -> anyhow::Result<Self> {
        Ok(Self {
            index: build_index(search)?,
            ..Self::default()
        })
    }
}

fn build_index(cfg: &SearchConfig) -> anyhow::Result<Option<Arc<dyn SearchIndex>>> {
    let index: Option<Arc<dyn SearchIndex>> = match cfg.backend {
        SearchBackend::Disabled => None,
        SearchBackend::Memory => Some(Arc::new(InMemoryIndex::new())),
        SearchBackend::Elasticsearch => {
            let url = cfg
                .url
                .as_deref()
                .context("search.url is required for the elasticsearch backend")?;
            let es = ElasticsearchIndex::new(url, Duration::from_millis(cfg.timeout_ms))
                .context("failed to build Elasticsearch client")?;
            Some(Arc::new(es))
        }
    };
    Ok(index)
}

/// The wired microblog core: every domain service over one store connection.
#[derive(Clone)]
pub struct Microblog {
    accounts: AccountService,
    posts: PostService,
    graph: SocialGraph,
    feed: FeedService,
    search: SearchService,
    credentials: CredentialService,
    sync: IndexSynchronizer,
}

impl Microblog {
    pub fn new(cfg: &MicroblogConfig, db: DatabaseConnection, collab: Collaborators) -> Self {
        info!("Initializing microblog module");
        debug!(
            posts_per_page = cfg.posts_per_page,
            search_backend = ?cfg.search.backend,
            index_attached = collab.index.is_some(),
            "Loaded microblog config"
        );

        let index = GuardedIndex::new(collab.index, Duration::from_millis(cfg.search.timeout_ms));
        let sync = IndexSynchronizer::new(db.clone(), index.clone());
        let graph = SocialGraph::new(db.clone());
        let credentials = CredentialService::new(
            db.clone(),
            &cfg.secret_key,
            cfg.reset_token_ttl_secs,
            collab.clock.clone(),
        );
        let feed = FeedService::new(
            db.clone(),
            FeedConfig {
                posts_per_page: cfg.posts_per_page,
                max_page_size: cfg.max_page_size,
            },
        );
        let search = SearchService::new(db.clone(), index, cfg.posts_per_page, cfg.max_page_size);
        let posts = PostService::new(
            sync.clone(),
            collab.language,
            collab.clock.clone(),
            cfg.max_post_length,
        );
        let accounts = AccountService::new(
            db,
            sync.clone(),
            graph.clone(),
            credentials.clone(),
            collab.mailer,
            collab.clock,
            AccountConfig {
                max_about_me_length: cfg.max_about_me_length,
            },
        );

        Self {
            accounts,
            posts,
            graph,
            feed,
            search,
            credentials,
            sync,
        }
    }

    /// Wire the module with the collaborators its configuration names.
    pub fn from_config(cfg: &MicroblogConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let collab = Collaborators::from_config(&cfg.search)?;
        Ok(Self::new(cfg, db, collab))
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running microblog database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Microblog database migrations completed successfully");
        Ok(())
    }

    /// The public API backed by this instance.
    pub fn client(&self) -> Arc<dyn MicroblogApi> {
        Arc::new(MicroblogLocalClient::new(self.clone()))
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }

    pub fn synchronizer(&self) -> &IndexSynchronizer {
        &self.sync
    }
}
