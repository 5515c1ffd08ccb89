use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

use crate::contract::model::{FeedPage, Post};
use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::infra::storage::{FeedScope, PostsDao};

#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    pub posts_per_page: u64,
    pub max_page_size: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 25,
            max_page_size: 100,
        }
    }
}

/// Time-ordered post feeds read straight from the record store.
#[derive(Clone)]
pub struct FeedService {
    db: DatabaseConnection,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(db: DatabaseConnection, config: FeedConfig) -> Self {
        Self { db, config }
    }

    /// Own posts plus posts of followed users, newest first.
    #[instrument(name = "microblog.feed.personal", skip(self))]
    pub async fn personal_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, DomainError> {
        self.page_of(FeedScope::Personal(user_id), page, per_page)
            .await
    }

    /// Every post, newest first.
    #[instrument(name = "microblog.feed.global", skip(self))]
    pub async fn global_feed(
        &self,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, DomainError> {
        self.page_of(FeedScope::Global, page, per_page).await
    }

    #[instrument(name = "microblog.feed.user", skip(self))]
    pub async fn user_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, DomainError> {
        self.page_of(FeedScope::Author(user_id), page, per_page)
            .await
    }

    async fn page_of(
        &self,
        scope: FeedScope,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, DomainError> {
        let req = PageRequest::new(
            page,
            per_page,
            self.config.posts_per_page,
            self.config.max_page_size,
        )?;
        let posts = PostsDao::new(&self.db);

        let total = posts.count(scope).await?;
        let items = if req.offset() < total {
            posts
                .window(scope, req.offset(), req.per_page)
                .await?
                .into_iter()
                .map(Post::from)
                .collect()
        } else {
            Vec::new()
        };

        debug!(total, returned = items.len(), "feed page loaded");
        Ok(FeedPage::new(items, req.page, req.per_page, total))
    }
}
