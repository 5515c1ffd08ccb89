use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::contract::model::Post;
use crate::domain::error::DomainError;
use crate::domain::index_sync::IndexSynchronizer;
use crate::domain::ports::language::normalize_language;
use crate::domain::ports::{Clock, LanguageDetector};
use crate::infra::storage::{NewPostRow, PostsDao, UsersDao};

/// Publishing and removing posts. Every write goes through the index
/// synchronizer.
#[derive(Clone)]
pub struct PostService {
    sync: IndexSynchronizer,
    language: Arc<dyn LanguageDetector>,
    clock: Arc<dyn Clock>,
    last_timestamp: Arc<Mutex<Option<DateTime<Utc>>>>,
    max_post_length: usize,
}

impl PostService {
    pub fn new(
        sync: IndexSynchronizer,
        language: Arc<dyn LanguageDetector>,
        clock: Arc<dyn Clock>,
        max_post_length: usize,
    ) -> Self {
        Self {
            sync,
            language,
            clock,
            last_timestamp: Arc::new(Mutex::new(None)),
            max_post_length,
        }
    }

    /// Clock time, held back from ever going below the previous post's.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        let mut last = self.last_timestamp.lock();
        let ts = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(ts);
        ts
    }

    #[instrument(name = "microblog.posts.create", skip(self, body))]
    pub async fn create_post(&self, author_id: i64, body: &str) -> Result<Post, DomainError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::validation("body", "must not be empty"));
        }
        let len = body.chars().count();
        if len > self.max_post_length {
            return Err(DomainError::validation(
                "body",
                format!("{len} characters (max: {})", self.max_post_length),
            ));
        }
        let language = normalize_language(&self.language.detect(body));

        let tx = self.sync.begin().await?;
        if UsersDao::new(tx.conn()).find_by_id(author_id).await?.is_none() {
            return Err(DomainError::user_not_found(author_id));
        }
        let row = PostsDao::new(tx.conn())
            .insert(NewPostRow {
                body: body.to_string(),
                timestamp: self.next_timestamp(),
                user_id: author_id,
                language,
            })
            .await?;

        let post = Post::from(row);
        tx.track_added(&post);
        tx.commit().await?;

        info!(post_id = post.id, "Post published");
        Ok(post)
    }

    /// Only the author may delete a post.
    #[instrument(name = "microblog.posts.delete", skip(self))]
    pub async fn delete_post(&self, author_id: i64, post_id: i64) -> Result<(), DomainError> {
        let tx = self.sync.begin().await?;
        let posts = PostsDao::new(tx.conn());
        let post = Post::from(
            posts
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| DomainError::post_not_found(post_id))?,
        );
        if post.user_id != author_id {
            return Err(DomainError::not_post_author(post_id));
        }

        posts.delete(post_id).await?;
        tx.track_removed(&post);
        tx.commit().await?;

        info!("Post deleted");
        Ok(())
    }
}
