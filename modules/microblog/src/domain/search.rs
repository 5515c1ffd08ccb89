use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use tracing::{debug, instrument, warn};

use crate::contract::model::{Post, SearchResults};
use crate::domain::error::DomainError;
use crate::domain::guarded_index::GuardedIndex;
use crate::domain::pagination::PageRequest;
use crate::domain::searchable::POST_INDEX;
use crate::infra::storage::PostsDao;

/// Free-text post search: ids and ranking from the index, content from the store.
#[derive(Clone)]
pub struct SearchService {
    db: DatabaseConnection,
    index: GuardedIndex,
    default_page_size: u64,
    max_page_size: u64,
}

impl SearchService {
    pub fn new(
        db: DatabaseConnection,
        index: GuardedIndex,
        default_page_size: u64,
        max_page_size: u64,
    ) -> Self {
        Self {
            db,
            index,
            default_page_size,
            max_page_size,
        }
    }

    #[instrument(name = "microblog.search.posts", skip(self), fields(query = %text))]
    pub async fn search(
        &self,
        text: &str,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<SearchResults, DomainError> {
        let req = PageRequest::new(page, per_page, self.default_page_size, self.max_page_size)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(SearchResults::default());
        }

        let Some(hits) = self
            .index
            .query(POST_INDEX, text, req.offset(), req.per_page)
            .await
        else {
            return Ok(SearchResults::default());
        };
        if hits.total == 0 || hits.ids.is_empty() {
            debug!(total = hits.total, "no matches; store not queried");
            return Ok(SearchResults {
                posts: Vec::new(),
                total: hits.total,
            });
        }

        let rank: HashMap<i64, usize> = hits
            .ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();

        let mut posts: Vec<Post> = PostsDao::new(&self.db)
            .find_by_ids(&hits.ids)
            .await?
            .into_iter()
            .map(Post::from)
            .collect();
        posts.sort_by_key(|p| rank.get(&p.id).copied().unwrap_or(usize::MAX));

        let stale: Vec<i64> = rank
            .keys()
            .filter(|id| !posts.iter().any(|p| p.id == **id))
            .copied()
            .collect();
        let total = hits.total.saturating_sub(stale.len() as u64);

        if !stale.is_empty() {
            warn!(?stale, "index returned ids missing from the store; repairing");
            for id in stale {
                self.index.remove(POST_INDEX, id).await;
            }
        }

        debug!(total, returned = posts.len(), "search hydrated");
        Ok(SearchResults { posts, total })
    }
}
