use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::infra::storage::{FollowsDao, UsersDao};

/// Directed follow edges between users.
///
/// Every operation is idempotent. A self-follow is silently ignored here;
/// callers that want to reject it check identity first.
#[derive(Clone)]
pub struct SocialGraph {
    db: DatabaseConnection,
}

impl SocialGraph {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(name = "microblog.graph.follow", skip(self))]
    pub async fn follow(&self, follower_id: i64, target_id: i64) -> Result<(), DomainError> {
        if follower_id == target_id {
            debug!("self-follow ignored");
            return Ok(());
        }
        let created = match FollowsDao::new(&self.db)
            .insert_if_absent(follower_id, target_id)
            .await
        {
            Ok(created) => created,
            Err(e) if db::errors::is_seaorm_foreign_key_violation(&e) => {
                return Err(self.missing_endpoint(follower_id, target_id).await);
            }
            Err(e) => return Err(e.into()),
        };
        debug!(created, "follow edge ensured");
        Ok(())
    }

    /// The endpoint a rejected edge referenced but the store does not hold.
    async fn missing_endpoint(&self, follower_id: i64, target_id: i64) -> DomainError {
        match UsersDao::new(&self.db).find_by_id(follower_id).await {
            Ok(None) => DomainError::user_not_found(follower_id),
            Ok(Some(_)) => DomainError::user_not_found(target_id),
            Err(e) => e.into(),
        }
    }

    #[instrument(name = "microblog.graph.unfollow", skip(self))]
    pub async fn unfollow(&self, follower_id: i64, target_id: i64) -> Result<(), DomainError> {
        let removed = FollowsDao::new(&self.db)
            .delete(follower_id, target_id)
            .await?;
        debug!(removed, "follow edge cleared");
        Ok(())
    }

    pub async fn is_following(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError> {
        Ok(FollowsDao::new(&self.db)
            .exists(follower_id, target_id)
            .await?)
    }

    pub async fn followers_count(&self, user_id: i64) -> Result<u64, DomainError> {
        Ok(FollowsDao::new(&self.db).count_followers(user_id).await?)
    }

    pub async fn followed_count(&self, user_id: i64) -> Result<u64, DomainError> {
        Ok(FollowsDao::new(&self.db).count_followed(user_id).await?)
    }
}
