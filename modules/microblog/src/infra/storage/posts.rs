use chrono::{DateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::infra::storage::entity::follower;
use crate::infra::storage::entity::post::{self, ActiveModel as PostAM, Column, Entity as PostEntity};

pub struct NewPostRow {
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub language: String,
}

/// Which posts a feed draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Posts by the user and by everyone the user follows.
    Personal(i64),
    /// Posts by one author.
    Author(i64),
    /// Every post.
    Global,
}

impl FeedScope {
    fn select(self) -> Select<PostEntity> {
        let q = PostEntity::find();
        match self {
            FeedScope::Personal(user_id) => {
                // A single predicate over `post` keeps every row at most once,
                // whatever the shape of the follow graph.
                let followed = Query::select()
                    .column(follower::Column::FollowedId)
                    .from(follower::Entity)
                    .and_where(follower::Column::FollowerId.eq(user_id))
                    .to_owned();
                q.filter(
                    Condition::any()
                        .add(Column::UserId.in_subquery(followed))
                        .add(Column::UserId.eq(user_id)),
                )
            }
            FeedScope::Author(user_id) => q.filter(Column::UserId.eq(user_id)),
            FeedScope::Global => q,
        }
    }
}

pub struct PostsDao<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> PostsDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<post::Model>, sea_orm::DbErr> {
        PostEntity::find_by_id(id).one(self.conn).await
    }

    /// Unordered; callers impose their own order.
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<post::Model>, sea_orm::DbErr> {
        PostEntity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await
    }

    pub async fn insert(&self, row: NewPostRow) -> Result<post::Model, sea_orm::DbErr> {
        PostAM {
            body: Set(row.body),
            timestamp: Set(row.timestamp),
            user_id: Set(row.user_id),
            language: Set(row.language),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sea_orm::DbErr> {
        let res = PostEntity::delete_by_id(id).exec(self.conn).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn count(&self, scope: FeedScope) -> Result<u64, sea_orm::DbErr> {
        scope.select().count(self.conn).await
    }

    /// Newest first; equal timestamps fall back to id descending so page
    /// boundaries are stable.
    pub async fn window(
        &self,
        scope: FeedScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<post::Model>, sea_orm::DbErr> {
        scope
            .select()
            .order_by_desc(Column::Timestamp)
            .order_by_desc(Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.conn)
            .await
    }

    /// Keyset batch ordered by id, for bulk walks over every post.
    pub async fn batch_after(
        &self,
        after_id: i64,
        limit: u64,
    ) -> Result<Vec<post::Model>, sea_orm::DbErr> {
        PostEntity::find()
            .filter(Column::Id.gt(after_id))
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(self.conn)
            .await
    }
}
