use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::infra::storage::entity::follower::{ActiveModel as EdgeAM, Column, Entity as EdgeEntity};

pub struct FollowsDao<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> FollowsDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Insert the edge unless it exists. Returns true if a row was written.
    pub async fn insert_if_absent(
        &self,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<bool, sea_orm::DbErr> {
        let edge = EdgeAM {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
        };
        let written = EdgeEntity::insert(edge)
            .on_conflict(
                OnConflict::columns([Column::FollowerId, Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(written > 0)
    }

    /// Returns true if an edge was removed.
    pub async fn delete(&self, follower_id: i64, followed_id: i64) -> Result<bool, sea_orm::DbErr> {
        let res = EdgeEntity::delete_many()
            .filter(Column::FollowerId.eq(follower_id))
            .filter(Column::FollowedId.eq(followed_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn exists(&self, follower_id: i64, followed_id: i64) -> Result<bool, sea_orm::DbErr> {
        Ok(EdgeEntity::find_by_id((follower_id, followed_id))
            .one(self.conn)
            .await?
            .is_some())
    }

    pub async fn count_followers(&self, user_id: i64) -> Result<u64, sea_orm::DbErr> {
        EdgeEntity::find()
            .filter(Column::FollowedId.eq(user_id))
            .count(self.conn)
            .await
    }

    pub async fn count_followed(&self, user_id: i64) -> Result<u64, sea_orm::DbErr> {
        EdgeEntity::find()
            .filter(Column::FollowerId.eq(user_id))
            .count(self.conn)
            .await
    }
}
