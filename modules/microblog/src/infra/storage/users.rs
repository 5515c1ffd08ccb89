use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::infra::storage::entity::user::{self, ActiveModel as UserAM, Column, Entity as UserEntity};

pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

pub struct UsersDao<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UsersDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<user::Model>, sea_orm::DbErr> {
        UserEntity::find_by_id(id).one(self.conn).await
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, sea_orm::DbErr> {
        UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(self.conn)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, sea_orm::DbErr> {
        UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(self.conn)
            .await
    }

    /// True if another user (not `except`) already holds `username`.
    pub async fn username_exists(
        &self,
        username: &str,
        except: Option<i64>,
    ) -> Result<bool, sea_orm::DbErr> {
        let mut q = UserEntity::find().filter(Column::Username.eq(username));
        if let Some(id) = except {
            q = q.filter(Column::Id.ne(id));
        }
        Ok(q.count(self.conn).await? > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, sea_orm::DbErr> {
        let count = UserEntity::find()
            .filter(Column::Email.eq(email))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn insert(&self, row: NewUserRow) -> Result<user::Model, sea_orm::DbErr> {
        UserAM {
            username: Set(row.username),
            email: Set(row.email),
            password_hash: Set(row.password_hash),
            about_me: Set(None),
            last_seen: Set(None),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    pub async fn update_profile(
        &self,
        id: i64,
        username: String,
        about_me: Option<String>,
    ) -> Result<user::Model, sea_orm::DbErr> {
        UserAM {
            id: Set(id),
            username: Set(username),
            about_me: Set(about_me),
            ..Default::default()
        }
        .update(self.conn)
        .await
    }

    /// Returns false when no such user exists.
    pub async fn set_password_hash(&self, id: i64, hash: String) -> Result<bool, sea_orm::DbErr> {
        let res = UserEntity::update_many()
            .col_expr(Column::PasswordHash, Expr::value(hash))
            .filter(Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn touch_last_seen(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, sea_orm::DbErr> {
        let res = UserEntity::update_many()
            .col_expr(Column::LastSeen, Expr::value(at))
            .filter(Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Keyset batch ordered by id, for bulk walks over every user.
    pub async fn batch_after(
        &self,
        after_id: i64,
        limit: u64,
    ) -> Result<Vec<user::Model>, sea_orm::DbErr> {
        UserEntity::find()
            .filter(Column::Id.gt(after_id))
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(self.conn)
            .await
    }
}
