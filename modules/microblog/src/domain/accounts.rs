use std::sync::Arc;

use db::TxContext;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{NewUser, ProfileEdit, User};
use crate::domain::credentials::{hash_password, verify_password, CredentialService};
use crate::domain::error::DomainError;
use crate::domain::index_sync::IndexSynchronizer;
use crate::domain::ports::{Clock, Mailer};
use crate::domain::social_graph::SocialGraph;
use crate::infra::storage::{NewUserRow, UsersDao};

const MAX_USERNAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 120;

#[derive(Debug, Clone, Copy)]
pub struct AccountConfig {
    pub max_about_me_length: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            max_about_me_length: 140,
        }
    }
}

/// Registration, login, profiles and the password-reset flow.
#[derive(Clone)]
pub struct AccountService {
    db: DatabaseConnection,
    sync: IndexSynchronizer,
    graph: SocialGraph,
    credentials: CredentialService,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: AccountConfig,
}

impl AccountService {
    pub fn new(
        db: DatabaseConnection,
        sync: IndexSynchronizer,
        graph: SocialGraph,
        credentials: CredentialService,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: AccountConfig,
    ) -> Self {
        Self {
            db,
            sync,
            graph,
            credentials,
            mailer,
            clock,
            config,
        }
    }

    #[instrument(
        name = "microblog.accounts.register",
        skip(self, new_user),
        fields(username = %new_user.username)
    )]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Registering new user");

        let username = validate_username(&new_user.username)?;
        let email = validate_email(&new_user.email)?;
        if new_user.password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }
        let password_hash = hash_password(&new_user.password)?;

        let tx = self.sync.begin().await?;
        let users = UsersDao::new(tx.conn());
        if users.username_exists(&username, None).await? {
            return Err(DomainError::username_taken(username));
        }
        if users.email_exists(&email).await? {
            return Err(DomainError::email_taken(email));
        }

        let row = users
            .insert(NewUserRow {
                username: username.clone(),
                email: email.clone(),
                password_hash,
            })
            .await
            .map_err(|e| insert_conflict(e, &username, &email))?;

        let user = User::from(row);
        tx.track_added(&user);
        tx.commit().await?;

        info!(user_id = user.id, "Successfully registered user");
        Ok(user)
    }

    /// The user if `username` exists and `password` matches.
    #[instrument(name = "microblog.accounts.authenticate", skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let found = UsersDao::new(&self.db).find_by_username(username).await?;
        let user = found
            .filter(|row| verify_password(&row.password_hash, password))
            .map(User::from);
        debug!(ok = user.is_some(), "authentication attempt");
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(UsersDao::new(&self.db)
            .find_by_id(id)
            .await?
            .map(Into::into))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(UsersDao::new(&self.db)
            .find_by_username(username)
            .await?
            .map(Into::into))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(UsersDao::new(&self.db)
            .find_by_email(email)
            .await?
            .map(Into::into))
    }

    /// `last_seen` is not an indexed field, so this bypasses the synchronizer.
    #[instrument(name = "microblog.accounts.touch_last_seen", skip(self))]
    pub async fn touch_last_seen(&self, user_id: i64) -> Result<(), DomainError> {
        if !UsersDao::new(&self.db)
            .touch_last_seen(user_id, self.clock.now())
            .await?
        {
            return Err(DomainError::user_not_found(user_id));
        }
        Ok(())
    }

    #[instrument(name = "microblog.accounts.edit_profile", skip(self, edit))]
    pub async fn edit_profile(&self, user_id: i64, edit: ProfileEdit) -> Result<User, DomainError> {
        let new_username = edit.username.as_deref().map(validate_username).transpose()?;
        if let Some(about) = &edit.about_me {
            let len = about.chars().count();
            if len > self.config.max_about_me_length {
                return Err(DomainError::validation(
                    "about_me",
                    format!(
                        "{len} characters (max: {})",
                        self.config.max_about_me_length
                    ),
                ));
            }
        }

        let tx = self.sync.begin().await?;
        let users = UsersDao::new(tx.conn());
        let current = users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;

        let username = match new_username {
            Some(name) if name != current.username => {
                if users.username_exists(&name, Some(user_id)).await? {
                    return Err(DomainError::username_taken(name));
                }
                name
            }
            _ => current.username.clone(),
        };
        let about_me = match edit.about_me {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => Some(text),
            None => current.about_me.clone(),
        };

        let row = users
            .update_profile(user_id, username.clone(), about_me)
            .await
            .map_err(|e| rename_conflict(e, &username))?;
        let user = User::from(row);
        tx.track_updated(&user);
        tx.commit().await?;

        info!("Successfully updated profile");
        Ok(user)
    }

    /// Follow by username. Unknown users and self-follows are rejected here,
    /// before the graph is touched.
    #[instrument(name = "microblog.accounts.follow_user", skip(self))]
    pub async fn follow_user(&self, follower_id: i64, username: &str) -> Result<(), DomainError> {
        let target = self.resolve_follow_target(follower_id, username).await?;
        self.graph.follow(follower_id, target).await
    }

    #[instrument(name = "microblog.accounts.unfollow_user", skip(self))]
    pub async fn unfollow_user(&self, follower_id: i64, username: &str) -> Result<(), DomainError> {
        let target = self.resolve_follow_target(follower_id, username).await?;
        self.graph.unfollow(follower_id, target).await
    }

    async fn resolve_follow_target(
        &self,
        follower_id: i64,
        username: &str,
    ) -> Result<i64, DomainError> {
        let users = UsersDao::new(&self.db);
        if users.find_by_id(follower_id).await?.is_none() {
            return Err(DomainError::user_not_found(follower_id));
        }
        let target = users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::unknown_username(username))?;
        if target.id == follower_id {
            return Err(DomainError::CannotFollowSelf);
        }
        Ok(target.id)
    }

    /// Mails a reset token if the address belongs to a user. Unknown
    /// addresses and delivery failures look the same to the caller.
    #[instrument(name = "microblog.accounts.request_password_reset", skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(row) = UsersDao::new(&self.db).find_by_email(email).await? else {
            debug!("no account for reset request");
            return Ok(());
        };
        let token = self.credentials.token_for(&row, None)?;
        let user = User::from(row);
        if let Err(e) = self.mailer.send_password_reset(&user, &token).await {
            warn!(user_id = user.id, error = %e, "password reset mail not delivered");
        }
        Ok(())
    }

    /// Verify the token and replace the password in one transaction. Returns
    /// false when the token resolves to no user.
    #[instrument(name = "microblog.accounts.reset_password", skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<bool, DomainError> {
        if new_password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }

        let tx = TxContext::begin(&self.db).await?;
        let resolved = self.credentials.resolve_token_in(tx.conn(), token).await?;
        let Some(row) = resolved else {
            tx.rollback().await?;
            return Ok(false);
        };
        self.credentials
            .set_password_in(tx.conn(), row.id, new_password)
            .await?;
        tx.commit().await?;

        info!(user_id = row.id, "password reset");
        Ok(true)
    }
}

fn validate_username(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("username", "must not be empty"));
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(DomainError::validation(
            "username",
            format!("at most {MAX_USERNAME_LEN} characters"),
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("username", "must not contain spaces"));
    }
    Ok(name.to_string())
}

fn validate_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim();
    let valid = email.len() <= MAX_EMAIL_LEN
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
    if !valid {
        return Err(DomainError::validation(
            "email",
            format!("invalid address '{email}'"),
        ));
    }
    Ok(email.to_string())
}

/// Maps a racing insert that lost on a unique column to the matching conflict.
fn insert_conflict(err: sea_orm::DbErr, username: &str, email: &str) -> DomainError {
    if db::errors::is_unique_violation_on(&err, "email") {
        DomainError::email_taken(email)
    } else if db::errors::is_seaorm_unique_violation(&err) {
        DomainError::username_taken(username)
    } else {
        err.into()
    }
}

/// Only the username is unique among the profile columns.
fn rename_conflict(err: sea_orm::DbErr, username: &str) -> DomainError {
    if db::errors::is_seaorm_unique_violation(&err) {
        DomainError::username_taken(username)
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{ConnectOpts, DbHandle};

    async fn store() -> DbHandle {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        crate::Microblog::migrate(db.sea_ref()).await.unwrap();
        db
    }

    fn row(username: &str, email: &str) -> NewUserRow {
        NewUserRow {
            username: username.into(),
            email: email.into(),
            password_hash: "x".into(),
        }
    }

    #[tokio::test]
    async fn insert_conflicts_name_the_colliding_column() {
        let db = store().await;
        let conn = db.sea();
        let users = UsersDao::new(&conn);
        users.insert(row("susan", "susan@example.com")).await.unwrap();

        let err = users
            .insert(row("john", "susan@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            insert_conflict(err, "john", "susan@example.com"),
            DomainError::EmailTaken { .. }
        ));

        let err = users
            .insert(row("susan", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            insert_conflict(err, "susan", "other@example.com"),
            DomainError::UsernameTaken { .. }
        ));
    }

    #[tokio::test]
    async fn racing_rename_is_a_conflict() {
        let db = store().await;
        let conn = db.sea();
        let users = UsersDao::new(&conn);
        users.insert(row("susan", "susan@example.com")).await.unwrap();
        let john = users.insert(row("john", "john@example.com")).await.unwrap();

        let err = users
            .update_profile(john.id, "susan".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            rename_conflict(err, "susan"),
            DomainError::UsernameTaken { .. }
        ));
    }

    #[test]
    fn usernames_are_trimmed_and_checked() {
        assert_eq!(validate_username("  susan ").unwrap(), "susan");
        assert!(validate_username("").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("susan@example.com").is_ok());
        assert!(validate_email("susan@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
        assert!(validate_email("susan.example.com").is_err());
    }
}
