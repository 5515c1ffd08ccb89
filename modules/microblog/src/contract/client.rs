use async_trait::async_trait;

use crate::contract::{
    error::MicroblogError,
    model::{FeedPage, NewUser, Post, ProfileEdit, ReindexReport, SearchResults, User},
};

/// Public API of the microblog module, consumed by the HTTP/CLI layer.
///
/// Expected absences are `Option`s; `Err` carries constraint violations and
/// store failures. Search-index trouble never surfaces here.
#[async_trait]
pub trait MicroblogApi: Send + Sync {
    // ---- accounts ----
    async fn register(&self, new_user: NewUser) -> Result<User, MicroblogError>;

    async fn authenticate(&self, username: &str, password: &str)
        -> Result<Option<User>, MicroblogError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, MicroblogError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, MicroblogError>;

    /// Record activity for an authenticated request.
    async fn touch_last_seen(&self, user_id: i64) -> Result<(), MicroblogError>;

    async fn edit_profile(&self, user_id: i64, edit: ProfileEdit) -> Result<User, MicroblogError>;

    // ---- posts ----
    async fn create_post(&self, author_id: i64, body: &str) -> Result<Post, MicroblogError>;

    async fn delete_post(&self, author_id: i64, post_id: i64) -> Result<(), MicroblogError>;

    // ---- social graph ----
    async fn follow(&self, follower_id: i64, target_id: i64) -> Result<(), MicroblogError>;

    async fn unfollow(&self, follower_id: i64, target_id: i64) -> Result<(), MicroblogError>;

    async fn is_following(&self, follower_id: i64, target_id: i64)
        -> Result<bool, MicroblogError>;

    /// Follow by username, rejecting unknown users and self-follows.
    async fn follow_user(&self, follower_id: i64, username: &str) -> Result<(), MicroblogError>;

    async fn unfollow_user(&self, follower_id: i64, username: &str)
        -> Result<(), MicroblogError>;

    async fn followers_count(&self, user_id: i64) -> Result<u64, MicroblogError>;

    async fn followed_count(&self, user_id: i64) -> Result<u64, MicroblogError>;

    // ---- feeds ----
    async fn personal_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, MicroblogError>;

    async fn global_feed(&self, page: u64, per_page: Option<u64>)
        -> Result<FeedPage<Post>, MicroblogError>;

    async fn user_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, MicroblogError>;

    // ---- search ----
    async fn search(&self, text: &str, page: u64, per_page: Option<u64>)
        -> Result<SearchResults, MicroblogError>;

    async fn reindex_all(&self) -> Result<ReindexReport, MicroblogError>;

    // ---- credentials ----
    async fn set_password(&self, user_id: i64, password: &str) -> Result<(), MicroblogError>;

    async fn check_password(&self, user_id: i64, password: &str) -> Result<bool, MicroblogError>;

    /// `ttl_secs` falls back to the configured reset-token lifetime.
    async fn issue_reset_token(&self, user_id: i64, ttl_secs: Option<u64>)
        -> Result<String, MicroblogError>;

    async fn verify_reset_token(&self, token: &str) -> Result<Option<User>, MicroblogError>;

    /// Mail a reset token to the owner of `email`, if any. Always succeeds
    /// from the caller's point of view unless the store fails.
    async fn request_password_reset(&self, email: &str) -> Result<(), MicroblogError>;

    /// Returns false when the token does not resolve to a user.
    async fn reset_password(&self, token: &str, new_password: &str)
        -> Result<bool, MicroblogError>;
}
