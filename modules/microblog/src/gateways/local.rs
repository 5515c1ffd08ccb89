use async_trait::async_trait;

use crate::contract::{
    client::MicroblogApi,
    error::MicroblogError,
    model::{FeedPage, NewUser, Post, ProfileEdit, ReindexReport, SearchResults, User},
};
use crate::module::Microblog;

/// Local implementation of the MicroblogApi trait that delegates to the domain services
pub struct MicroblogLocalClient {
    module: Microblog,
}

impl MicroblogLocalClient {
    pub fn new(module: Microblog) -> Self {
        Self { module }
    }
}

#[async_trait]
impl MicroblogApi for MicroblogLocalClient {
    async fn register(&self, new_user: NewUser) -> Result<User, MicroblogError> {
        self.module
            .accounts()
            .register(new_user)
            .await
            .map_err(Into::into)
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, MicroblogError> {
        self.module
            .accounts()
            .authenticate(username, password)
            .await
            .map_err(Into::into)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, MicroblogError> {
        self.module.accounts().find_user(id).await.map_err(Into::into)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, MicroblogError> {
        self.module
            .accounts()
            .find_user_by_username(username)
            .await
            .map_err(Into::into)
    }

    async fn touch_last_seen(&self, user_id: i64) -> Result<(), MicroblogError> {
        self.module
            .accounts()
            .touch_last_seen(user_id)
            .await
            .map_err(Into::into)
    }

    async fn edit_profile(&self, user_id: i64, edit: ProfileEdit) -> Result<User, MicroblogError> {
        self.module
            .accounts()
            .edit_profile(user_id, edit)
            .await
            .map_err(Into::into)
    }

    async fn create_post(&self, author_id: i64, body: &str) -> Result<Post, MicroblogError> {
        self.module
            .posts()
            .create_post(author_id, body)
            .await
            .map_err(Into::into)
    }

    async fn delete_post(&self, author_id: i64, post_id: i64) -> Result<(), MicroblogError> {
        self.module
            .posts()
            .delete_post(author_id, post_id)
            .await
            .map_err(Into::into)
    }

    async fn follow(&self, follower_id: i64, target_id: i64) -> Result<(), MicroblogError> {
        self.module
            .graph()
            .follow(follower_id, target_id)
            .await
            .map_err(Into::into)
    }

    async fn unfollow(&self, follower_id: i64, target_id: i64) -> Result<(), MicroblogError> {
        self.module
            .graph()
            .unfollow(follower_id, target_id)
            .await
            .map_err(Into::into)
    }

    async fn is_following(
        &self,
        follower_id: i64,
        target_id: i64,
    ) -> Result<bool, MicroblogError> {
        self.module
            .graph()
            .is_following(follower_id, target_id)
            .await
            .map_err(Into::into)
    }

    async fn follow_user(&self, follower_id: i64, username: &str) -> Result<(), MicroblogError> {
        self.module
            .accounts()
            .follow_user(follower_id, username)
            .await
            .map_err(Into::into)
    }

    async fn unfollow_user(
        &self,
        follower_id: i64,
        username: &str,
    ) -> Result<(), MicroblogError> {
        self.module
            .accounts()
            .unfollow_user(follower_id, username)
            .await
            .map_err(Into::into)
    }

    async fn followers_count(&self, user_id: i64) -> Result<u64, MicroblogError> {
        self.module
            .graph()
            .followers_count(user_id)
            .await
            .map_err(Into::into)
    }

    async fn followed_count(&self, user_id: i64) -> Result<u64, MicroblogError> {
        self.module
            .graph()
            .followed_count(user_id)
            .await
            .map_err(Into::into)
    }

    async fn personal_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, MicroblogError> {
        self.module
            .feed()
            .personal_feed(user_id, page, per_page)
            .await
            .map_err(Into::into)
    }

    async fn global_feed(
        &self,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, MicroblogError> {
        self.module
            .feed()
            .global_feed(page, per_page)
            .await
            .map_err(Into::into)
    }

    async fn user_feed(
        &self,
        user_id: i64,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<FeedPage<Post>, MicroblogError> {
        self.module
            .feed()
            .user_feed(user_id, page, per_page)
            .await
            .map_err(Into::into)
    }

    async fn search(
        &self,
        text: &str,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<SearchResults, MicroblogError> {
        self.module
            .search()
            .search(text, page, per_page)
            .await
            .map_err(Into::into)
    }

    async fn reindex_all(&self) -> Result<ReindexReport, MicroblogError> {
        self.module
            .synchronizer()
            .reindex_all()
            .await
            .map_err(Into::into)
    }

    async fn set_password(&self, user_id: i64, password: &str) -> Result<(), MicroblogError> {
        self.module
            .credentials()
            .set_password(user_id, password)
            .await
            .map_err(Into::into)
    }

    async fn check_password(&self, user_id: i64, password: &str) -> Result<bool, MicroblogError> {
        self.module
            .credentials()
            .check_password(user_id, password)
            .await
            .map_err(Into::into)
    }

    async fn issue_reset_token(
        &self,
        user_id: i64,
        ttl_secs: Option<u64>,
    ) -> Result<String, MicroblogError> {
        self.module
            .credentials()
            .issue_reset_token(user_id, ttl_secs)
            .await
            .map_err(Into::into)
    }

    async fn verify_reset_token(&self, token: &str) -> Result<Option<User>, MicroblogError> {
        self.module
            .credentials()
            .verify_reset_token(token)
            .await
            .map_err(Into::into)
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), MicroblogError> {
        self.module
            .accounts()
            .request_password_reset(email)
            .await
            .map_err(Into::into)
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<bool, MicroblogError> {
        self.module
            .accounts()
            .reset_password(token, new_password)
            .await
            .map_err(Into::into)
    }
}
