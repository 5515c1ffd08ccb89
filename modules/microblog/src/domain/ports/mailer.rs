use async_trait::async_trait;

use crate::contract::model::User;

/// Delivers password-reset tokens. Transport is the collaborator's business.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, user: &User, token: &str) -> anyhow::Result<()>;
}
