use async_trait::async_trait;
use tracing::{debug, info};

use crate::contract::model::User;
use crate::domain::ports::Mailer;

/// Mailer used when no delivery collaborator is wired in: it records the
/// request in the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, user: &User, token: &str) -> anyhow::Result<()> {
        info!(user_id = user.id, email = %user.email, "password reset requested");
        debug!(token, "password reset token");
        Ok(())
    }
}
