use crate::contract::model::{Post, User};
use crate::infra::storage::entity::{post, user};

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            about_me: m.about_me,
            last_seen: m.last_seen,
        }
    }
}

impl From<post::Model> for Post {
    fn from(m: post::Model) -> Self {
        Self {
            id: m.id,
            body: m.body,
            timestamp: m.timestamp,
            user_id: m.user_id,
            language: m.language,
        }
    }
}
