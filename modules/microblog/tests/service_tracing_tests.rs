//! The service layer logs what operators need when the index misbehaves

use std::sync::Arc;

use tracing_test::traced_test;

mod common;
use common::{env_with_index, env_with_memory_index, BrokenIndex};

#[traced_test]
#[tokio::test]
async fn registration_is_logged() {
    let (env, _index) = env_with_memory_index().await;
    let user = env.register("susan").await;

    assert!(user.id > 0);
    assert!(logs_contain("Registering new user"));
    assert!(logs_contain("Successfully registered user"));
    assert!(logs_contain("change set applied to search index"));
}

#[traced_test]
#[tokio::test]
async fn index_failures_are_warned_not_raised() {
    let env = env_with_index(Some(Arc::new(BrokenIndex))).await;
    let a = env.register("susan").await;
    env.post(&a, "hello").await;

    let results = env.api.search("hello", 1, None).await.unwrap();
    assert_eq!(results.total, 0);
    assert!(logs_contain("search index unavailable"));
}

#[traced_test]
#[tokio::test]
async fn reset_tokens_stay_out_of_service_logs() {
    let env = env_with_index(None).await;
    env.register("susan").await;
    env.api
        .request_password_reset("susan@example.com")
        .await
        .unwrap();

    let token = env.mailer.last_token().unwrap();
    assert!(!logs_contain(&token));
}
