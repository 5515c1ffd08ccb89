//! SeaORM-backed storage.
//!
//! Every DAO borrows a connection, so the same code runs against the pooled
//! `DatabaseConnection` or against `TxContext::conn()` inside a transaction.

pub mod entity;
pub mod follows;
pub mod mapper;
pub mod migrations;
pub mod posts;
pub mod users;

pub use follows::FollowsDao;
pub use posts::{FeedScope, NewPostRow, PostsDao};
pub use users::{NewUserRow, UsersDao};
