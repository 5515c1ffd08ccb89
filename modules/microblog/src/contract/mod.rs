pub mod client;
pub mod error;
pub mod model;

pub use client::MicroblogApi;
pub use error::MicroblogError;
pub use model::{FeedPage, NewUser, Post, ProfileEdit, ReindexReport, SearchResults, User};
