pub mod accounts;
pub mod credentials;
pub mod error;
pub mod feed;
pub mod guarded_index;
pub mod index_sync;
pub mod pagination;
pub mod ports;
pub mod posts;
pub mod search;
pub mod searchable;
pub mod social_graph;
