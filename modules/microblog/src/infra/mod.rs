pub mod notify;
pub mod search;
pub mod storage;
