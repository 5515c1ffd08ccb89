use serde_json::Value;

use crate::contract::model::{Post, User};
use crate::domain::ports::Document;

pub const POST_INDEX: &str = "post";
pub const USER_INDEX: &str = "user";

/// A record type whose fields are projected into the search index.
pub trait Searchable {
    /// Index name the record lives in.
    fn type_name(&self) -> &'static str;
    fn id(&self) -> i64;
    /// Full replacement document for the index.
    fn indexed_fields(&self) -> Document;
}

impl Searchable for Post {
    fn type_name(&self) -> &'static str {
        POST_INDEX
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn indexed_fields(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("body".into(), Value::String(self.body.clone()));
        doc
    }
}

impl Searchable for User {
    fn type_name(&self) -> &'static str {
        USER_INDEX
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn indexed_fields(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("username".into(), Value::String(self.username.clone()));
        doc.insert(
            "about_me".into(),
            self.about_me.clone().map(Value::String).unwrap_or(Value::Null),
        );
        doc
    }
}
