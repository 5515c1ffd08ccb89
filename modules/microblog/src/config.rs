use serde::{Deserialize, Serialize};

/// Configuration for the microblog module (`modules.microblog`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicroblogConfig {
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_max_text_length")]
    pub max_post_length: usize,
    #[serde(default = "default_max_text_length")]
    pub max_about_me_length: usize,
    /// Signs password-reset tokens. Override outside development.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: u64,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for MicroblogConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
            max_page_size: default_max_page_size(),
            max_post_length: default_max_text_length(),
            max_about_me_length: default_max_text_length(),
            secret_key: default_secret_key(),
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// No index; search returns nothing and writes skip the index.
    #[default]
    Disabled,
    /// Process-local index, lost on restart.
    Memory,
    Elasticsearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,
    /// Base URL of the Elasticsearch node.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            url: None,
            timeout_ms: default_search_timeout_ms(),
        }
    }
}

fn default_posts_per_page() -> u64 {
    25
}

fn default_max_page_size() -> u64 {
    100
}

fn default_max_text_length() -> usize {
    140
}

fn default_secret_key() -> String {
    "you-will-never-guess".to_string()
}

fn default_reset_token_ttl_secs() -> u64 {
    600
}

fn default_search_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_yields_defaults() {
        let cfg: MicroblogConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.posts_per_page, 25);
        assert_eq!(cfg.reset_token_ttl_secs, 600);
        assert_eq!(cfg.search.backend, SearchBackend::Disabled);
        assert_eq!(cfg.search.timeout_ms, 2000);
    }

    #[test]
    fn search_backend_is_lowercase() {
        let cfg: MicroblogConfig = serde_json::from_value(serde_json::json!({
            "search": { "backend": "elasticsearch", "url": "http://localhost:9200" }
        }))
        .unwrap();
        assert_eq!(cfg.search.backend, SearchBackend::Elasticsearch);
        assert_eq!(cfg.search.url.as_deref(), Some("http://localhost:9200"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<MicroblogConfig, _> =
            serde_json::from_value(serde_json::json!({ "per_page": 3 }));
        assert!(res.is_err());
    }
}
