//! Elasticsearch adapter for the search index port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{field::Empty, instrument, Instrument, Level};
use url::Url;

use crate::domain::ports::{Document, IndexError, IndexHits, SearchIndex};

pub struct ElasticsearchIndex {
    client: reqwest::Client,
    base: Url,
}

impl ElasticsearchIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IndexError> {
        let base = Url::parse(base_url).map_err(|e| IndexError::Config(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(IndexError::Config(format!("'{base_url}' cannot be a base URL")));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Config(e.to_string()))?;
        Ok(Self { client, base })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, IndexError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| IndexError::Config("invalid base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request inside an `outgoing_http` span.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, IndexError> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %method,
            http.url = %url,
            http.status_code = Empty,
            otel.kind = "client",
        );

        async {
            let mut req = self.client.request(method, url);
            if let Some(body) = body {
                req = req.json(&body);
            }
            let response = req
                .send()
                .await
                .map_err(|e| IndexError::Transport(e.to_string()))?;
            tracing::Span::current().record("http.status_code", response.status().as_u16());
            Ok::<_, IndexError>(response)
        }
        .instrument(span)
        .await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: Total,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// ES 6 returns a bare number, ES 7+ an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    #[instrument(name = "microblog.es.upsert", skip(self, doc), fields(base = %self.base))]
    async fn upsert(&self, index: &str, id: i64, doc: &Document) -> Result<(), IndexError> {
        let url = self.url(&[index, "_doc", &id.to_string()])?;
        let response = self
            .send(Method::PUT, url, Some(serde_json::Value::Object(doc.clone())))
            .await?;
        if !response.status().is_success() {
            return Err(IndexError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    #[instrument(name = "microblog.es.remove", skip(self), fields(base = %self.base))]
    async fn remove(&self, index: &str, id: i64) -> Result<(), IndexError> {
        let url = self.url(&[index, "_doc", &id.to_string()])?;
        let response = self.send(Method::DELETE, url, None).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(IndexError::Status {
            status: status.as_u16(),
        })
    }

    #[instrument(name = "microblog.es.query", skip(self), fields(base = %self.base))]
    async fn query(
        &self,
        index: &str,
        text: &str,
        from: u64,
        size: u64,
    ) -> Result<IndexHits, IndexError> {
        let url = self.url(&[index, "_search"])?;
        let body = json!({
            "query": { "multi_match": { "query": text, "fields": ["*"] } },
            "from": from,
            "size": size,
        });
        let response = self.send(Method::POST, url, Some(body)).await?;
        let status = response.status();
        // A query against an index nobody has written to yet.
        if status == StatusCode::NOT_FOUND {
            return Ok(IndexHits::default());
        }
        if !status.is_success() {
            return Err(IndexError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Decode(e.to_string()))?;
        let ids = parsed
            .hits
            .hits
            .iter()
            .map(|h| {
                h.id.parse::<i64>()
                    .map_err(|_| IndexError::Decode(format!("non-numeric document id '{}'", h.id)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = match parsed.hits.total {
            Total::Count(n) | Total::Object { value: n } => n,
        };
        Ok(IndexHits { ids, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn index_for(server: &MockServer) -> ElasticsearchIndex {
        ElasticsearchIndex::new(&server.base_url(), Duration::from_secs(2)).unwrap()
    }

    fn doc(body: &str) -> Document {
        json!({ "body": body }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn upsert_puts_the_full_document() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/post/_doc/7")
                    .json_body(json!({ "body": "hello" }));
                then.status(201).json_body(json!({ "result": "created" }));
            })
            .await;

        index_for(&server).upsert("post", 7, &doc("hello")).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn remove_tolerates_missing_documents() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/post/_doc/9");
                then.status(404).json_body(json!({ "result": "not_found" }));
            })
            .await;

        index_for(&server).remove("post", 9).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn query_returns_ids_in_hit_order() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST).path("/post/_search").json_body(json!({
                    "query": { "multi_match": { "query": "rust", "fields": ["*"] } },
                    "from": 10,
                    "size": 5,
                }));
                then.status(200).json_body(json!({
                    "hits": {
                        "total": { "value": 12, "relation": "eq" },
                        "hits": [
                            { "_id": "3", "_score": 2.0 },
                            { "_id": "1", "_score": 1.5 }
                        ]
                    }
                }));
            })
            .await;

        let hits = index_for(&server).query("post", "rust", 10, 5).await.unwrap();
        m.assert_async().await;
        assert_eq!(hits.ids, vec![3, 1]);
        assert_eq!(hits.total, 12);
    }

    #[tokio::test]
    async fn legacy_numeric_total_is_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/post/_search");
                then.status(200)
                    .json_body(json!({ "hits": { "total": 0, "hits": [] } }));
            })
            .await;

        let hits = index_for(&server).query("post", "zzz", 0, 5).await.unwrap();
        assert_eq!(hits, IndexHits::default());
    }

    #[tokio::test]
    async fn missing_index_means_no_hits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/user/_search");
                then.status(404);
            })
            .await;

        let hits = index_for(&server).query("user", "susan", 0, 5).await.unwrap();
        assert_eq!(hits.total, 0);
    }

    #[tokio::test]
    async fn server_errors_surface_as_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/post/_doc/1");
                then.status(503);
            })
            .await;

        let err = index_for(&server).upsert("post", 1, &doc("x")).await.unwrap_err();
        assert!(matches!(err, IndexError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn non_numeric_ids_are_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/post/_search");
                then.status(200).json_body(json!({
                    "hits": { "total": { "value": 1 }, "hits": [{ "_id": "abc" }] }
                }));
            })
            .await;

        let err = index_for(&server).query("post", "x", 0, 5).await.unwrap_err();
        assert!(matches!(err, IndexError::Decode(_)));
    }

    #[test]
    fn base_path_is_preserved() {
        let es = ElasticsearchIndex::new("http://es.local:9200/prefix/", Duration::from_secs(1))
            .unwrap();
        let url = es.url(&["post", "_doc", "5"]).unwrap();
        assert_eq!(url.as_str(), "http://es.local:9200/prefix/post/_doc/5");
    }

    #[test]
    fn unusable_urls_are_rejected() {
        assert!(ElasticsearchIndex::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ElasticsearchIndex::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }
}
