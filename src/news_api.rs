use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::NewsApiConfig;
use crate::error::{Error, Result};
use crate::normalizer::{NewsApiResponse, RawArticle};

/// Upper bound on memoized responses; the oldest entry is evicted first.
const MAX_REVALIDATED: usize = 64;

/// One request shape against the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NewsQuery {
    /// `/top-headlines` for a provider category (already lowercased)
    TopHeadlines { category: String },
    /// `/everything` free-text search, sorted by relevance
    Everything { query: String },
}

impl NewsQuery {
    fn endpoint(&self) -> &'static str {
        match self {
            NewsQuery::TopHeadlines { .. } => "top-headlines",
            NewsQuery::Everything { .. } => "everything",
        }
    }
}

struct Revalidated {
    fetched_at: Instant,
    articles: Vec<RawArticle>,
}

pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
    page_size: u32,
    revalidate: Duration,
    responses: RwLock<HashMap<NewsQuery, Revalidated>>,
}

impl NewsApiClient {
    pub fn new(config: &NewsApiConfig) -> Result<Self> {
        Self::with_api_key(config, config.api_key())
    }

    pub fn with_api_key(config: &NewsApiConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("NewsHub/1.0 (News Aggregator)")
            .build()
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
            page_size: config.page_size,
            revalidate: Duration::from_secs(config.revalidate_minutes.saturating_mul(60)),
            responses: RwLock::new(HashMap::new()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch raw records for `query`, reusing a response younger than the
    /// revalidation window.
    pub async fn fetch(&self, query: &NewsQuery) -> Result<Vec<RawArticle>> {
        if let Some(articles) = self.revalidated(query).await {
            debug!("Reusing provider response for {:?}", query);
            return Ok(articles);
        }

        let articles = self.request(query).await?;

        if !self.revalidate.is_zero() {
            let mut responses = self.responses.write().await;
            responses.retain(|_, r| r.fetched_at.elapsed() < self.revalidate);
            if responses.len() >= MAX_REVALIDATED && !responses.contains_key(query) {
                let oldest = responses
                    .iter()
                    .min_by_key(|(_, r)| r.fetched_at)
                    .map(|(q, _)| q.clone());
                if let Some(oldest) = oldest {
                    responses.remove(&oldest);
                }
            }
            responses.insert(
                query.clone(),
                Revalidated {
                    fetched_at: Instant::now(),
                    articles: articles.clone(),
                },
            );
        }

        Ok(articles)
    }

    async fn revalidated(&self, query: &NewsQuery) -> Option<Vec<RawArticle>> {
        if self.revalidate.is_zero() {
            return None;
        }
        let responses = self.responses.read().await;
        responses
            .get(query)
            .filter(|r| r.fetched_at.elapsed() < self.revalidate)
            .map(|r| r.articles.clone())
    }

    async fn request(&self, query: &NewsQuery) -> Result<Vec<RawArticle>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::UpstreamUnavailable("news API key is not configured".to_string()))?;

        let url = format!("{}/{}", self.base_url, query.endpoint());
        let page_size = self.page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("language", self.language.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        match query {
            NewsQuery::TopHeadlines { category } => params.push(("category", category.as_str())),
            NewsQuery::Everything { query: q } => {
                params.push(("q", q.as_str()));
                params.push(("sortBy", "relevancy"));
            }
        }

        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body: NewsApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(Error::UpstreamUnavailable(format!(
                    "undecodable response from {}: {}",
                    url, e
                )))
            }
            Err(_) => {
                return Err(Error::UpstreamUnavailable(format!(
                    "HTTP {} from {}",
                    status, url
                )))
            }
        };

        if !status.is_success() || body.status != "ok" {
            return Err(Error::UpstreamUnavailable(format!(
                "HTTP {} from {} (status '{}'): {}",
                status,
                url,
                body.status,
                body.message.as_deref().unwrap_or("no message")
            )));
        }

        info!(
            "Fetched {} records from {} in {:.2}s",
            body.articles.len(),
            query.endpoint(),
            start.elapsed().as_secs_f32()
        );
        Ok(body.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, revalidate_minutes: u64) -> NewsApiConfig {
        NewsApiConfig {
            base_url: server.uri(),
            revalidate_minutes,
            ..NewsApiConfig::default()
        }
    }

    fn ok_body() -> serde_json::Value {
        json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Wire"},
                "title": "Headline",
                "url": "https://example.com/a",
                "urlToImage": "https://example.com/a.jpg",
                "publishedAt": "2024-01-01T00:00:00Z"
            }]
        })
    }

    fn headlines(category: &str) -> NewsQuery {
        NewsQuery::TopHeadlines {
            category: category.to_string(),
        }
    }

    #[tokio::test]
    async fn test_top_headlines_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("category", "science"))
            .and(query_param("language", "en"))
            .and(query_param("pageSize", "40"))
            .and(header("X-Api-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("test-key".to_string()))
                .unwrap();
        let articles = client.fetch(&headlines("science")).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Headline"));
    }

    #[tokio::test]
    async fn test_everything_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .and(query_param("q", "stock market japan"))
            .and(query_param("sortBy", "relevancy"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("k".to_string())).unwrap();
        let query = NewsQuery::Everything {
            query: "stock market japan".to_string(),
        };

        assert_eq!(client.fetch(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(0)
            .mount(&server)
            .await;

        let client = NewsApiClient::with_api_key(&config_for(&server, 15), None).unwrap();

        assert!(!client.has_api_key());
        assert!(matches!(
            client.fetch(&headlines("general")).await,
            Err(Error::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_error_status_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid."
            })))
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("bad".to_string())).unwrap();

        match client.fetch(&headlines("general")).await {
            Err(Error::UpstreamUnavailable(message)) => {
                assert!(message.contains("Your API key is invalid."))
            }
            other => panic!("expected UpstreamUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ok_http_with_non_ok_status_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "error", "articles": []})),
            )
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("k".to_string())).unwrap();

        assert!(client.fetch(&headlines("general")).await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("k".to_string())).unwrap();

        assert!(matches!(
            client.fetch(&headlines("general")).await,
            Err(Error::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_response_reused_within_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 15), Some("k".to_string())).unwrap();

        client.fetch(&headlines("general")).await.unwrap();
        let second = client.fetch(&headlines("general")).await.unwrap();

        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_window_is_per_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 15), Some("k".to_string())).unwrap();

        client.fetch(&headlines("general")).await.unwrap();
        client.fetch(&headlines("sports")).await.unwrap();
        client.fetch(&headlines("sports")).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_window_always_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 0), Some("k".to_string())).unwrap();

        client.fetch(&headlines("general")).await.unwrap();
        client.fetch(&headlines("general")).await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_are_not_reused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 15), Some("k".to_string())).unwrap();

        assert!(client.fetch(&headlines("general")).await.is_err());
        assert!(client.fetch(&headlines("general")).await.is_err());
    }

    #[tokio::test]
    async fn test_memo_stays_bounded_across_distinct_searches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 15), Some("k".to_string())).unwrap();

        for i in 0..(MAX_REVALIDATED + 36) {
            let query = NewsQuery::Everything {
                query: format!("search {}", i),
            };
            client.fetch(&query).await.unwrap();
        }

        assert_eq!(client.responses.read().await.len(), MAX_REVALIDATED);
    }

    #[tokio::test]
    async fn test_eviction_keeps_most_recent_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let client =
            NewsApiClient::with_api_key(&config_for(&server, 15), Some("k".to_string())).unwrap();

        for i in 0..=MAX_REVALIDATED {
            let query = NewsQuery::Everything {
                query: format!("search {}", i),
            };
            client.fetch(&query).await.unwrap();
        }

        let responses = client.responses.read().await;
        assert!(!responses.contains_key(&NewsQuery::Everything {
            query: "search 0".to_string()
        }));
        assert!(responses.contains_key(&NewsQuery::Everything {
            query: format!("search {}", MAX_REVALIDATED)
        }));
    }

    #[test]
    fn test_huge_window_saturates() {
        let config = NewsApiConfig {
            revalidate_minutes: u64::MAX,
            ..NewsApiConfig::default()
        };

        let client = NewsApiClient::with_api_key(&config, None).unwrap();

        assert_eq!(client.revalidate, Duration::from_secs(u64::MAX));
    }
}
