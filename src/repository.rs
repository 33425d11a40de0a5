use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::categories::{display_category, list_categories, provider_category};
use crate::error::{Error, Result};
use crate::models::{Article, ArticleFilter, ArticleStatus};
use crate::news_api::{NewsApiClient, NewsQuery};
use crate::normalizer::normalize_batch;
use crate::submission::SubmissionForm;

/// Owns the most recent article set and answers queries over it.
///
/// The set is an immutable snapshot swapped wholesale after each successful
/// fetch; readers clone the `Arc` and never observe a partial update.
pub struct ArticleRepository {
    api: NewsApiClient,
    cache: RwLock<Arc<Vec<Article>>>,
}

impl ArticleRepository {
    pub fn new(api: NewsApiClient) -> Self {
        Self {
            api,
            cache: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Current snapshot, without contacting the provider.
    pub async fn cached(&self) -> Arc<Vec<Article>> {
        self.cache.read().await.clone()
    }

    /// Fetch a fresh list from the provider. Provider failures are logged
    /// and surface as an empty list.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        if let Some(status) = filter.status {
            if status != ArticleStatus::Published {
                return Vec::new();
            }
        }

        match self.fetch(filter).await {
            Ok(articles) => articles,
            Err(e) => {
                error!("Failed to fetch articles: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let search = filter
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let (query, category) = match search {
            Some(term) => (
                NewsQuery::Everything {
                    query: term.to_string(),
                },
                "General".to_string(),
            ),
            None => {
                let category = provider_category(filter.category.as_deref());
                let display = display_category(&category);
                (NewsQuery::TopHeadlines { category }, display)
            }
        };

        let raws = self.api.fetch(&query).await?;
        let articles = normalize_batch(&raws, &category);
        info!(
            "Loaded {} of {} provider records for {:?}",
            articles.len(),
            raws.len(),
            query
        );

        *self.cache.write().await = Arc::new(articles.clone());
        Ok(articles)
    }

    async fn lookup(&self, slug: &str) -> Result<Article> {
        self.cached()
            .await
            .iter()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }

    /// Resolve a slug against the cache, loading the default list once if
    /// the cache is empty. Unknown slugs yield [`Article::not_found`].
    pub async fn find_by_slug(&self, slug: &str) -> Article {
        if self.cached().await.is_empty() {
            self.list_articles(&ArticleFilter::default()).await;
        }

        match self.lookup(slug).await {
            Ok(article) => article,
            Err(e) => {
                warn!("{}", e);
                Article::not_found(slug)
            }
        }
    }

    pub fn list_categories(&self) -> Vec<&'static str> {
        list_categories()
    }

    /// Submissions are not accepted while articles come from the live feed.
    pub async fn add_article(&self, form: &SubmissionForm) -> Option<Article> {
        warn!(
            "add_article is disabled when using live news data (title: '{}')",
            form.title
        );
        None
    }

    /// Moderation is not available while articles come from the live feed.
    pub async fn update_article_status(&self, id: &str, status: ArticleStatus) -> Option<Article> {
        warn!(
            "update_article_status is disabled when using live news data ({} -> {})",
            id, status
        );
        None
    }
}
