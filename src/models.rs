use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NOT_FOUND_TITLE: &str = "Article not found";
pub const NOT_FOUND_CATEGORY: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Published,
    Pending,
    Rejected,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Published => "published",
            ArticleStatus::Pending => "pending",
            ArticleStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "published" => Ok(ArticleStatus::Published),
            "pending" => Ok(ArticleStatus::Pending),
            "rejected" => Ok(ArticleStatus::Rejected),
            other => Err(format!("unknown article status '{}'", other)),
        }
    }
}

/// Canonical news item. Instances are never edited in place; the repository
/// replaces its whole set on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Same value as `slug` for live-feed records
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    pub image_hint: String,
    /// Editorial taxonomy (one of the catalog categories, or `Error` for the sentinel)
    pub category: String,
    /// Name of the upstream outlet that published the story
    pub source_name: String,
    pub author: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub status: ArticleStatus,
    pub url: Option<String>,
}

impl Article {
    /// Placeholder returned when a slug cannot be resolved.
    pub fn not_found(slug: &str) -> Self {
        let placeholder = crate::placeholders::placeholder_for(0);
        Self {
            id: slug.to_string(),
            slug: slug.to_string(),
            title: NOT_FOUND_TITLE.to_string(),
            content: "The article you are looking for could not be found. It may have dropped out of the latest headlines.".to_string(),
            excerpt: "This article could not be found.".to_string(),
            image_url: placeholder.image_url.to_string(),
            image_hint: placeholder.image_hint.to_string(),
            category: NOT_FOUND_CATEGORY.to_string(),
            source_name: "System".to_string(),
            author: "System".to_string(),
            location: "Global".to_string(),
            date: Utc::now(),
            status: ArticleStatus::Published,
            url: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category == NOT_FOUND_CATEGORY && self.title == NOT_FOUND_TITLE
    }

    /// e.g. "January 1, 2024"
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    pub fn href(&self) -> String {
        format!("/news/{}", self.slug)
    }

    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    pub fn origin_link(&self) -> &str {
        self.url.as_deref().unwrap_or("#")
    }
}

/// Options accepted by `ArticleRepository::list_articles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub search_term: Option<String>,
    pub category: Option<String>,
}

impl ArticleFilter {
    pub fn published() -> Self {
        Self {
            status: Some(ArticleStatus::Published),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ArticleStatus::Published,
            ArticleStatus::Pending,
            ArticleStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ArticleStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Pending".parse::<ArticleStatus>(), Ok(ArticleStatus::Pending));
        assert!("archived".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn test_not_found_sentinel() {
        let article = Article::not_found("missing-slug");
        assert_eq!(article.title, "Article not found");
        assert_eq!(article.category, "Error");
        assert_eq!(article.author, "System");
        assert_eq!(article.slug, "missing-slug");
        assert!(article.is_not_found());
    }

    #[test]
    fn test_display_date() {
        let mut article = Article::not_found("x");
        article.date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(article.display_date(), "January 1, 2024");
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let article = Article::not_found("x");
        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("sourceName").is_some());
        assert_eq!(json["status"], "published");
    }

    #[test]
    fn test_origin_link_defaults_to_anchor() {
        let mut article = Article::not_found("x");
        assert_eq!(article.origin_link(), "#");
        article.url = Some("https://example.com/a".to_string());
        assert_eq!(article.origin_link(), "https://example.com/a");
    }
}
