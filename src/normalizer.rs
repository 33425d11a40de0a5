//! Boundary between the provider's loosely-typed payload and [`Article`].
//!
//! Every optional upstream field is resolved here; nothing past this module
//! sees a `RawArticle`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Article, ArticleStatus};
use crate::placeholders::placeholder_for;

/// Title the provider substitutes for withdrawn stories.
pub const REMOVED_SENTINEL: &str = "[Removed]";

const FALLBACK_TITLE: &str = "Untitled";
const FALLBACK_CONTENT: &str = "No Content";
const FALLBACK_EXCERPT: &str = "No Excerpt";
const FALLBACK_AUTHOR: &str = "Unknown Author";
const FALLBACK_SOURCE: &str = "General";
const LIVE_FEED_LOCATION: &str = "Global";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());
static TRUNCATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\+\d+ chars\]$").unwrap());

/// Envelope returned by both provider endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RawArticle {
    fn image(&self) -> Option<&str> {
        non_blank(self.url_to_image.as_deref())
    }

    /// The story link, when it is an `http` or `https` URL.
    fn link(&self) -> Option<&str> {
        non_blank(self.url.as_deref()).filter(|u| {
            reqwest::Url::parse(u).is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"))
        })
    }

    fn is_removed(&self) -> bool {
        self.title.as_deref().map(str::trim) == Some(REMOVED_SENTINEL)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Lowercase, collapse whitespace into hyphens, drop anything that is not
/// an ASCII word character or a hyphen.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let hyphenated = WHITESPACE.replace_all(&lowered, "-");
    NON_SLUG.replace_all(&hyphenated, "").into_owned()
}

/// Remove the provider's trailing `[+N chars]` marker, leaving the rest untouched.
pub fn strip_truncation_marker(content: &str) -> String {
    TRUNCATION_MARKER.replace(content, "").into_owned()
}

/// Map one provider record to an [`Article`].
///
/// `index` is the record's position in its batch and selects the placeholder;
/// `category` is the editorial category the batch was requested under.
/// A record without a parseable `publishedAt` is rejected.
pub fn normalize(raw: &RawArticle, index: usize, category: &str) -> Result<Article> {
    let published_at = raw
        .published_at
        .as_deref()
        .ok_or_else(|| Error::MalformedRecord("missing publishedAt".to_string()))?;
    let date: DateTime<Utc> = DateTime::parse_from_rfc3339(published_at.trim())
        .map_err(|e| Error::MalformedRecord(format!("bad publishedAt '{}': {}", published_at, e)))?
        .with_timezone(&Utc);

    let title = raw.title.as_deref();
    let slug = format!(
        "{}-{}",
        slugify(title.unwrap_or("untitled")),
        date.timestamp_millis()
    );

    // The hint always follows the positional placeholder, even when the
    // provider supplied its own image.
    let placeholder = placeholder_for(index);
    let image_url = raw
        .image()
        .map(str::to_string)
        .unwrap_or_else(|| placeholder.image_url.to_string());

    let content = raw
        .content
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(strip_truncation_marker)
        .unwrap_or_else(|| FALLBACK_CONTENT.to_string());

    let excerpt = raw
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_EXCERPT.to_string());

    let source_name = raw
        .source
        .as_ref()
        .and_then(|s| non_blank(s.name.as_deref()))
        .unwrap_or(FALLBACK_SOURCE);

    Ok(Article {
        id: slug.clone(),
        slug,
        title: title.unwrap_or(FALLBACK_TITLE).to_string(),
        content,
        excerpt,
        image_url,
        image_hint: placeholder.image_hint.to_string(),
        category: category.to_string(),
        source_name: source_name.to_string(),
        author: non_blank(raw.author.as_deref())
            .unwrap_or(FALLBACK_AUTHOR)
            .to_string(),
        location: LIVE_FEED_LOCATION.to_string(),
        date,
        status: ArticleStatus::Published,
        url: raw.link().map(str::to_string),
    })
}

/// Normalize a provider batch, keeping upstream order and dropping records
/// that are withdrawn, unlinked, image-less or malformed.
pub fn normalize_batch(raws: &[RawArticle], category: &str) -> Vec<Article> {
    let mut articles = Vec::with_capacity(raws.len());
    let mut dropped = 0usize;

    for (index, raw) in raws.iter().enumerate() {
        if raw.is_removed() {
            debug!("Skipping withdrawn record at position {}", index);
            dropped += 1;
            continue;
        }
        if raw.link().is_none() {
            debug!("Skipping record without url at position {}", index);
            dropped += 1;
            continue;
        }
        if raw.image().is_none() {
            debug!("Skipping record without image at position {}", index);
            dropped += 1;
            continue;
        }

        match normalize(raw, index, category) {
            Ok(article) => articles.push(article),
            Err(e) => {
                warn!("Dropping record at position {}: {}", index, e);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        debug!("Normalized {} records, dropped {}", articles.len(), dropped);
    }
    articles
}
