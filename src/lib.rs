//! Global News Hub - a headline aggregator over a hosted news API
//!
//! Articles are fetched from the provider, normalized into a stable schema
//! and served as category-filterable, searchable pages. Free-text searches
//! can be condensed into keywords by a generative model before they reach
//! the provider.

pub mod categories;
pub mod config;
pub mod error;
pub mod models;
pub mod news_api;
pub mod normalizer;
pub mod placeholders;
pub mod refiner;
pub mod repository;
pub mod routes;
pub mod submission;
