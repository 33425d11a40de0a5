use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::error::Error;
use crate::models::{Article, ArticleFilter, ArticleStatus};
use crate::refiner::QueryRefiner;
use crate::repository::ArticleRepository;
use crate::submission::{FormState, SubmissionForm, SUBMISSION_DISABLED};

const HIGHLIGHT_COUNT: usize = 5;

pub struct AppState {
    pub repository: Arc<ArticleRepository>,
    pub refiner: Option<QueryRefiner>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/news/:slug", get(article))
        .route("/api/articles", get(api_articles))
        .route("/api/articles/:slug", get(api_article))
        .route("/api/categories", get(api_categories))
        .route("/admin", get(admin))
        .route("/admin/approve", post(approve))
        .route("/admin/reject", post(reject))
        .route("/submit-news", post(submit_news))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub search: String,
    pub all_active: bool,
    pub categories_disabled: bool,
    pub categories: Vec<CategoryLink>,
    pub highlights: Vec<Article>,
    pub articles: Vec<Article>,
}

pub struct CategoryLink {
    pub name: &'static str,
    pub href: String,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub article: Article,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub pending: Vec<Article>,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModerationForm {
    pub id: String,
}

/// Run a non-empty search through the refiner. A failed refinement falls
/// back to the raw text so the page still renders.
async fn effective_search(refiner: Option<&QueryRefiner>, search: &str) -> Option<String> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    let Some(refiner) = refiner else {
        return Some(search.to_string());
    };
    match refiner.refine(search).await {
        Ok(refined) => Some(refined),
        Err(e) => {
            warn!("Query refinement failed, searching raw text: {}", e);
            Some(search.to_string())
        }
    }
}

async fn filter_for(state: &AppState, query: &ListQuery) -> ArticleFilter {
    let search = match query.search.as_deref() {
        Some(s) => effective_search(state.refiner.as_ref(), s).await,
        None => None,
    };
    ArticleFilter {
        status: None,
        search_term: search,
        category: query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    }
}

fn category_links(selected: Option<&str>) -> Vec<CategoryLink> {
    crate::categories::list_categories()
        .into_iter()
        .map(|name| CategoryLink {
            name,
            href: format!("/?category={}", name),
            active: selected.is_some_and(|s| s.eq_ignore_ascii_case(name)),
        })
        .collect()
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = filter_for(&state, &query).await;
    let mut articles = state.repository.list_articles(&filter).await;

    let search = query.search.unwrap_or_default().trim().to_string();
    let selected = filter.category.as_deref();
    let split = articles.len().min(HIGHLIGHT_COUNT);
    let rest = articles.split_off(split);

    Ok(HtmlTemplate(IndexTemplate {
        all_active: selected.is_none() && search.is_empty(),
        categories_disabled: !search.is_empty(),
        categories: category_links(selected),
        search,
        highlights: articles,
        articles: rest,
    }))
}

pub async fn article(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let article = state.repository.find_by_slug(&slug).await;
    let status = if article.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    Ok((status, HtmlTemplate(ArticleTemplate { article })))
}

pub async fn api_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let status = match query
        .status
        .as_deref()
        .map(str::parse::<ArticleStatus>)
        .transpose()
    {
        Ok(status) => status,
        Err(e) => return Ok((StatusCode::BAD_REQUEST, e).into_response()),
    };

    let mut filter = filter_for(&state, &query).await;
    filter.status = status;
    let articles = state.repository.list_articles(&filter).await;
    Ok(Json(articles).into_response())
}

pub async fn api_article(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.repository.find_by_slug(&slug).await))
}

pub async fn api_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.repository.list_categories())
}

pub async fn admin(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let filter = ArticleFilter {
        status: Some(ArticleStatus::Pending),
        ..ArticleFilter::default()
    };
    let pending = state.repository.list_articles(&filter).await;
    Ok(HtmlTemplate(AdminTemplate { pending }))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ModerationForm>,
) -> Result<impl IntoResponse, AppError> {
    state
        .repository
        .update_article_status(&form.id, ArticleStatus::Published)
        .await;
    Ok(Redirect::to("/admin"))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ModerationForm>,
) -> Result<impl IntoResponse, AppError> {
    state
        .repository
        .update_article_status(&form.id, ArticleStatus::Rejected)
        .await;
    Ok(Redirect::to("/admin"))
}

pub async fn submit_news(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubmissionForm>,
) -> Result<impl IntoResponse, AppError> {
    match form.validate() {
        Ok(()) => {}
        Err(Error::Validation(errors)) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(FormState::invalid(errors)),
            ))
        }
        Err(e) => return Err(e.into()),
    }

    let state_message = match state.repository.add_article(&form).await {
        Some(article) => FormState::message(format!(
            "Article '{}' submitted for review.",
            article.title
        )),
        None => FormState::message(SUBMISSION_DISABLED),
    };
    Ok((StatusCode::OK, Json(state_message)))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
