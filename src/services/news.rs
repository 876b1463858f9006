//! News service
//!
//! The public feed. News items are not owned, so there is no access gate
//! here; comments attached to an item are handled by `CommentService`.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{CommentWithAuthor, CreateNewsInput, ListParams, News, PagedResult};
use crate::services::error::{FieldError, ServiceError};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Maximum news title length in characters
pub const NEWS_TITLE_MAX_LENGTH: usize = 50;

/// A news item with its comments in chronological order
#[derive(Debug, Clone, Serialize)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
}

/// News service
pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    home_page_size: u32,
}

impl NewsService {
    pub fn new(
        news_repo: Arc<dyn NewsRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        home_page_size: u32,
    ) -> Self {
        Self {
            news_repo,
            comment_repo,
            home_page_size,
        }
    }

    /// Publish a news item
    pub async fn create(&self, input: CreateNewsInput) -> Result<News, ServiceError> {
        let title = input.title.trim();
        let text = input.text.trim();

        let mut errors = Vec::new();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.push(FieldError::required("title"));
        } else if title_len > NEWS_TITLE_MAX_LENGTH {
            errors.push(FieldError::too_long("title", NEWS_TITLE_MAX_LENGTH, title_len));
        }
        if text.is_empty() {
            errors.push(FieldError::required("text"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let news = self
            .news_repo
            .create(&CreateNewsInput::new(title, text, input.date))
            .await
            .context("Failed to create news")?;
        tracing::info!(news_id = news.id, "news published");
        Ok(news)
    }

    /// Get a news item by ID
    pub async fn get(&self, id: i64) -> Result<News, ServiceError> {
        self.news_repo
            .get_by_id(id)
            .await
            .context("Failed to get news")?
            .ok_or(ServiceError::NotFound)
    }

    /// First page of the feed
    pub async fn home(&self) -> Result<PagedResult<News>, ServiceError> {
        self.list(1).await
    }

    /// One page of the feed, newest first, `home_page_size` items per page
    pub async fn list(&self, page: u32) -> Result<PagedResult<News>, ServiceError> {
        let params = ListParams::exact(page, self.home_page_size);
        let items = self
            .news_repo
            .list(&params)
            .await
            .context("Failed to list news")?;
        let total = self.news_repo.count().await.context("Failed to count news")?;
        Ok(PagedResult::new(items, total, &params))
    }

    /// A news item together with its comments
    pub async fn detail(&self, id: i64) -> Result<NewsDetail, ServiceError> {
        let news = self.get(id).await?;
        let comments = self
            .comment_repo
            .list_by_news(news.id)
            .await
            .context("Failed to list comments")?;
        Ok(NewsDetail { news, comments })
    }
}
