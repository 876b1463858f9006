//! Comment service
//!
//! Comments hang off a news item and belong to their author. Only the author
//! can load a comment for editing or deletion.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{Comment, CommentInput, CommentWithAuthor, Identity};
use crate::services::access::{authorize, require_user};
use crate::services::error::ServiceError;
use crate::services::validation::ContentPolicy;
use anyhow::Context;
use std::sync::Arc;

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
    policy: Arc<ContentPolicy>,
}

impl CommentService {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        news_repo: Arc<dyn NewsRepository>,
        policy: Arc<ContentPolicy>,
    ) -> Self {
        Self {
            repo,
            news_repo,
            policy,
        }
    }

    /// Post a comment under a news item as the calling user
    pub async fn create(
        &self,
        identity: &Identity,
        news_id: i64,
        input: CommentInput,
    ) -> Result<Comment, ServiceError> {
        let author = require_user(identity)?;

        if self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news")?
            .is_none()
        {
            return Err(ServiceError::NotFound);
        }

        let text = self.policy.check_comment(&input).map_err(|errors| {
            tracing::warn!(news_id, user_id = author.id, "comment rejected by validation");
            ServiceError::Validation(errors)
        })?;

        let comment = self
            .repo
            .create(&Comment::new(news_id, author.id, text))
            .await
            .context("Failed to create comment")?;
        tracing::info!(comment_id = comment.id, news_id, user_id = author.id, "comment created");
        Ok(comment)
    }

    /// Load a comment the caller wrote
    pub async fn get_for_action(&self, id: i64, identity: &Identity) -> Result<Comment, ServiceError> {
        let found = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get comment")?;
        authorize(found, identity, "comment", id)
    }

    /// Replace the text of the caller's comment
    pub async fn update(
        &self,
        id: i64,
        identity: &Identity,
        input: CommentInput,
    ) -> Result<Comment, ServiceError> {
        let comment = self.get_for_action(id, identity).await?;
        let text = self
            .policy
            .check_comment(&input)
            .map_err(ServiceError::Validation)?;

        self.repo
            .update_text(comment.id, &text)
            .await
            .context("Failed to update comment")?;
        tracing::info!(comment_id = comment.id, "comment updated");
        Ok(Comment { text, ..comment })
    }

    /// Remove the caller's comment, returning what was removed
    pub async fn delete(&self, id: i64, identity: &Identity) -> Result<Comment, ServiceError> {
        let comment = self.get_for_action(id, identity).await?;
        self.repo
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        tracing::info!(comment_id = comment.id, "comment deleted");
        Ok(comment)
    }

    /// All comments of a news item, oldest first
    pub async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>, ServiceError> {
        let comments = self
            .repo
            .list_by_news(news_id)
            .await
            .context("Failed to list comments")?;
        Ok(comments)
    }

    /// Total number of stored comments
    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await.context("Failed to count comments")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateNewsInput, User};
    use crate::services::error::ValidationKind;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    struct TestContext {
        service: CommentService,
        news_id: i64,
        author: Identity,
        reader: Identity,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("Автор комментария".to_string(), "hash".to_string()))
            .await
            .unwrap();
        let reader = users
            .create(&User::new("Читатель".to_string(), "hash".to_string()))
            .await
            .unwrap();

        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let news_id = news_repo
            .create(&CreateNewsInput::new(
                "Заголовок",
                "Текст",
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            ))
            .await
            .unwrap()
            .id;

        TestContext {
            service: CommentService::new(
                SqlxCommentRepository::boxed(pool),
                news_repo,
                Arc::new(ContentPolicy::default()),
            ),
            news_id,
            author: author.into(),
            reader: reader.into(),
        }
    }

    async fn post(ctx: &TestContext, text: &str) -> Comment {
        ctx.service
            .create(&ctx.author, ctx.news_id, CommentInput::new(text))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_author() {
        let ctx = setup().await;
        let comment = post(&ctx, "Текст комментария").await;
        assert_eq!(Some(comment.author_id), ctx.author.user_id());
        assert_eq!(comment.news_id, ctx.news_id);
        assert_eq!(comment.text, "Текст комментария");
    }

    #[tokio::test]
    async fn test_anonymous_create_is_unauthenticated() {
        let ctx = setup().await;
        let err = ctx
            .service
            .create(&Identity::Anonymous, ctx.news_id, CommentInput::new("Текст"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
        assert_eq!(ctx.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_on_missing_news_is_not_found() {
        let ctx = setup().await;
        let err = ctx
            .service
            .create(&ctx.author, ctx.news_id + 1, CommentInput::new("Текст"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_banned_word_persists_nothing() {
        let ctx = setup().await;
        let err = ctx
            .service
            .create(
                &ctx.author,
                ctx.news_id,
                CommentInput::new("Какой-то текст, негодяй, еще текст"),
            )
            .await
            .unwrap_err();

        let errors = err.field_errors();
        assert_eq!(errors[0].field, "text");
        assert_eq!(errors[0].kind, ValidationKind::BannedWord);
        assert_eq!(errors[0].message, "Не ругайтесь!");
        assert_eq!(ctx.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_author_can_edit() {
        let ctx = setup().await;
        let comment = post(&ctx, "Текст комментария").await;

        let updated = ctx
            .service
            .update(comment.id, &ctx.author, CommentInput::new("Обновленный текст"))
            .await
            .unwrap();
        assert_eq!(updated.text, "Обновленный текст");

        let stored = ctx.service.get_for_action(comment.id, &ctx.author).await.unwrap();
        assert_eq!(stored.text, "Обновленный текст");
    }

    #[tokio::test]
    async fn test_edit_with_banned_word_keeps_old_text() {
        let ctx = setup().await;
        let comment = post(&ctx, "Текст комментария").await;

        let err = ctx
            .service
            .update(comment.id, &ctx.author, CommentInput::new("редиска"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = ctx.service.get_for_action(comment.id, &ctx.author).await.unwrap();
        assert_eq!(stored.text, "Текст комментария");
    }

    #[tokio::test]
    async fn test_reader_cannot_edit_or_delete() {
        let ctx = setup().await;
        let comment = post(&ctx, "Текст комментария").await;

        let err = ctx
            .service
            .update(comment.id, &ctx.reader, CommentInput::new("Обновленный текст"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        let err = ctx.service.delete(comment.id, &ctx.reader).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        let stored = ctx.service.get_for_action(comment.id, &ctx.author).await.unwrap();
        assert_eq!(stored.text, "Текст комментария");
        assert_eq!(ctx.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_author_can_delete() {
        let ctx = setup().await;
        let comment = post(&ctx, "Текст комментария").await;

        let deleted = ctx.service.delete(comment.id, &ctx.author).await.unwrap();
        assert_eq!(deleted.news_id, ctx.news_id);
        assert_eq!(ctx.service.count().await.unwrap(), 0);

        let err = ctx.service.delete(comment.id, &ctx.author).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_list_for_news_is_chronological() {
        let ctx = setup().await;
        for text in ["первый", "второй", "третий"] {
            post(&ctx, text).await;
        }

        let comments = ctx.service.list_for_news(ctx.news_id).await.unwrap();
        assert_eq!(comments.len(), 3);
        assert!(comments
            .windows(2)
            .all(|w| w[0].comment.created_at <= w[1].comment.created_at));
        assert_eq!(comments[0].comment.text, "первый");
        assert_eq!(comments[0].author, "Автор комментария");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Deleting by a foreign or unknown id never changes the count.
        #[test]
        fn foreign_or_missing_delete_keeps_count(n in 1usize..5, bogus in 1000i64..2000) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let ctx = setup().await;
                let mut ids = Vec::new();
                for i in 0..n {
                    ids.push(post(&ctx, &format!("comment {}", i)).await.id);
                }

                for id in &ids {
                    let err = ctx.service.delete(*id, &ctx.reader).await.unwrap_err();
                    prop_assert!(matches!(err, ServiceError::NotFound));
                    let err = ctx.service.delete(*id, &Identity::Anonymous).await.unwrap_err();
                    prop_assert!(matches!(err, ServiceError::NotFound));
                }
                let err = ctx.service.delete(bogus, &ctx.author).await.unwrap_err();
                prop_assert!(matches!(err, ServiceError::NotFound));

                prop_assert_eq!(ctx.service.count().await.unwrap(), n as i64);
                Ok(())
            });
            result?;
        }
    }
}
