//! Note service
//!
//! Private notes addressed by a globally unique slug. Every read, edit and
//! removal goes through the ownership gate; the list only ever shows the
//! caller's own notes.

use crate::db::is_unique_violation;
use crate::db::repositories::NoteRepository;
use crate::models::{Identity, Note, NoteDraft, NoteInput};
use crate::services::access::{authorize, require_user};
use crate::services::error::ServiceError;
use crate::services::validation::ContentPolicy;
use anyhow::Context;
use std::sync::Arc;

/// Note service
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
    policy: Arc<ContentPolicy>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>, policy: Arc<ContentPolicy>) -> Self {
        Self { repo, policy }
    }

    /// Create a note owned by the caller
    ///
    /// A blank slug is derived from the title.
    pub async fn create(&self, identity: &Identity, input: NoteInput) -> Result<Note, ServiceError> {
        let author = require_user(identity)?;
        let draft = self.validate(&input, None).await?;

        let note = match self.repo.create(author.id, &draft).await {
            Ok(note) => note,
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::field(self.policy.duplicate_slug(&draft.slug)));
            }
            Err(e) => return Err(e.context("Failed to create note").into()),
        };
        tracing::info!(note_id = note.id, slug = %note.slug, user_id = author.id, "note created");
        Ok(note)
    }

    /// Load one of the caller's notes by slug
    pub async fn get_for_action(&self, slug: &str, identity: &Identity) -> Result<Note, ServiceError> {
        let found = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get note by slug")?;
        authorize(found, identity, "note", slug)
    }

    /// Load one of the caller's notes by ID
    pub async fn get_by_id_for_action(&self, id: i64, identity: &Identity) -> Result<Note, ServiceError> {
        let found = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get note by ID")?;
        authorize(found, identity, "note", id)
    }

    /// Overwrite one of the caller's notes
    ///
    /// A blank slug is re-derived from the new title. The note's current slug
    /// does not count as a collision.
    pub async fn update(
        &self,
        slug: &str,
        identity: &Identity,
        input: NoteInput,
    ) -> Result<Note, ServiceError> {
        let note = self.get_for_action(slug, identity).await?;
        let draft = self.validate(&input, Some(note.id)).await?;

        match self.repo.update(note.id, &draft).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::field(self.policy.duplicate_slug(&draft.slug)));
            }
            Err(e) => return Err(e.context("Failed to update note").into()),
        }
        tracing::info!(note_id = note.id, slug = %draft.slug, "note updated");

        Ok(Note {
            title: draft.title,
            text: draft.text,
            slug: draft.slug,
            ..note
        })
    }

    /// Remove one of the caller's notes
    pub async fn delete(&self, slug: &str, identity: &Identity) -> Result<Note, ServiceError> {
        let note = self.get_for_action(slug, identity).await?;
        self.repo
            .delete(note.id)
            .await
            .context("Failed to delete note")?;
        tracing::info!(note_id = note.id, slug = %note.slug, "note deleted");
        Ok(note)
    }

    /// The caller's notes. Anonymous callers own nothing.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Note>, ServiceError> {
        let Some(user_id) = identity.user_id() else {
            return Ok(Vec::new());
        };
        let notes = self
            .repo
            .list_by_author(user_id)
            .await
            .context("Failed to list notes")?;
        Ok(notes)
    }

    /// Total number of stored notes
    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.repo.count().await.context("Failed to count notes")?)
    }

    async fn validate(&self, input: &NoteInput, current_id: Option<i64>) -> Result<NoteDraft, ServiceError> {
        let draft = self.policy.check_note(input).map_err(|errors| {
            tracing::warn!(fields = errors.len(), "note rejected by validation");
            ServiceError::Validation(errors)
        })?;

        if self
            .repo
            .slug_exists(&draft.slug, current_id)
            .await
            .context("Failed to check slug")?
        {
            tracing::warn!(slug = %draft.slug, "note rejected: duplicate slug");
            return Err(ServiceError::field(self.policy.duplicate_slug(&draft.slug)));
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNoteRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use crate::services::error::ValidationKind;
    use crate::services::slug::slugify;
    use proptest::prelude::*;

    struct TestContext {
        service: NoteService,
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
            .create(&User::new("Мистер Автор".to_string(), "hash".to_string()))
            .await
            .unwrap();
        let reader = users
            .create(&User::new("Мистер Читатель".to_string(), "hash".to_string()))
            .await
            .unwrap();

        TestContext {
            service: NoteService::new(
                SqlxNoteRepository::boxed(pool),
                Arc::new(ContentPolicy::default()),
            ),
            author: author.into(),
            reader: reader.into(),
        }
    }

    async fn add(ctx: &TestContext, slug: &str) -> Note {
        ctx.service
            .create(&ctx.author, NoteInput::new("Заголовок", "Текст", slug))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_round_trip() {
        let ctx = setup().await;
        let created = add(&ctx, "note-slug").await;

        let fetched = ctx
            .service
            .get_by_id_for_action(created.id, &ctx.author)
            .await
            .unwrap();
        assert_eq!(fetched.title, "Заголовок");
        assert_eq!(fetched.text, "Текст");
        assert_eq!(fetched.slug, "note-slug");
        assert_eq!(Some(fetched.author_id), ctx.author.user_id());
    }

    #[tokio::test]
    async fn test_create_without_slug_uses_title() {
        let ctx = setup().await;
        let note = ctx
            .service
            .create(&ctx.author, NoteInput::new("Новый заголовок", "Новый текст", ""))
            .await
            .unwrap();
        assert_eq!(note.slug, slugify("Новый заголовок"));
        assert_eq!(note.slug, "novyij-zagolovok");
    }

    #[tokio::test]
    async fn test_anonymous_create_is_unauthenticated() {
        let ctx = setup().await;
        let err = ctx
            .service
            .create(&Identity::Anonymous, NoteInput::new("Заголовок", "Текст", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
        assert_eq!(ctx.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let ctx = setup().await;
        add(&ctx, "note-slug").await;

        let err = ctx
            .service
            .create(&ctx.reader, NoteInput::new("Другой", "Текст", "note-slug"))
            .await
            .unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "slug");
        assert_eq!(errors[0].kind, ValidationKind::DuplicateSlug);
        assert_eq!(
            errors[0].message,
            "note-slug - такой slug уже существует, придумайте уникальное значение!"
        );
        assert_eq!(ctx.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_author_can_edit() {
        let ctx = setup().await;
        let note = add(&ctx, "note-slug").await;

        let updated = ctx
            .service
            .update(
                "note-slug",
                &ctx.author,
                NoteInput::new("Новый заголовок", "Новый текст", "new_slug"),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, note.id);

        let stored = ctx.service.get_by_id_for_action(note.id, &ctx.author).await.unwrap();
        assert_eq!(stored.title, "Новый заголовок");
        assert_eq!(stored.text, "Новый текст");
        assert_eq!(stored.slug, "new_slug");
    }

    #[tokio::test]
    async fn test_edit_keeping_own_slug() {
        let ctx = setup().await;
        add(&ctx, "note-slug").await;

        let updated = ctx
            .service
            .update("note-slug", &ctx.author, NoteInput::new("Другой", "Текст", "note-slug"))
            .await
            .unwrap();
        assert_eq!(updated.slug, "note-slug");
        assert_eq!(updated.title, "Другой");
    }

    #[tokio::test]
    async fn test_edit_blank_slug_rederived() {
        let ctx = setup().await;
        add(&ctx, "note-slug").await;

        let updated = ctx
            .service
            .update("note-slug", &ctx.author, NoteInput::new("Новый заголовок", "Текст", ""))
            .await
            .unwrap();
        assert_eq!(updated.slug, "novyij-zagolovok");
    }

    #[tokio::test]
    async fn test_edit_into_taken_slug_rejected() {
        let ctx = setup().await;
        add(&ctx, "first").await;
        add(&ctx, "second").await;

        let err = ctx
            .service
            .update("second", &ctx.author, NoteInput::new("Заголовок", "Текст", "first"))
            .await
            .unwrap_err();
        assert_eq!(err.field_errors()[0].kind, ValidationKind::DuplicateSlug);
        assert!(ctx.service.get_for_action("second", &ctx.author).await.is_ok());
    }

    #[tokio::test]
    async fn test_reader_gets_not_found() {
        let ctx = setup().await;
        let note = add(&ctx, "note-slug").await;

        for result in [
            ctx.service.get_for_action("note-slug", &ctx.reader).await,
            ctx.service
                .update("note-slug", &ctx.reader, NoteInput::new("Взлом", "Взлом", ""))
                .await,
            ctx.service.delete("note-slug", &ctx.reader).await,
            ctx.service.get_for_action("missing", &ctx.author).await,
        ] {
            assert!(matches!(result, Err(ServiceError::NotFound)));
        }

        let stored = ctx.service.get_by_id_for_action(note.id, &ctx.author).await.unwrap();
        assert_eq!(stored.text, "Текст");
        assert_eq!(ctx.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_author_can_delete() {
        let ctx = setup().await;
        add(&ctx, "note-slug").await;

        ctx.service.delete("note-slug", &ctx.author).await.unwrap();
        assert_eq!(ctx.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_scoped_to_caller() {
        let ctx = setup().await;
        add(&ctx, "mine-1").await;
        add(&ctx, "mine-2").await;
        ctx.service
            .create(&ctx.reader, NoteInput::new("Чужая", "Текст", "theirs"))
            .await
            .unwrap();

        let mine = ctx.service.list(&ctx.author).await.unwrap();
        let slugs: Vec<_> = mine.iter().map(|n| n.slug.as_str()).collect();
        assert_eq!(slugs, vec!["mine-1", "mine-2"]);

        assert_eq!(ctx.service.list(&ctx.reader).await.unwrap().len(), 1);
        assert!(ctx.service.list(&Identity::Anonymous).await.unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Every listed note belongs to the caller.
        #[test]
        fn list_only_contains_own_notes(owners in prop::collection::vec(any::<bool>(), 0..8)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let ctx = setup().await;
                for (i, by_author) in owners.iter().enumerate() {
                    let identity = if *by_author { &ctx.author } else { &ctx.reader };
                    ctx.service
                        .create(identity, NoteInput::new("Заголовок", "Текст", format!("n-{}", i)))
                        .await
                        .unwrap();
                }

                let listed = ctx.service.list(&ctx.author).await.unwrap();
                let expected = owners.iter().filter(|b| **b).count();
                prop_assert_eq!(listed.len(), expected);
                prop_assert!(listed.iter().all(|n| ctx.author.owns(n.author_id)));
                Ok(())
            });
            result?;
        }

        /// Notes created with a blank slug get the truncated slugified title.
        #[test]
        fn blank_slug_is_derived_from_title(title in "[а-яa-z][а-яa-z ]{0,40}[а-яa-z]") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let ctx = setup().await;
                if let Ok(note) = ctx
                    .service
                    .create(&ctx.author, NoteInput::new(title.clone(), "Текст", ""))
                    .await
                {
                    let expected: String = slugify(&title).chars().take(100).collect();
                    prop_assert_eq!(note.slug, expected);
                }
                Ok(())
            });
            result?;
        }
    }
}
