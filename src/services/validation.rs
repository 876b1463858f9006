//! Content validation policy
//!
//! Field rules for comments, notes and signup forms. Checks here are pure;
//! anything that needs the database (slug and username uniqueness) lives in
//! the owning service.

use crate::config::{ModerationConfig, NotesConfig};
use crate::models::{CommentInput, NoteDraft, NoteInput, SignupInput};
use crate::services::error::{FieldError, ValidationKind};
use crate::services::slug::{is_valid_slug, slugify, truncate_slug};
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum note title length in characters
pub const NOTE_TITLE_MAX_LENGTH: usize = 100;

/// Maximum username length in characters
pub const USERNAME_MAX_LENGTH: usize = 150;

static USERNAME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid regex"));

const INVALID_SLUG_MESSAGE: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчеркивания или дефиса.";

const UNDERIVABLE_SLUG_MESSAGE: &str =
    "Не удалось получить slug из заголовка, укажите его вручную.";

/// Rules applied to user-submitted content
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    banned_words: Vec<String>,
    warning: String,
    case_insensitive: bool,
    slug_max_length: usize,
    duplicate_slug_warning: String,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(&ModerationConfig::default(), &NotesConfig::default())
    }
}

impl ContentPolicy {
    pub fn new(moderation: &ModerationConfig, notes: &NotesConfig) -> Self {
        Self {
            banned_words: moderation
                .banned_words
                .iter()
                .filter(|w| !w.is_empty())
                .cloned()
                .collect(),
            warning: moderation.warning.clone(),
            case_insensitive: moderation.case_insensitive,
            slug_max_length: notes.slug_max_length,
            duplicate_slug_warning: notes.duplicate_slug_warning.clone(),
        }
    }

    pub fn slug_max_length(&self) -> usize {
        self.slug_max_length
    }

    /// First banned word contained in `text`, if any
    pub fn find_banned_word(&self, text: &str) -> Option<&str> {
        if self.case_insensitive {
            let haystack = text.to_lowercase();
            self.banned_words
                .iter()
                .find(|w| haystack.contains(&w.to_lowercase()))
                .map(String::as_str)
        } else {
            self.banned_words
                .iter()
                .find(|w| text.contains(w.as_str()))
                .map(String::as_str)
        }
    }

    /// Validate a comment form and return the text to store
    pub fn check_comment(&self, input: &CommentInput) -> Result<String, Vec<FieldError>> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(vec![FieldError::required("text")]);
        }
        if self.find_banned_word(text).is_some() {
            return Err(vec![FieldError::new(
                "text",
                ValidationKind::BannedWord,
                self.warning.clone(),
            )]);
        }
        Ok(text.to_string())
    }

    /// Validate a note form, deriving the slug from the title when it is blank.
    ///
    /// Uniqueness of the resulting slug is not checked here.
    pub fn check_note(&self, input: &NoteInput) -> Result<NoteDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = input.title.trim();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.push(FieldError::required("title"));
        } else if title_len > NOTE_TITLE_MAX_LENGTH {
            errors.push(FieldError::too_long("title", NOTE_TITLE_MAX_LENGTH, title_len));
        }

        let text = input.text.trim();
        if text.is_empty() {
            errors.push(FieldError::required("text"));
        }

        let submitted_slug = input.slug.trim();
        let slug = if submitted_slug.is_empty() {
            let derived = truncate_slug(&slugify(title), self.slug_max_length);
            // A blank title already has its own error
            if !title.is_empty() && !is_valid_slug(&derived) {
                errors.push(FieldError::new(
                    "slug",
                    ValidationKind::InvalidSlug,
                    UNDERIVABLE_SLUG_MESSAGE,
                ));
            }
            derived
        } else {
            let slug_len = submitted_slug.chars().count();
            if slug_len > self.slug_max_length {
                errors.push(FieldError::too_long("slug", self.slug_max_length, slug_len));
            } else if !is_valid_slug(submitted_slug) {
                errors.push(FieldError::new(
                    "slug",
                    ValidationKind::InvalidSlug,
                    INVALID_SLUG_MESSAGE,
                ));
            }
            submitted_slug.to_string()
        };

        if errors.is_empty() {
            Ok(NoteDraft {
                title: title.to_string(),
                text: text.to_string(),
                slug,
            })
        } else {
            Err(errors)
        }
    }

    /// Field error for a slug already used by another note
    pub fn duplicate_slug(&self, slug: &str) -> FieldError {
        FieldError::new(
            "slug",
            ValidationKind::DuplicateSlug,
            format!("{}{}", slug, self.duplicate_slug_warning),
        )
    }
}

/// Validate a signup form. Username availability is checked by the caller.
pub fn check_signup(input: &SignupInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let username = input.username.trim();
    let username_len = username.chars().count();
    if username.is_empty() {
        errors.push(FieldError::required("username"));
    } else if username_len > USERNAME_MAX_LENGTH {
        errors.push(FieldError::too_long("username", USERNAME_MAX_LENGTH, username_len));
    } else if !USERNAME_SHAPE.is_match(username) {
        errors.push(FieldError::new(
            "username",
            ValidationKind::InvalidUsername,
            "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_.",
        ));
    }

    if input.password1.is_empty() {
        errors.push(FieldError::required("password1"));
    }
    if input.password2.is_empty() {
        errors.push(FieldError::required("password2"));
    } else if !input.password1.is_empty() && input.password1 != input.password2 {
        errors.push(FieldError::new(
            "password2",
            ValidationKind::PasswordMismatch,
            "Введенные пароли не совпадают.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
