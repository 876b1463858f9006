//! Note model

use serde::{Deserialize, Serialize};

/// A private note. Only its author may see, change or remove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Globally unique, URL-safe address of the note
    pub slug: String,
    pub author_id: i64,
}

/// Note form payload. An empty slug asks for one derived from the title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

impl NoteInput {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            slug: slug.into(),
        }
    }
}

/// A validated note ready to be written
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    pub slug: String,
}
