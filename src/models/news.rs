//! News model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A published news item. News is not owned by any user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date, newest first on the home page
    pub date: NaiveDate,
}

/// Input for publishing a news item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

impl CreateNewsInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date,
        }
    }
}
