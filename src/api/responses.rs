//! Page contexts
//!
//! Each page answers a JSON object describing what a template would render:
//! listed objects, the entity in focus and, for form pages, the submitted
//! data plus field errors.

use serde::{Deserialize, Serialize};

use crate::models::{Comment, CommentInput, CommentWithAuthor, News, Note, NoteInput, PagedResult};
use crate::services::FieldError;

/// A form as shown to the user: current values and errors next to fields
#[derive(Debug, Serialize)]
pub struct FormContext<T> {
    pub data: T,
    pub errors: Vec<FieldError>,
}

impl<T> FormContext<T> {
    /// A form with no errors
    pub fn blank(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// A rejected submission, re-rendered with its errors
    pub fn invalid(data: T, errors: Vec<FieldError>) -> Self {
        Self { data, errors }
    }
}

// ============================================================================
// Auth pages
// ============================================================================

/// Signup form fields echoed back; passwords never are
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SignupFormData {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SignupPage {
    pub form: FormContext<SignupFormData>,
}

/// Login form submission
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct LoginFormData {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub form: FormContext<LoginFormData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub message: String,
}

impl MessagePage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// News pages
// ============================================================================

#[derive(Debug, Serialize)]
pub struct NewsListPage {
    pub object_list: Vec<News>,
    pub page: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<PagedResult<News>> for NewsListPage {
    fn from(result: PagedResult<News>) -> Self {
        Self {
            page: result.page,
            total: result.total,
            total_pages: result.total_pages(),
            has_next: result.has_next(),
            has_prev: result.has_prev(),
            object_list: result.items,
        }
    }
}

/// News detail. `form` is only offered to authenticated callers.
#[derive(Debug, Serialize)]
pub struct NewsDetailPage {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormContext<CommentInput>>,
}

#[derive(Debug, Serialize)]
pub struct CommentEditPage {
    pub comment: Comment,
    pub form: FormContext<CommentInput>,
}

#[derive(Debug, Serialize)]
pub struct CommentDeletePage {
    pub comment: Comment,
}

// ============================================================================
// Notes pages
// ============================================================================

#[derive(Debug, Serialize)]
pub struct NotesHomePage {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteListPage {
    pub object_list: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteDetailPage {
    pub note: Note,
}

/// Add and edit share one form page; `note` is set when editing
#[derive(Debug, Serialize)]
pub struct NoteFormPage {
    pub form: FormContext<NoteInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteDeletePage {
    pub note: Note,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListParams;
    use chrono::NaiveDate;

    #[test]
    fn test_news_list_page_from_paged_result() {
        let news = News {
            id: 1,
            title: "Заголовок".to_string(),
            text: "Текст".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let page: NewsListPage = PagedResult::new(vec![news], 11, &ListParams::new(1, 10)).into();
        assert_eq!(page.object_list.len(), 1);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn test_anonymous_detail_omits_form() {
        let page = NewsDetailPage {
            news: News {
                id: 1,
                title: "t".to_string(),
                text: "x".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
            comments: Vec::new(),
            form: None,
        };
        let json = serde_json::to_value(page).unwrap();
        assert!(json.get("form").is_none());
        assert!(json["comments"].as_array().unwrap().is_empty());
    }
}
