//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own:
//! - the ownership gate for comments and notes
//! - field validation and slug derivation
//! - accounts and sessions

pub mod access;
pub mod comment;
pub mod error;
pub mod news;
pub mod note;
pub mod password;
pub mod slug;
pub mod user;
pub mod validation;

pub use access::{authorize, require_user, Owned};
pub use comment::CommentService;
pub use error::{FieldError, ServiceError, ValidationKind};
pub use news::{NewsDetail, NewsService};
pub use note::NoteService;
pub use password::{hash_password, verify_password};
pub use slug::{is_valid_slug, slugify, truncate_slug};
pub use user::{UserService, UserServiceError};
pub use validation::{check_signup, ContentPolicy};
