//! Data models
//!
//! Database entities (User, Session, News, Comment, Note), the request
//! `Identity`, form inputs and pagination types.

mod comment;
mod identity;
mod news;
mod note;
mod pagination;
mod session;
mod user;

pub use comment::{Comment, CommentInput, CommentWithAuthor};
pub use identity::Identity;
pub use news::{CreateNewsInput, News};
pub use note::{Note, NoteDraft, NoteInput};
pub use pagination::{ListParams, PagedResult};
pub use session::Session;
pub use user::{Credentials, SignupInput, User};
