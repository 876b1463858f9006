//! quillpost - a news feed with moderated comments and a private notebook
//!
//! Comments and notes are owned by their authors. Anything a caller does not
//! own looks exactly like something that does not exist.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
