// src/services/mod.rs

pub mod comment;

pub use comment::{CommentService, validate_comment};
