// src/repositories/mod.rs

// Storage collaborators of the comment service.
// Every lookup here only sees active rows: soft-deleted comments are
// invisible to listing, to id lookups and to reply-target resolution.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        user::PublicIdentity,
    },
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Active comments of a subject, newest first (ties: higher id first).
    async fn list_active_by_subject(&self, subject_id: i64) -> Result<Vec<Comment>, AppError>;

    /// A single active comment.
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    async fn create(&self, comment: NewComment) -> Result<Comment, AppError>;

    /// Returns `false` when no active row matched.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn get_public_identity(&self, user_id: i64) -> Result<Option<PublicIdentity>, AppError>;

    /// Batched lookup. Unknown ids are simply absent from the map.
    async fn get_public_identities(
        &self,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, PublicIdentity>, AppError> {
        let mut found = HashMap::with_capacity(user_ids.len());
        for &id in user_ids {
            if let Some(identity) = self.get_public_identity(id).await? {
                found.insert(id, identity);
            }
        }
        Ok(found)
    }
}
