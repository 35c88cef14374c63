// src/repositories/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CommentRepository, IdentityRepository};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        user::PublicIdentity,
    },
};

#[derive(Default)]
struct Tables {
    comments: HashMap<i64, Comment>,
    users: HashMap<i64, PublicIdentity>,
    next_comment_id: i64,
}

/// Process-local store. Used by the test suites and for running the
/// service without a database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, identity: PublicIdentity) {
        let mut tables = self.tables.write().await;
        tables.users.insert(identity.id, identity);
    }

    pub async fn remove_user(&self, user_id: i64) -> Option<PublicIdentity> {
        self.tables.write().await.users.remove(&user_id)
    }

    /// Stores a row as-is, bypassing every write-time check.
    /// Lets callers reproduce rows that only exist through direct database edits.
    pub async fn insert_raw(&self, comment: Comment) {
        let mut tables = self.tables.write().await;
        tables.next_comment_id = tables.next_comment_id.max(comment.id);
        tables.comments.insert(comment.id, comment);
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_active_by_subject(&self, subject_id: i64) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.subject_id == subject_id && !c.is_deleted())
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(comments)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).filter(|c| !c.is_deleted()).cloned())
    }

    async fn create(&self, comment: NewComment) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_comment_id += 1;
        let stored = Comment {
            id: tables.next_comment_id,
            subject_id: comment.subject_id,
            reply_to_comment_id: comment.reply_to_comment_id,
            thread_root_id: comment.thread_root_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.created_at,
            deleted_at: None,
        };
        tables.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&id) {
            Some(comment) if !comment.is_deleted() => {
                let now = chrono::Utc::now();
                comment.deleted_at = Some(now);
                comment.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn get_public_identity(&self, user_id: i64) -> Result<Option<PublicIdentity>, AppError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }
}
