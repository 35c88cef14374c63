// src/repositories/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CommentRepository, IdentityRepository};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        user::PublicIdentity,
    },
};

/// Postgres-backed store for comments and the public side of users.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_active_by_subject(&self, subject_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                id, subject_id, reply_to_comment_id, thread_root_id,
                author_id, content, created_at, updated_at, deleted_at
            FROM comments
            WHERE subject_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list comments: {:?}", e);
            AppError::from(e)
        })?;

        Ok(comments)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                id, subject_id, reply_to_comment_id, thread_root_id,
                author_id, content, created_at, updated_at, deleted_at
            FROM comments
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create(&self, comment: NewComment) -> Result<Comment, AppError> {
        let stored = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments
                (subject_id, reply_to_comment_id, thread_root_id, author_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING
                id, subject_id, reply_to_comment_id, thread_root_id,
                author_id, content, created_at, updated_at, deleted_at
            "#,
        )
        .bind(comment.subject_id)
        .bind(comment.reply_to_comment_id)
        .bind(comment.thread_root_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::from(e)
        })?;

        Ok(stored)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete comment: {:?}", e);
            AppError::from(e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityRepository for PgStore {
    async fn get_public_identity(&self, user_id: i64) -> Result<Option<PublicIdentity>, AppError> {
        let identity = sqlx::query_as::<_, PublicIdentity>(
            r#"
            SELECT id, user_name, user_avatar, user_role
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn get_public_identities(
        &self,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, PublicIdentity>, AppError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let identities = sqlx::query_as::<_, PublicIdentity>(
            r#"
            SELECT id, user_name, user_avatar, user_role
            FROM users
            WHERE id = ANY($1) AND deleted_at IS NULL
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(identities.into_iter().map(|u| (u.id, u)).collect())
    }
}
