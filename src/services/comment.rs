// src/services/comment.rs

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentView, CreateCommentRequest, NewComment},
        user::Actor,
    },
    repositories::{CommentRepository, IdentityRepository},
};

/// Checks a candidate comment.
///
/// On create the subject and a non-blank content are required, in that order.
/// In every mode a present content must pass the length rule declared on
/// [`CreateCommentRequest`].
pub fn validate_comment(candidate: &CreateCommentRequest, is_create: bool) -> Result<(), AppError> {
    if is_create {
        if !candidate.subject_id.is_some_and(|id| id > 0) {
            return Err(AppError::InvalidInput("subject not found".to_string()));
        }
        if candidate
            .content
            .as_deref()
            .is_none_or(|content| content.trim().is_empty())
        {
            return Err(AppError::InvalidInput("content required".to_string()));
        }
    }

    // Content is the only field carrying derive rules.
    candidate
        .validate()
        .map_err(|_| AppError::InvalidInput("content too long".to_string()))
}

/// Comment use cases on top of the two storage collaborators.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    identities: Arc<dyn IdentityRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        identities: Arc<dyn IdentityRepository>,
    ) -> Self {
        Self {
            comments,
            identities,
        }
    }

    /// Root comments of a subject, newest first, each with its direct replies.
    pub async fn assemble_threads(&self, subject_id: i64) -> Result<Vec<CommentView>, AppError> {
        if subject_id <= 0 {
            return Err(AppError::InvalidInput("subject not found".to_string()));
        }

        let comments = self.comments.list_active_by_subject(subject_id).await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let views = self.build_views(&comments).await?;
        Ok(nest_replies(&comments, views))
    }

    /// Enriched view of a single comment, without children.
    pub async fn comment_view(&self, comment: &Comment) -> Result<CommentView, AppError> {
        let view = self
            .build_views(std::slice::from_ref(comment))
            .await?
            .pop()
            .unwrap_or_else(|| CommentView::from_comment(comment));
        Ok(view)
    }

    /// Validates and stores a new comment written by `author_id`.
    ///
    /// The thread root is derived from the reply target when there is one,
    /// so stored rows always point at a real root of the same subject.
    pub async fn create_comment(
        &self,
        author_id: i64,
        request: CreateCommentRequest,
    ) -> Result<CommentView, AppError> {
        validate_comment(&request, true)?;

        let (Some(subject_id), Some(content)) = (request.subject_id, request.content) else {
            return Err(AppError::InvalidInput("content required".to_string()));
        };

        let reply_to = request.reply_to_comment_id.filter(|&id| id > 0);
        let thread_root_id = match reply_to {
            Some(target_id) => {
                let target = self
                    .comments
                    .get_by_id(target_id)
                    .await?
                    .filter(|c| c.subject_id == subject_id)
                    .ok_or(AppError::NotFound("reply target not found".to_string()))?;
                // Replying to a reply keeps the conversation in the same thread.
                Some(target.root_id().unwrap_or(target.id))
            }
            None => match request.thread_root_id.filter(|&id| id > 0) {
                Some(root_id) => {
                    let root = self
                        .comments
                        .get_by_id(root_id)
                        .await?
                        .filter(|c| c.subject_id == subject_id && c.is_root())
                        .ok_or(AppError::NotFound("thread root not found".to_string()))?;
                    Some(root.id)
                }
                None => None,
            },
        };

        let stored = self
            .comments
            .create(NewComment {
                subject_id,
                reply_to_comment_id: reply_to,
                thread_root_id,
                author_id,
                content,
                created_at: chrono::Utc::now(),
            })
            .await?;

        tracing::info!(
            comment_id = stored.id,
            subject_id,
            author_id,
            "comment created"
        );

        self.comment_view(&stored).await
    }

    /// Soft-deletes a comment. Only its author or an admin may do so.
    pub async fn delete_comment(&self, actor: &Actor, comment_id: i64) -> Result<(), AppError> {
        if comment_id <= 0 {
            return Err(AppError::InvalidInput("Invalid comment id".to_string()));
        }

        let comment = self
            .comments
            .get_by_id(comment_id)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;

        if comment.author_id != actor.user_id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "You are not authorized to delete this comment".to_string(),
            ));
        }

        if !self.comments.soft_delete(comment_id).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        tracing::info!(comment_id, actor_id = actor.user_id, "comment deleted");
        Ok(())
    }

    /// Converts rows to views, attaching author and replied-to identities.
    /// Missing users or reply targets leave the corresponding field empty.
    async fn build_views(&self, comments: &[Comment]) -> Result<Vec<CommentView>, AppError> {
        let authors_in_set: HashMap<i64, i64> =
            comments.iter().map(|c| (c.id, c.author_id)).collect();

        // Reply target id -> author of the target, if the target is still visible.
        let mut target_authors: HashMap<i64, Option<i64>> = HashMap::new();
        for target_id in comments.iter().filter_map(Comment::reply_target_id) {
            if target_authors.contains_key(&target_id) {
                continue;
            }
            let author = match authors_in_set.get(&target_id) {
                Some(&author_id) => Some(author_id),
                None => self
                    .comments
                    .get_by_id(target_id)
                    .await?
                    .map(|target| target.author_id),
            };
            target_authors.insert(target_id, author);
        }

        let user_ids: Vec<i64> = comments
            .iter()
            .map(|c| c.author_id)
            .chain(target_authors.values().flatten().copied())
            .filter(|&id| id > 0)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let identities = self.identities.get_public_identities(&user_ids).await?;

        let views = comments
            .iter()
            .map(|comment| {
                let mut view = CommentView::from_comment(comment);
                view.author = identities.get(&comment.author_id).cloned();
                view.reply_to_author = comment
                    .reply_target_id()
                    .and_then(|target_id| target_authors.get(&target_id).copied().flatten())
                    .and_then(|author_id| identities.get(&author_id).cloned());
                view
            })
            .collect();

        Ok(views)
    }
}

/// Folds a flat, ordered list into roots with their direct replies.
///
/// Only roots are valid parents: a reply whose root is missing, or is itself a
/// reply, is dropped rather than promoted. Input order is kept on both levels.
fn nest_replies(comments: &[Comment], views: Vec<CommentView>) -> Vec<CommentView> {
    let mut roots: Vec<CommentView> = Vec::new();
    let mut root_index: HashMap<i64, usize> = HashMap::new();
    let mut replies: Vec<(i64, CommentView)> = Vec::new();

    for (comment, view) in comments.iter().zip(views) {
        match comment.root_id() {
            None => {
                root_index.insert(comment.id, roots.len());
                roots.push(view);
            }
            Some(root_id) => replies.push((root_id, view)),
        }
    }

    for (root_id, reply) in replies {
        match root_index.get(&root_id) {
            Some(&idx) => roots[idx].children.push(reply),
            None => tracing::debug!(
                comment_id = reply.id,
                thread_root_id = root_id,
                "dropping reply without a visible root"
            ),
        }
    }

    roots
}
