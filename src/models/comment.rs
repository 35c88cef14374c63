use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::user::PublicIdentity;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,

    /// The question this comment is attached to.
    pub subject_id: i64,

    /// The specific comment being answered, used for "@user" display.
    pub reply_to_comment_id: Option<i64>,

    /// The root comment of the thread. `None` (or 0) marks a root.
    pub thread_root_id: Option<i64>,

    pub author_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Comment {
    /// The thread this comment hangs under, if any.
    ///
    /// Zero, negative and self-referencing ids all mean "no parent", so a row
    /// pointing at itself is rendered as a root instead of its own child.
    pub fn root_id(&self) -> Option<i64> {
        self.thread_root_id
            .filter(|&rid| rid > 0 && rid != self.id)
    }

    pub fn is_root(&self) -> bool {
        self.root_id().is_none()
    }

    pub fn reply_target_id(&self) -> Option<i64> {
        self.reply_to_comment_id.filter(|&id| id > 0)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Row to be inserted. Ids of related comments are already resolved.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub subject_id: i64,
    pub reply_to_comment_id: Option<i64>,
    pub thread_root_id: Option<i64>,
    pub author_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
///
/// Every field is optional on the wire so that missing values reach the
/// validator and get a field-specific message instead of a generic 422.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(alias = "questionId")]
    pub subject_id: Option<i64>,

    /// Optional: the ID of the comment being replied to.
    pub reply_to_comment_id: Option<i64>,

    /// Optional: the thread root. Derived from the reply target when one is given.
    pub thread_root_id: Option<i64>,

    /// At most 1000 characters, counted as Unicode scalar values. The old Java
    /// service counted UTF-16 code units, so text outside the BMP (emoji) could
    /// be up to twice as long here as it was there.
    #[validate(length(max = 1000, message = "content too long"))]
    pub content: Option<String>,
}

/// Query parameters for listing the threads of a question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsParams {
    #[serde(alias = "questionId")]
    pub subject_id: Option<i64>,
}

/// Query parameters for deleting a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteCommentParams {
    #[validate(range(min = 1, message = "Invalid comment id"))]
    pub id: i64,
}

/// DTO for displaying a comment with author info and its direct replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub subject_id: i64,
    pub reply_to_comment_id: Option<i64>,
    pub thread_root_id: Option<i64>,
    pub author_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Author's public profile. `None` when the user no longer exists.
    pub author: Option<PublicIdentity>,

    /// Profile of the user being answered, only for replies with a live target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_author: Option<PublicIdentity>,

    pub children: Vec<CommentView>,
}

impl CommentView {
    /// Copies the scalar fields; identities and children are attached later.
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            subject_id: comment.subject_id,
            reply_to_comment_id: comment.reply_to_comment_id,
            thread_root_id: comment.thread_root_id,
            author_id: comment.author_id,
            content: comment.content.clone(),
            created_at: comment.created_at,
            author: None,
            reply_to_author: None,
            children: Vec::new(),
        }
    }
}
