use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{CreateCommentRequest, DeleteCommentParams, ListCommentsParams},
    services::CommentService,
    utils::jwt::Claims,
};

/// Create a new comment on a question.
/// Requires: Login.
pub async fn add_comment(
    State(service): State<CommentService>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;

    tracing::info!(
        user_id = actor.user_id,
        subject_id = ?payload.subject_id,
        reply_to = ?payload.reply_to_comment_id,
        "add comment request"
    );

    let comment = service.create_comment(actor.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": comment.id })),
    ))
}

/// List the comment threads of a question.
/// Roots newest first, each carrying its direct replies.
pub async fn list_comments(
    State(service): State<CommentService>,
    Query(params): Query<ListCommentsParams>,
) -> Result<impl IntoResponse, AppError> {
    let subject_id = params.subject_id.unwrap_or(0);

    let threads = service.assemble_threads(subject_id).await?;

    tracing::info!(subject_id, roots = threads.len(), "listed comment threads");

    Ok(Json(threads))
}

/// Delete a comment (Soft Delete).
/// Requires: Login + (Author OR Admin).
pub async fn delete_comment(
    State(service): State<CommentService>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<DeleteCommentParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let actor = claims.actor()?;

    service.delete_comment(&actor, params.id).await?;

    Ok(Json(true))
}
