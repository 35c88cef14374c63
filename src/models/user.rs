// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role name granting moderation rights over every comment.
pub const ADMIN_ROLE: &str = "admin";

/// Public profile of a user, as shown next to a comment.
/// Read from the 'users' table; the account service owns the rest of the row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub id: i64,

    pub user_name: String,

    /// Avatar URL, if the user uploaded one.
    pub user_avatar: Option<String>,

    /// User role: 'user' or 'admin'.
    pub user_role: String,
}

/// The authenticated user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}
