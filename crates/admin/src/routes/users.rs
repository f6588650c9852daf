//! Customer account management route handlers.
//!
//! Blocking takes a non-empty reason that is stored server-side; unblocking
//! requires an explicit confirmation flag so a stray click cannot reinstate
//! an account.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use spindle_core::UserId;
use tracing::{info, instrument};

use crate::commerce::AdminUser;
use crate::error::AppError;
use crate::state::AppState;

/// An account plus the actions currently available on it.
#[derive(Debug, Serialize)]
pub struct UserWithActions {
    #[serde(flatten)]
    pub user: AdminUser,
    pub can_block: bool,
    pub can_unblock: bool,
}

impl From<AdminUser> for UserWithActions {
    fn from(user: AdminUser) -> Self {
        let can_block = user.is_active;
        let can_unblock = !user.is_active;
        Self {
            user,
            can_block,
            can_unblock,
        }
    }
}

/// GET /users
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserWithActions>>, AppError> {
    let users = state.commerce().list_users().await?;
    Ok(Json(users.into_iter().map(UserWithActions::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub reason: String,
}

/// POST /users/{id}/block
#[instrument(skip(state, request))]
pub async fn block(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(request): Json<BlockRequest>,
) -> Result<Json<UserWithActions>, AppError> {
    let reason = request.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "A reason is required to block an account".to_string(),
        ));
    }

    let current = state.commerce().get_user(id).await?;
    if !current.is_active {
        return Err(AppError::Conflict("Account is already blocked".to_string()));
    }

    let user = state.commerce().block_user(id, reason).await?;
    info!(user_id = %id, "Account blocked");
    Ok(Json(UserWithActions::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct UnblockRequest {
    /// Must be true; forces the UI to ask before reinstating.
    pub confirm: bool,
}

/// POST /users/{id}/unblock
#[instrument(skip(state, request))]
pub async fn unblock(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(request): Json<UnblockRequest>,
) -> Result<Json<UserWithActions>, AppError> {
    if !request.confirm {
        return Err(AppError::BadRequest(
            "Unblocking requires confirmation".to_string(),
        ));
    }

    let current = state.commerce().get_user(id).await?;
    if current.is_active {
        return Err(AppError::Conflict("Account is not blocked".to_string()));
    }

    let user = state.commerce().unblock_user(id).await?;
    info!(user_id = %id, "Account reinstated");
    Ok(Json(UserWithActions::from(user)))
}
