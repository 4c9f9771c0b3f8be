use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{RawTelegramId, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub telegram_id: Option<RawTelegramId>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
}

pub async fn post_user(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(request) = payload?;
    let user_id = state
        .ledger
        .get_or_create_user(request.telegram_id.as_ref())
        .await?;
    Ok(Json(UserResponse { user_id }))
}
