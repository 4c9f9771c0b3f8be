use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::domain::{Circle, CircleId, Sell, UserId};
use crate::error::AppError;
use crate::ledger::{CircleDraft, SellDraft};

#[derive(Debug, Serialize)]
pub struct CircleDetailResponse {
    #[serde(flatten)]
    pub circle: Circle,
    pub sells: Vec<Sell>,
}

#[derive(Debug, Serialize)]
pub struct SellResponse {
    pub message: &'static str,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn list_circles(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Circle>>, AppError> {
    let Path(user_id) = user_id?;
    let circles = state.ledger.list_circles(UserId(user_id)).await?;
    Ok(Json(circles))
}

pub async fn create_circle(
    State(state): State<AppState>,
    payload: Result<Json<CircleDraft>, JsonRejection>,
) -> Result<Json<Circle>, AppError> {
    let Json(draft) = payload?;
    let circle = state.ledger.create_circle(draft).await?;
    Ok(Json(circle))
}

pub async fn get_circle(
    State(state): State<AppState>,
    circle_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CircleDetailResponse>, AppError> {
    let Path(circle_id) = circle_id?;
    let (circle, sells) = state.ledger.circle_with_sells(CircleId(circle_id)).await?;
    Ok(Json(CircleDetailResponse { circle, sells }))
}

pub async fn record_sell(
    State(state): State<AppState>,
    circle_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SellDraft>, JsonRejection>,
) -> Result<Json<SellResponse>, AppError> {
    let Path(circle_id) = circle_id?;
    let Json(draft) = payload?;
    let circle = state.ledger.record_sell(CircleId(circle_id), draft).await?;
    Ok(Json(SellResponse {
        message: "Sell added",
        closed: circle.closed,
    }))
}

pub async fn delete_circle(
    State(state): State<AppState>,
    circle_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(circle_id) = circle_id?;
    state.ledger.delete_circle(CircleId(circle_id)).await?;
    Ok(Json(MessageResponse {
        message: "Circle deleted",
    }))
}
