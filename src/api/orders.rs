//! Order routes

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use super::{AdminGuard, ApiError, ApiResponse, ApiResult, AppState};
use crate::db::{self, StatusUpdate};
use crate::errors::ValidationError;
use crate::localization::t_lang;
use crate::models::OrderStatus;
use crate::order_intake::OrderIntakeRequest;

const ORDER_NOT_FOUND: &str = "error-order-not-found";

fn parse_status(raw: &str) -> Result<OrderStatus, ValidationError> {
    OrderStatus::from_str(raw).map_err(ValidationError::UnknownStatus)
}

/// Place an order from the web storefront
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderIntakeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let order = state.intake.create_order(request).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(order, t_lang("api-order-created", None)),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let order = db::get_order_by_id(&state.pool, &id)
        .await?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND))?;
    Ok(ApiResponse::ok(order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminGuard,
) -> ApiResult<impl IntoResponse> {
    let orders = db::get_all_orders(&state.pool).await?;
    Ok(ApiResponse::ok(orders))
}

pub async fn orders_by_status(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(status): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = parse_status(&status)?;
    let orders = db::get_orders_by_status(&state.pool, status).await?;
    Ok(ApiResponse::ok(orders))
}

pub async fn search_orders(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(query): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let orders = db::search_orders(&state.pool, &query).await?;
    Ok(ApiResponse::ok(orders))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(change) = payload?;
    let status = parse_status(&change.status)?;

    match db::update_order_status(&state.pool, &id, status).await? {
        StatusUpdate::Updated => {}
        StatusUpdate::NotFound => return Err(ApiError::NotFound(ORDER_NOT_FOUND)),
        StatusUpdate::Rejected { current } => {
            return Err(ValidationError::StatusRegression {
                from: current.to_string(),
                to: status.to_string(),
            }
            .into())
        }
    }

    let order = db::get_order_by_id(&state.pool, &id)
        .await?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND))?;
    Ok(ApiResponse::ok_with_message(order, t_lang("api-order-status-updated", None)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !db::delete_order(&state.pool, &id).await? {
        return Err(ApiError::NotFound(ORDER_NOT_FOUND));
    }
    Ok(ApiResponse::message(t_lang("api-order-deleted", None)))
}
