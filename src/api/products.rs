//! Catalog routes

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use super::{AdminGuard, ApiError, ApiResponse, ApiResult, AppState};
use crate::db;
use crate::errors::ValidationError;
use crate::localization::t_lang;
use crate::models::{Category, NewProduct, ProductUpdate};

const PRODUCT_NOT_FOUND: &str = "error-product-not-found";

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::ProductNameMissing);
    }
    Ok(name.to_string())
}

fn validate_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::ProductPriceInvalid);
    }
    Ok(price)
}

fn validate_images(images: &[String]) -> Result<Vec<String>, ValidationError> {
    let images: Vec<String> = images
        .iter()
        .map(|image| image.trim())
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .collect();
    if images.is_empty() {
        return Err(ValidationError::ProductImagesMissing);
    }
    Ok(images)
}

pub fn validate_new_product(product: NewProduct) -> Result<NewProduct, ValidationError> {
    Ok(NewProduct {
        name: validate_name(&product.name)?,
        description: product.description.trim().to_string(),
        price: validate_price(product.price)?,
        category: product.category,
        images: validate_images(&product.images)?,
    })
}

pub fn validate_product_update(update: ProductUpdate) -> Result<ProductUpdate, ValidationError> {
    Ok(ProductUpdate {
        name: update.name.as_deref().map(validate_name).transpose()?,
        description: update.description.map(|d| d.trim().to_string()),
        price: update.price.map(validate_price).transpose()?,
        category: update.category,
        images: update.images.as_deref().map(validate_images).transpose()?,
    })
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let products = db::get_all_products(&state.pool).await?;
    Ok(ApiResponse::ok(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let product = db::get_product_by_id(&state.pool, &id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;
    Ok(ApiResponse::ok(product))
}

pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let category = Category::from_str(&category).map_err(ValidationError::UnknownCategory)?;
    let products = db::get_products_by_category(&state.pool, category).await?;
    Ok(ApiResponse::ok(products))
}

pub async fn search_products(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let products = db::search_products(&state.pool, &query).await?;
    Ok(ApiResponse::ok(products))
}

#[derive(Debug, Deserialize)]
pub struct OffersQuery {
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
}

pub async fn offers(
    State(state): State<AppState>,
    Query(query): Query<OffersQuery>,
) -> ApiResult<impl IntoResponse> {
    let max_price = query.max_price.unwrap_or(state.offers_max_price);
    let products = db::get_products_by_max_price(&state.pool, max_price).await?;
    Ok(ApiResponse::ok(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminGuard,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let new_product = validate_new_product(payload)?;
    let product = db::create_product(&state.pool, &new_product).await?;
    info!(product_id = %product.id, "Product created via API");

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(product, t_lang("api-product-created", None)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let update = validate_product_update(payload)?;
    let product = db::update_product(&state.pool, &id, &update)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    Ok(ApiResponse::ok_with_message(product, t_lang("api-product-updated", None)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !db::delete_product(&state.pool, &id).await? {
        return Err(ApiError::NotFound(PRODUCT_NOT_FOUND));
    }
    Ok(ApiResponse::message(t_lang("api-product-deleted", None)))
}
