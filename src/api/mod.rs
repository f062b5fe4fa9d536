//! # HTTP API
//!
//! JSON API used by the web storefront and the admin back office. Routes live
//! under `/api`, with `/health` at the root. Admin routes take the
//! [`AdminGuard`] extractor, which checks the `X-Admin-Password` header when an
//! admin password is configured.

pub mod orders;
pub mod products;
pub mod response;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::db;
use crate::localization::t_lang;
use crate::order_intake::OrderIntake;

pub use response::{ApiError, ApiResponse, ApiResult};

/// Header carrying the shared admin password
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub intake: OrderIntake,
    /// Admin routes are open when unset
    pub admin_password: Option<Arc<str>>,
    /// Default ceiling for `/products/offers/list`
    pub offers_max_price: f64,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        intake: OrderIntake,
        admin_password: Option<String>,
        offers_max_price: f64,
    ) -> Self {
        Self {
            pool,
            intake,
            admin_password: admin_password.map(Arc::from),
            offers_max_price,
        }
    }

    fn password_matches(&self, candidate: Option<&str>) -> bool {
        match &self.admin_password {
            Some(expected) => candidate == Some(expected.as_ref()),
            None => true,
        }
    }
}

/// Proof that the request may use admin routes
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|value| value.to_str().ok());

        if state.password_matches(provided) {
            Ok(AdminGuard)
        } else {
            warn!(path = %parts.uri.path(), "Rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(products::list_products).post(products::create_product))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/category/{category}", get(products::products_by_category))
        .route("/products/search/{query}", get(products::search_products))
        .route("/products/offers/list", get(products::offers))
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order).delete(orders::delete_order))
        .route("/orders/status/{status}", get(orders::orders_by_status))
        .route("/orders/search/{query}", get(orders::search_orders))
        .route("/orders/{id}/status", patch(orders::update_order_status))
        .route("/init-data", post(init_data))
        .route("/admin/login", post(admin_login));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy allowing the storefront origin
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = frontend_url
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid FRONTEND_URL: {frontend_url}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": t_lang("api-health", None),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ApiResponse::error(t_lang("error-route-not-found", None)),
    )
}

/// Seed the reference catalog when the store is empty
async fn init_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let added = db::seed_initial_products(&state.pool).await?;
    let total = db::count_products(&state.pool).await?;
    info!(added, total, "Initial data requested");

    Ok(ApiResponse::ok_with_message(
        json!({ "productsCount": total, "added": added }),
        t_lang("api-init-data", None),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(login) = payload?;
    if !state.password_matches(Some(login.password.as_str())) {
        warn!("Failed admin login");
        return Err(ApiError::Unauthorized);
    }
    Ok(ApiResponse::message(t_lang("api-login-ok", None)))
}
