//! # Storefront Client
//!
//! HTTP client for the store API used by storefront front-ends. When the
//! server cannot be reached it keeps working from a local JSON copy of the
//! catalog and orders: reads come from the copy and new orders are stored
//! locally with a `local-` id. Local orders are never sent to the server later.
//!
//! Rejections from a reachable server (4xx/5xx) are returned as errors and
//! never replaced by the local fallback.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiResponse, ADMIN_PASSWORD_HEADER};
use crate::errors::ValidationError;
use crate::models::{Order, OrderStatus, Product};
use crate::order_intake::{IntakeRules, OrderIntakeRequest};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PRODUCTS_FILE: &str = "products.json";
const ORDERS_FILE: &str = "orders.json";

/// Prefix of order ids created while offline
pub const LOCAL_ORDER_PREFIX: &str = "local-";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("server rejected the request ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("server response carried no data")]
    EmptyResponse,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("local cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),
    #[error("local cache is corrupt: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Server,
    LocalCache,
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Fetched<T> {
    fn server(data: T) -> Self {
        Self {
            data,
            source: DataSource::Server,
        }
    }

    fn local(data: T) -> Self {
        Self {
            data,
            source: DataSource::LocalCache,
        }
    }
}

/// JSON files holding the last known catalog and orders
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, ClientError> {
        let path = self.dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.dir.join(file), bytes).await?;
        Ok(())
    }

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.load(PRODUCTS_FILE).await
    }

    pub async fn save_products(&self, products: &[Product]) -> Result<(), ClientError> {
        self.save(PRODUCTS_FILE, products).await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.load(ORDERS_FILE).await
    }

    pub async fn save_orders(&self, orders: &[Order]) -> Result<(), ClientError> {
        self.save(ORDERS_FILE, orders).await
    }
}

/// Client for the store HTTP API with an offline fallback
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: String,
    admin_password: Option<String>,
    rules: IntakeRules,
    cache: LocalCache,
}

impl StorefrontClient {
    pub fn new(base_url: &str, cache: LocalCache, rules: IntakeRules) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_password: None,
            rules,
            cache,
        })
    }

    /// Send the admin password with order listing and management requests
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin_password {
            Some(password) => request.header(ADMIN_PASSWORD_HEADER, password),
            None => request,
        }
    }

    /// True when the server answers its health check
    pub async fn is_online(&self) -> bool {
        match self
            .http
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn server_products(&self) -> Result<Vec<Product>, ClientError> {
        let response = self.http.get(self.url("/api/products")).send().await?;
        read_data(response).await
    }

    async fn server_orders(&self) -> Result<Vec<Order>, ClientError> {
        let response = self.admin(self.http.get(self.url("/api/orders"))).send().await?;
        read_data(response).await
    }

    pub async fn fetch_products(&self) -> Result<Fetched<Vec<Product>>, ClientError> {
        if self.is_online().await {
            match self.server_products().await {
                Ok(products) => {
                    self.cache.save_products(&products).await?;
                    return Ok(Fetched::server(products));
                }
                Err(e) => warn!(error = %e, "Failed to fetch products, using local copy"),
            }
        }

        Ok(Fetched::local(self.cache.products().await?))
    }

    pub async fn fetch_orders(&self) -> Result<Fetched<Vec<Order>>, ClientError> {
        if self.is_online().await {
            match self.server_orders().await {
                Ok(orders) => {
                    // Offline orders exist only locally and must survive a refresh
                    let mut merged = orders.clone();
                    merged.extend(
                        self.cache
                            .orders()
                            .await?
                            .into_iter()
                            .filter(|o| o.id.starts_with(LOCAL_ORDER_PREFIX)),
                    );
                    self.cache.save_orders(&merged).await?;
                    return Ok(Fetched::server(orders));
                }
                Err(e) => warn!(error = %e, "Failed to fetch orders, using local copy"),
            }
        }

        Ok(Fetched::local(self.cache.orders().await?))
    }

    /// Validate and place an order, locally when the server is unreachable
    pub async fn create_order(&self, request: OrderIntakeRequest) -> Result<Fetched<Order>, ClientError> {
        let request = request.validate(&self.rules)?;

        if self.is_online().await {
            let response = self
                .http
                .post(self.url("/api/orders"))
                .json(&request)
                .send()
                .await?;
            let order = read_data::<Order>(response).await?;
            info!(order_id = %order.id, "Order placed on server");
            return Ok(Fetched::server(order));
        }

        let product = self
            .cache
            .products()
            .await?
            .into_iter()
            .find(|p| p.id == request.product_id)
            .ok_or_else(|| ClientError::ProductNotFound(request.product_id.clone()))?;

        let order = request.into_order(format!("{LOCAL_ORDER_PREFIX}{}", Uuid::new_v4()), &product);
        let mut orders = self.cache.orders().await?;
        orders.insert(0, order.clone());
        self.cache.save_orders(&orders).await?;

        info!(order_id = %order.id, "Server offline, order stored locally");
        Ok(Fetched::local(order))
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Fetched<Order>, ClientError> {
        if self.is_online().await {
            let response = self
                .admin(self.http.patch(self.url(&format!("/api/orders/{order_id}/status"))))
                .json(&serde_json::json!({ "status": status }))
                .send()
                .await?;
            let order = read_data::<Order>(response).await?;
            return Ok(Fetched::server(order));
        }

        let mut orders = self.cache.orders().await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ClientError::OrderNotFound(order_id.to_string()))?;
        if !order.status.can_move_to(status) {
            return Err(ValidationError::StatusRegression {
                from: order.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }
        order.status = status;
        let updated = order.clone();
        self.cache.save_orders(&orders).await?;

        Ok(Fetched::local(updated))
    }

    pub async fn delete_order(&self, order_id: &str) -> Result<DataSource, ClientError> {
        if self.is_online().await {
            let response = self
                .admin(self.http.delete(self.url(&format!("/api/orders/{order_id}"))))
                .send()
                .await?;
            ensure_success(response).await?;
            return Ok(DataSource::Server);
        }

        let mut orders = self.cache.orders().await?;
        let before = orders.len();
        orders.retain(|o| o.id != order_id);
        if orders.len() == before {
            return Err(ClientError::OrderNotFound(order_id.to_string()));
        }
        self.cache.save_orders(&orders).await?;

        Ok(DataSource::LocalCache)
    }
}

/// Body of a non-2xx response as a `Server` error
async fn rejection(response: Response) -> ClientError {
    let status = response.status();
    let message = response
        .json::<ApiResponse<Value>>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}

async fn ensure_success(response: Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    Ok(())
}

async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    let body: ApiResponse<T> = response.json().await?;
    body.data.ok_or(ClientError::EmptyResponse)
}
