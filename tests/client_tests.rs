use anyhow::Result;
use elegance_store::api::{self, AppState};
use elegance_store::client::{ClientError, DataSource, LocalCache, StorefrontClient};
use elegance_store::db;
use elegance_store::errors::ValidationError;
use elegance_store::models::{Category, NewProduct, OrderStatus, Product};
use elegance_store::notification::{LogNotifier, NotificationQueue};
use elegance_store::order_intake::{IntakeRules, OrderIntake, OrderIntakeRequest};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

const PASSWORD: &str = "s3cret";

/// Start the API on a random local port
async fn start_server() -> Result<(String, SqlitePool)> {
    let pool = db::connect("sqlite::memory:").await?;
    db::init_database_schema(&pool).await?;

    let (queue, _worker) = NotificationQueue::spawn(Arc::new(LogNotifier));
    let intake = OrderIntake::new(pool.clone(), IntakeRules::default(), queue);
    let state = AppState::new(pool.clone(), intake, Some(PASSWORD.to_string()), 200.0);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.ok();
    });

    Ok((format!("http://{addr}"), pool))
}

/// Address nothing listens on
fn offline_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

fn client(base_url: &str, cache_dir: &TempDir) -> Result<StorefrontClient> {
    Ok(StorefrontClient::new(
        base_url,
        LocalCache::new(cache_dir.path()),
        IntakeRules::default(),
    )?
    .with_admin_password(PASSWORD))
}

async fn add_product(pool: &SqlitePool, name: &str, price: f64) -> Result<Product> {
    db::create_product(
        pool,
        &NewProduct {
            name: name.to_string(),
            description: String::new(),
            price,
            category: Category::Necklaces,
            images: vec!["necklace.jpg".to_string()],
        },
    )
    .await
}

fn request(product_id: &str, quantity: i64) -> OrderIntakeRequest {
    OrderIntakeRequest {
        customer_name: "Mona".to_string(),
        phone_number: "01001234567".to_string(),
        address: "12 Nasr St, Cairo".to_string(),
        product_id: product_id.to_string(),
        quantity,
        telegram_chat_id: None,
        notes: None,
    }
}

/// Products fetched online are served from the cache once the server is gone
#[tokio::test]
async fn test_fetch_products_falls_back_to_cache() -> Result<()> {
    let (url, pool) = start_server().await?;
    add_product(&pool, "Butterfly Necklace", 180.0).await?;
    let cache_dir = TempDir::new()?;

    let online = client(&url, &cache_dir)?;
    assert!(online.is_online().await);
    let fetched = online.fetch_products().await?;
    assert_eq!(fetched.source, DataSource::Server);
    assert_eq!(fetched.data.len(), 1);

    let offline = client(&offline_url()?, &cache_dir)?;
    assert!(!offline.is_online().await);
    let cached = offline.fetch_products().await?;
    assert_eq!(cached.source, DataSource::LocalCache);
    assert_eq!(cached.data[0].name, "Butterfly Necklace");

    Ok(())
}

/// An empty cache yields an empty list when offline
#[tokio::test]
async fn test_offline_without_cache() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let offline = client(&offline_url()?, &cache_dir)?;

    let products = offline.fetch_products().await?;
    assert_eq!(products.source, DataSource::LocalCache);
    assert!(products.data.is_empty());
    assert!(offline.fetch_orders().await?.data.is_empty());

    Ok(())
}

/// Online orders go to the server; its rejections come back as errors
#[tokio::test]
async fn test_create_order_online() -> Result<()> {
    let (url, pool) = start_server().await?;
    let product = add_product(&pool, "Moon Necklace", 200.0).await?;
    let cache_dir = TempDir::new()?;
    let online = client(&url, &cache_dir)?;

    let created = online.create_order(request(&product.id, 3)).await?;
    assert_eq!(created.source, DataSource::Server);
    assert_eq!(created.data.total_amount, 600.0);
    assert!(db::get_order_by_id(&pool, &created.data.id).await?.is_some());

    let rejected = online.create_order(request("missing", 1)).await;
    assert!(matches!(rejected, Err(ClientError::Server { status: 404, .. })));

    let orders = online.fetch_orders().await?;
    assert_eq!(orders.source, DataSource::Server);
    assert_eq!(orders.data.len(), 1);

    let updated = online
        .update_order_status(&created.data.id, OrderStatus::Processed)
        .await?;
    assert_eq!(updated.data.status, OrderStatus::Processed);

    let regression = online
        .update_order_status(&created.data.id, OrderStatus::Pending)
        .await;
    assert!(matches!(regression, Err(ClientError::Server { status: 400, .. })));

    assert_eq!(online.delete_order(&created.data.id).await?, DataSource::Server);
    assert_eq!(db::count_orders(&pool).await?, 0);

    Ok(())
}

/// Offline orders are priced from the cached product and kept locally
#[tokio::test]
async fn test_create_order_offline() -> Result<()> {
    let (url, pool) = start_server().await?;
    let product = add_product(&pool, "Moon Necklace", 200.0).await?;
    let cache_dir = TempDir::new()?;
    client(&url, &cache_dir)?.fetch_products().await?;

    let offline = client(&offline_url()?, &cache_dir)?;
    let created = offline.create_order(request(&product.id, 2)).await?;
    assert_eq!(created.source, DataSource::LocalCache);
    assert!(created.data.id.starts_with("local-"));
    assert_eq!(created.data.total_amount, 400.0);
    assert_eq!(created.data.status, OrderStatus::Pending);

    let orders = offline.fetch_orders().await?;
    assert_eq!(orders.data.len(), 1);
    assert_eq!(orders.data[0].id, created.data.id);

    // Never reconciled with the server
    assert_eq!(db::count_orders(&pool).await?, 0);

    let unknown = offline.create_order(request("not-cached", 1)).await;
    assert!(matches!(unknown, Err(ClientError::ProductNotFound(_))));

    Ok(())
}

/// Validation happens before any network or cache access
#[tokio::test]
async fn test_create_order_validates_first() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let offline = client(&offline_url()?, &cache_dir)?;

    let mut bad = request("p1", 1);
    bad.phone_number = "0100".to_string();
    let result = offline.create_order(bad).await;
    assert!(matches!(
        result,
        Err(ClientError::Validation(ValidationError::InvalidPhone))
    ));

    Ok(())
}

/// Local status updates and deletes work on the cached orders
#[tokio::test]
async fn test_offline_order_management() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let offline = client(&offline_url()?, &cache_dir)?;

    let product = Product {
        id: "cached-1".to_string(),
        name: "Star Earrings".to_string(),
        description: String::new(),
        price: 150.0,
        category: Category::Earrings,
        images: vec![],
        created_at: chrono::Utc::now(),
        updated_at: None,
    };
    offline.cache().save_products(&[product]).await?;

    let order = offline.create_order(request("cached-1", 1)).await?.data;

    let shipped = offline.update_order_status(&order.id, OrderStatus::Shipped).await?;
    assert_eq!(shipped.source, DataSource::LocalCache);
    assert_eq!(shipped.data.status, OrderStatus::Shipped);

    let regression = offline.update_order_status(&order.id, OrderStatus::Pending).await;
    assert!(matches!(
        regression,
        Err(ClientError::Validation(ValidationError::StatusRegression { .. }))
    ));

    assert_eq!(offline.delete_order(&order.id).await?, DataSource::LocalCache);
    assert!(matches!(
        offline.delete_order(&order.id).await,
        Err(ClientError::OrderNotFound(_))
    ));
    assert!(offline.fetch_orders().await?.data.is_empty());

    Ok(())
}
