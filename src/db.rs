//! # Database Module
//!
//! Catalog and order storage over a single-file SQLite database.
//! An order header and its items are always written and deleted inside one
//! transaction, so a failed item insert never leaves an orphan order behind.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Category, NewProduct, Order, OrderItem, OrderStatus, Product, ProductUpdate,
};

/// Outcome of an order status update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated,
    NotFound,
    /// The requested status is behind the current one
    Rejected { current: OrderStatus },
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: f64,
    category: String,
    images: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(row: ProductRow) -> Result<Self> {
        let category = Category::from_str(&row.category)
            .map_err(|c| anyhow::anyhow!("Unknown category stored for product {}: {c}", row.id))?;
        let images: Vec<String> = serde_json::from_str(&row.images)
            .with_context(|| format!("Invalid images column for product {}", row.id))?;

        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category,
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    phone_number: String,
    address: String,
    total_amount: f64,
    status: String,
    order_date: DateTime<Utc>,
    telegram_chat_id: Option<i64>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    product_id: String,
    product_name: String,
    product_image: String,
    quantity: i64,
    price: f64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// Open a connection pool, creating the database file and its directory if needed
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:");
    if !in_memory {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {parent:?}"))?;
            }
        }
    }

    // An in-memory database lives and dies with its single connection
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL CHECK (price > 0),
            category TEXT NOT NULL,
            images TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create products table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            address TEXT NOT NULL,
            total_amount REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'Pending',
            order_date TEXT NOT NULL,
            telegram_chat_id INTEGER,
            notes TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create orders table")?;

    // product_id is not a foreign key: products may be deleted later
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id TEXT NOT NULL,
            product_name TEXT NOT NULL,
            product_image TEXT NOT NULL DEFAULT '',
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            price REAL NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create order_items table")?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)",
        "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
        "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create index")?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, images, created_at, updated_at";

fn rows_to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Create a new product
pub async fn create_product(pool: &SqlitePool, new_product: &NewProduct) -> Result<Product> {
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: new_product.name.trim().to_string(),
        description: new_product.description.trim().to_string(),
        price: new_product.price,
        category: new_product.category,
        images: new_product.images.clone(),
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        "INSERT INTO products (id, name, description, price, category, images, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.category.as_str())
    .bind(serde_json::to_string(&product.images)?)
    .bind(product.created_at)
    .execute(pool)
    .await
    .context("Failed to insert product")?;

    info!(product_id = %product.id, "Product created");
    Ok(product)
}

/// All products, newest first
pub async fn get_all_products(pool: &SqlitePool) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch products")?;

    rows_to_products(rows)
}

pub async fn get_product_by_id(pool: &SqlitePool, product_id: &str) -> Result<Option<Product>> {
    debug!(product_id = %product_id, "Reading product");

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read product")?;

    row.map(Product::try_from).transpose()
}

pub async fn get_products_by_category(
    pool: &SqlitePool,
    category: Category,
) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(category.as_str())
    .fetch_all(pool)
    .await
    .context("Failed to fetch products by category")?;

    rows_to_products(rows)
}

/// `LIKE` pattern matching `text` literally anywhere, escaped with `\`
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::from("%");
    for c in text.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Products whose name or description contains `text`
pub async fn search_products(pool: &SqlitePool, text: &str) -> Result<Vec<Product>> {
    let pattern = contains_pattern(text);

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
    .context("Failed to search products")?;

    rows_to_products(rows)
}

/// Products cheaper than `max_price`, cheapest first
pub async fn get_products_by_max_price(pool: &SqlitePool, max_price: f64) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE price < ?1 ORDER BY price ASC"
    ))
    .bind(max_price)
    .fetch_all(pool)
    .await
    .context("Failed to fetch offers")?;

    rows_to_products(rows)
}

/// Merge `update` into an existing product. Returns `None` if it does not exist.
pub async fn update_product(
    pool: &SqlitePool,
    product_id: &str,
    update: &ProductUpdate,
) -> Result<Option<Product>> {
    let Some(existing) = get_product_by_id(pool, product_id).await? else {
        return Ok(None);
    };

    let updated = Product {
        name: update
            .name
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .unwrap_or(existing.name),
        description: update
            .description
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .unwrap_or(existing.description),
        price: update.price.unwrap_or(existing.price),
        category: update.category.unwrap_or(existing.category),
        images: update.images.clone().unwrap_or(existing.images),
        updated_at: Some(Utc::now()),
        ..existing
    };

    sqlx::query(
        "UPDATE products SET name = ?1, description = ?2, price = ?3, category = ?4,
         images = ?5, updated_at = ?6 WHERE id = ?7",
    )
    .bind(&updated.name)
    .bind(&updated.description)
    .bind(updated.price)
    .bind(updated.category.as_str())
    .bind(serde_json::to_string(&updated.images)?)
    .bind(updated.updated_at)
    .bind(product_id)
    .execute(pool)
    .await
    .context("Failed to update product")?;

    info!(product_id = %product_id, "Product updated");
    Ok(Some(updated))
}

pub async fn delete_product(pool: &SqlitePool, product_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(product_id)
        .execute(pool)
        .await
        .context("Failed to delete product")?;

    let deleted = result.rows_affected() > 0;
    info!(product_id = %product_id, deleted, "Product delete requested");
    Ok(deleted)
}

pub async fn count_products(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
        .context("Failed to count products")?;
    Ok(count)
}

/// Insert the reference catalog when the store is empty. Returns the number of products added.
pub async fn seed_initial_products(pool: &SqlitePool) -> Result<usize> {
    if count_products(pool).await? > 0 {
        return Ok(0);
    }

    let seed = crate::seed::initial_products();
    for product in &seed {
        create_product(pool, product).await?;
    }

    info!(count = seed.len(), "Initial products added");
    Ok(seed.len())
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

const ORDER_COLUMNS: &str = "id, customer_name, phone_number, address, total_amount, status, \
                             order_date, telegram_chat_id, notes";

async fn get_order_items(pool: &SqlitePool, order_id: &str) -> Result<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT product_id, product_name, product_image, quantity, price
         FROM order_items WHERE order_id = ?1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch order items")?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

async fn hydrate_order(pool: &SqlitePool, row: OrderRow) -> Result<Order> {
    let status = OrderStatus::from_str(&row.status)
        .map_err(|s| anyhow::anyhow!("Unknown status stored for order {}: {s}", row.id))?;
    let items = get_order_items(pool, &row.id).await?;

    Ok(Order {
        id: row.id,
        customer_name: row.customer_name,
        phone_number: row.phone_number,
        address: row.address,
        items,
        total_amount: row.total_amount,
        status,
        order_date: row.order_date,
        telegram_chat_id: row.telegram_chat_id,
        notes: row.notes,
    })
}

async fn hydrate_orders(pool: &SqlitePool, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(hydrate_order(pool, row).await?);
    }
    Ok(orders)
}

/// Persist an order header and all of its items as one transaction
pub async fn insert_order(pool: &SqlitePool, order: &Order) -> Result<()> {
    info!(order_id = %order.id, items = order.items.len(), "Persisting order");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        "INSERT INTO orders (id, customer_name, phone_number, address, total_amount, status,
         order_date, telegram_chat_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.phone_number)
    .bind(&order.address)
    .bind(order.total_amount)
    .bind(order.status.as_str())
    .bind(order.order_date)
    .bind(order.telegram_chat_id)
    .bind(&order.notes)
    .execute(&mut *tx)
    .await
    .context("Failed to insert order header")?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, product_name, product_image,
             quantity, price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&order.id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_image)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await
        .context("Failed to insert order item")?;
    }

    tx.commit().await.context("Failed to commit order")?;

    info!(order_id = %order.id, "Order persisted");
    Ok(())
}

pub async fn get_order_by_id(pool: &SqlitePool, order_id: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read order")?;

    match row {
        Some(row) => Ok(Some(hydrate_order(pool, row).await?)),
        None => Ok(None),
    }
}

/// All orders, newest first
pub async fn get_all_orders(pool: &SqlitePool) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch orders")?;

    hydrate_orders(pool, rows).await
}

pub async fn get_orders_by_status(pool: &SqlitePool, status: OrderStatus) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1
         ORDER BY order_date DESC, rowid DESC"
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await
    .context("Failed to fetch orders by status")?;

    hydrate_orders(pool, rows).await
}

/// Orders whose customer name or phone number contains `text`
pub async fn search_orders(pool: &SqlitePool, text: &str) -> Result<Vec<Order>> {
    let pattern = contains_pattern(text);

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE customer_name LIKE ?1 ESCAPE '\\' OR phone_number LIKE ?1 ESCAPE '\\'
         ORDER BY order_date DESC, rowid DESC"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
    .context("Failed to search orders")?;

    hydrate_orders(pool, rows).await
}

/// Move an order to `status`, refusing to go backwards
pub async fn update_order_status(
    pool: &SqlitePool,
    order_id: &str,
    status: OrderStatus,
) -> Result<StatusUpdate> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read order status")?;

    let Some(current) = current else {
        return Ok(StatusUpdate::NotFound);
    };
    let current = OrderStatus::from_str(&current)
        .map_err(|s| anyhow::anyhow!("Unknown status stored for order {order_id}: {s}"))?;

    if !current.can_move_to(status) {
        info!(order_id = %order_id, %current, requested = %status, "Status regression rejected");
        return Ok(StatusUpdate::Rejected { current });
    }

    sqlx::query("UPDATE orders SET status = ?1 WHERE id = ?2")
        .bind(status.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update order status")?;

    tx.commit().await.context("Failed to commit status update")?;

    info!(order_id = %order_id, %status, "Order status updated");
    Ok(StatusUpdate::Updated)
}

/// Delete an order and its items
pub async fn delete_order(pool: &SqlitePool, order_id: &str) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete order items")?;

    let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete order")?;

    tx.commit().await.context("Failed to commit order deletion")?;

    let deleted = result.rows_affected() > 0;
    info!(order_id = %order_id, deleted, "Order delete requested");
    Ok(deleted)
}

pub async fn count_orders(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .context("Failed to count orders")?;
    Ok(count)
}

pub async fn count_order_items(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(pool)
        .await
        .context("Failed to count order items")?;
    Ok(count)
}
