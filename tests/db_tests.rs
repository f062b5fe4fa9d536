use anyhow::Result;
use chrono::Utc;
use elegance_store::db::{self, StatusUpdate};
use elegance_store::models::{
    Category, NewProduct, Order, OrderItem, OrderStatus, ProductUpdate,
};
use sqlx::SqlitePool;

async fn setup_test_db() -> Result<SqlitePool> {
    let pool = db::connect("sqlite::memory:").await?;
    db::init_database_schema(&pool).await?;
    Ok(pool)
}

fn new_product(name: &str, price: f64, category: Category) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} made of stainless steel"),
        price,
        category,
        images: vec![format!("https://img.example/{}.jpg", name.replace(' ', "-"))],
    }
}

fn order_with_items(id: &str, items: Vec<OrderItem>) -> Order {
    Order {
        id: id.to_string(),
        customer_name: "Mona".to_string(),
        phone_number: "01001234567".to_string(),
        address: "12 Nasr St, Cairo".to_string(),
        total_amount: Order::items_total(&items),
        items,
        status: OrderStatus::Pending,
        order_date: Utc::now(),
        telegram_chat_id: Some(42),
        notes: None,
    }
}

fn item(product_id: &str, quantity: i64, price: f64) -> OrderItem {
    OrderItem {
        product_id: product_id.to_string(),
        product_name: "Ring".to_string(),
        product_image: "ring.jpg".to_string(),
        quantity,
        price,
    }
}

/// Schema creation can run twice on the same database
#[tokio::test]
async fn test_schema_is_idempotent() -> Result<()> {
    let pool = setup_test_db().await?;
    db::init_database_schema(&pool).await?;
    assert_eq!(db::count_products(&pool).await?, 0);
    Ok(())
}

/// Products round-trip through the store with their images in order
#[tokio::test]
async fn test_product_crud() -> Result<()> {
    let pool = setup_test_db().await?;

    let mut payload = new_product("Gold Ring", 220.0, Category::Rings);
    payload.images.push("second.jpg".to_string());
    let created = db::create_product(&pool, &payload).await?;

    let fetched = db::get_product_by_id(&pool, &created.id).await?.expect("product exists");
    assert_eq!(fetched.name, "Gold Ring");
    assert_eq!(fetched.category, Category::Rings);
    assert_eq!(fetched.images.len(), 2);
    assert_eq!(fetched.images[1], "second.jpg");
    assert!(fetched.updated_at.is_none());

    let update = ProductUpdate {
        price: Some(199.5),
        ..ProductUpdate::default()
    };
    let updated = db::update_product(&pool, &created.id, &update).await?.expect("product exists");
    assert_eq!(updated.price, 199.5);
    assert_eq!(updated.name, "Gold Ring");
    assert!(updated.updated_at.is_some());

    assert!(db::update_product(&pool, "missing", &update).await?.is_none());

    assert!(db::delete_product(&pool, &created.id).await?);
    assert!(!db::delete_product(&pool, &created.id).await?);
    assert!(db::get_product_by_id(&pool, &created.id).await?.is_none());

    Ok(())
}

/// Category, search and offer queries
#[tokio::test]
async fn test_catalog_queries() -> Result<()> {
    let pool = setup_test_db().await?;

    db::create_product(&pool, &new_product("Silver Ring", 220.0, Category::Rings)).await?;
    db::create_product(&pool, &new_product("Moon Necklace", 180.0, Category::Necklaces)).await?;
    db::create_product(&pool, &new_product("Star Earrings", 150.0, Category::Earrings)).await?;

    let all = db::get_all_products(&pool).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "Star Earrings", "newest product comes first");

    let rings = db::get_products_by_category(&pool, Category::Rings).await?;
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].name, "Silver Ring");

    let found = db::search_products(&pool, "moon").await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].category, Category::Necklaces);

    // Description matches count too
    let steel = db::search_products(&pool, "stainless").await?;
    assert_eq!(steel.len(), 3);

    let offers = db::get_products_by_max_price(&pool, 200.0).await?;
    let prices: Vec<f64> = offers.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![150.0, 180.0]);

    Ok(())
}

/// LIKE wildcards in search text are matched literally
#[tokio::test]
async fn test_search_treats_wildcards_literally() -> Result<()> {
    let pool = setup_test_db().await?;

    db::create_product(&pool, &new_product("Silver Ring", 220.0, Category::Rings)).await?;
    db::create_product(&pool, &new_product("Ring 100% steel", 90.0, Category::Rings)).await?;

    assert!(db::search_products(&pool, "_").await?.is_empty());
    assert_eq!(db::search_products(&pool, "%").await?.len(), 1);
    assert_eq!(db::search_products(&pool, "100%").await?[0].name, "Ring 100% steel");
    assert!(db::search_products(&pool, "\\").await?.is_empty());

    db::insert_order(&pool, &order_with_items("order-w", vec![item("p1", 1, 100.0)])).await?;
    assert!(db::search_orders(&pool, "_").await?.is_empty());
    assert!(db::search_orders(&pool, "%").await?.is_empty());
    assert_eq!(db::search_orders(&pool, "Mona").await?.len(), 1);

    Ok(())
}

/// Seeding only fills an empty catalog
#[tokio::test]
async fn test_seed_initial_products() -> Result<()> {
    let pool = setup_test_db().await?;

    assert_eq!(db::seed_initial_products(&pool).await?, 6);
    assert_eq!(db::seed_initial_products(&pool).await?, 0);
    assert_eq!(db::count_products(&pool).await?, 6);

    Ok(())
}

/// Orders are stored with their item snapshots
#[tokio::test]
async fn test_insert_and_read_order() -> Result<()> {
    let pool = setup_test_db().await?;

    let order = order_with_items("order-1", vec![item("p1", 2, 150.0), item("p2", 1, 90.0)]);
    db::insert_order(&pool, &order).await?;

    let stored = db::get_order_by_id(&pool, "order-1").await?.expect("order exists");
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.total_amount, 390.0);
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.telegram_chat_id, Some(42));
    assert_eq!(stored.items[0].product_id, "p1");

    Ok(())
}

/// Repeated reads without writes return the same order
#[tokio::test]
async fn test_order_reads_are_idempotent() -> Result<()> {
    let pool = setup_test_db().await?;
    db::insert_order(&pool, &order_with_items("order-r", vec![item("p1", 2, 75.0)])).await?;

    let first = db::get_order_by_id(&pool, "order-r").await?;
    let second = db::get_order_by_id(&pool, "order-r").await?;
    assert!(first.is_some());
    assert_eq!(first, second);

    assert_eq!(db::get_all_orders(&pool).await?, db::get_all_orders(&pool).await?);
    assert_eq!(db::get_order_by_id(&pool, "missing").await?, None);

    Ok(())
}

/// A failing item insert leaves neither header nor items behind
#[tokio::test]
async fn test_order_insert_rolls_back_on_item_failure() -> Result<()> {
    let pool = setup_test_db().await?;

    // quantity 0 violates the order_items CHECK constraint
    let order = order_with_items("broken", vec![item("p1", 1, 150.0), item("p2", 0, 90.0)]);
    assert!(db::insert_order(&pool, &order).await.is_err());

    assert!(db::get_order_by_id(&pool, "broken").await?.is_none());
    assert_eq!(db::count_orders(&pool).await?, 0);
    assert_eq!(db::count_order_items(&pool).await?, 0);

    Ok(())
}

/// Order items keep their snapshot after the product is deleted
#[tokio::test]
async fn test_order_survives_product_deletion() -> Result<()> {
    let pool = setup_test_db().await?;

    let product = db::create_product(&pool, &new_product("Black Ring", 190.0, Category::Rings)).await?;
    let order = order_with_items("order-2", vec![OrderItem::snapshot(&product, 1)]);
    db::insert_order(&pool, &order).await?;

    db::delete_product(&pool, &product.id).await?;

    let stored = db::get_order_by_id(&pool, "order-2").await?.expect("order exists");
    assert_eq!(stored.items[0].product_name, "Black Ring");
    assert_eq!(stored.items[0].price, 190.0);

    Ok(())
}

/// Status may stay or move forward, never back
#[tokio::test]
async fn test_status_updates_are_monotonic() -> Result<()> {
    let pool = setup_test_db().await?;
    db::insert_order(&pool, &order_with_items("order-3", vec![item("p1", 1, 100.0)])).await?;

    assert_eq!(
        db::update_order_status(&pool, "order-3", OrderStatus::Shipped).await?,
        StatusUpdate::Updated
    );
    assert_eq!(
        db::update_order_status(&pool, "order-3", OrderStatus::Shipped).await?,
        StatusUpdate::Updated
    );
    assert_eq!(
        db::update_order_status(&pool, "order-3", OrderStatus::Processed).await?,
        StatusUpdate::Rejected {
            current: OrderStatus::Shipped
        }
    );
    assert_eq!(
        db::update_order_status(&pool, "missing", OrderStatus::Delivered).await?,
        StatusUpdate::NotFound
    );

    let shipped = db::get_orders_by_status(&pool, OrderStatus::Shipped).await?;
    assert_eq!(shipped.len(), 1);
    assert!(db::get_orders_by_status(&pool, OrderStatus::Pending).await?.is_empty());

    Ok(())
}

/// Order search matches customer name or phone
#[tokio::test]
async fn test_search_orders() -> Result<()> {
    let pool = setup_test_db().await?;

    let mut other = order_with_items("order-b", vec![item("p1", 1, 100.0)]);
    other.customer_name = "Ahmed".to_string();
    other.phone_number = "01112345678".to_string();
    db::insert_order(&pool, &order_with_items("order-a", vec![item("p1", 1, 100.0)])).await?;
    db::insert_order(&pool, &other).await?;

    assert_eq!(db::search_orders(&pool, "Ahmed").await?.len(), 1);
    assert_eq!(db::search_orders(&pool, "0100").await?[0].id, "order-a");
    assert_eq!(db::get_all_orders(&pool).await?.len(), 2);

    Ok(())
}

/// Deleting an order removes its items
#[tokio::test]
async fn test_delete_order_removes_items() -> Result<()> {
    let pool = setup_test_db().await?;
    db::insert_order(&pool, &order_with_items("order-4", vec![item("p1", 3, 10.0)])).await?;

    assert!(db::delete_order(&pool, "order-4").await?);
    assert!(!db::delete_order(&pool, "order-4").await?);
    assert_eq!(db::count_order_items(&pool).await?, 0);

    Ok(())
}
