use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use foodstore_orders::app_system::{setup_tracing, OrderSystem, SystemConfig};
use foodstore_orders::domain::{OrderRequest, ProductCreate, UserCreate};
use foodstore_orders::repository::{ProductRepository, UserRepository};
use foodstore_orders::services::OrderService;

/// Places an order, reads it back, cancels it and lists the user's orders.
async fn run_lifecycle(
    service: &OrderService,
    products: &dyn ProductRepository,
    user_id: &str,
) -> Result<(), String> {
    let product_id = async {
        info!("Creating test product");
        products
            .create(ProductCreate {
                name: "Margherita".to_string(),
                price: Decimal::new(850, 2),
                stock: 10,
            })
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("product_creation"))
    .await?;
    info!(product_id = %product_id, "Product created successfully");

    let request = OrderRequest::new(user_id).item(product_id.clone(), 3);
    let order_id = async {
        info!("Processing order through order workflow");
        service.create_order(request).await
    }
    .instrument(tracing::info_span!("order_processing"))
    .await
    .map_err(|e| e.to_string())?;

    let order = service.get_order(&order_id).await.map_err(|e| e.to_string())?;
    info!(order_id = %order.id, total = %order.total_price, status = %order.status, "Order placed");
    match serde_json::to_string(&order) {
        Ok(json) => info!(order = %json, "Order as returned to callers"),
        Err(e) => error!(error = %e, "Failed to encode order"),
    }

    // More than is left: rejected without touching stock
    match service
        .create_order(OrderRequest::new(user_id).item(product_id.clone(), 50))
        .await
    {
        Ok(id) => error!(order_id = %id, "Oversized order was accepted"),
        Err(e) => info!(code = e.code(), error = %e, "Oversized order rejected"),
    }

    async {
        service
            .update_order_status(&order_id, "cancelled")
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("order_cancellation"))
    .await?;

    let product = products.get(&product_id).await.map_err(|e| e.to_string())?;
    info!(stock = product.stock, "Stock after cancellation");

    let orders = service
        .get_orders_by_user_id(user_id)
        .await
        .map_err(|e| e.to_string())?;
    info!(count = orders.len(), "Orders of user");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_on_postgres(config: &SystemConfig, url: &str) -> Result<(), String> {
    use foodstore_orders::repository::postgres::{init_schema, PgOrderRepository, PgProductRepository};
    use std::sync::Arc;

    let pool = sqlx::PgPool::connect(url).await.map_err(|e| e.to_string())?;
    init_schema(&pool).await.map_err(|e| e.to_string())?;
    info!("Connected to Postgres");

    let products = Arc::new(PgProductRepository::new(pool.clone()));
    let orders = Arc::new(PgOrderRepository::new(pool));
    let service = OrderSystem::build_service(config, orders, products.clone());
    run_lifecycle(&service, products.as_ref(), "demo-user").await
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = SystemConfig::from_env().map_err(|e| e.to_string())?;
    info!(
        buffer = config.actor_buffer,
        timeout = ?config.request_timeout,
        "Starting food order system"
    );

    #[cfg(feature = "postgres")]
    if let Some(url) = config.database_url.clone() {
        return run_on_postgres(&config, &url).await;
    }

    let system = OrderSystem::new(&config);

    let user_id = async {
        info!("Creating test user");
        system
            .user_client
            .create(UserCreate::new("alice", "alice@example.com", "Alice Liddell"))
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("user_creation"))
    .await?;
    info!(user_id = %user_id, "User created successfully");

    let result = run_lifecycle(&system.order_service, &system.product_client, &user_id).await;
    if let Err(e) = &result {
        error!(error = %e, "Order lifecycle failed");
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    result
}
