use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use super::config::SystemConfig;
use crate::actor_framework::ResourceActor;
use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::domain::{Order, Product, User};
use crate::repository::{OrderRepository, ProductRepository};
use crate::services::{InventoryService, OrderService};

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them into the workflow services, and
/// handling shutdown.
pub struct OrderSystem {
    pub order_client: OrderClient,
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub inventory: InventoryService,
    pub order_service: OrderService,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    /// Starts one actor per store and wires the in-process clients into the services.
    pub fn new(config: &SystemConfig) -> Self {
        let (user_actor, user_resource_client) = ResourceActor::<User>::new(config.actor_buffer, next_id);
        let user_client = UserClient::new(user_resource_client);
        let user_handle = tokio::spawn(user_actor.run());

        let (product_actor, product_resource_client) =
            ResourceActor::<Product>::new(config.actor_buffer, next_id);
        let product_client = ProductClient::new(product_resource_client);
        let product_handle = tokio::spawn(product_actor.run());

        let (order_actor, order_resource_client) = ResourceActor::<Order>::new(config.actor_buffer, next_id);
        let order_client = OrderClient::new(order_resource_client);
        let order_handle = tokio::spawn(order_actor.run());

        let order_service = Self::build_service(
            config,
            Arc::new(order_client.clone()),
            Arc::new(product_client.clone()),
        )
        .with_users(Arc::new(user_client.clone()));
        let inventory = order_service.inventory().clone();

        info!(buffer = config.actor_buffer, "Order system started");

        Self {
            order_client,
            user_client,
            product_client,
            inventory,
            order_service,
            handles: vec![user_handle, product_handle, order_handle],
        }
    }

    /// Workflow over arbitrary stores, e.g. the relational ones.
    pub fn build_service(
        config: &SystemConfig,
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> OrderService {
        OrderService::new(orders, products).with_default_timeout(config.request_timeout)
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        // Actors stop once every sender is gone, including the ones held by the services.
        drop(self.order_service);
        drop(self.inventory);
        drop(self.order_client);
        drop(self.user_client);
        drop(self.product_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
