pub mod common;
pub mod health;
pub mod parts;
pub mod quotes;
pub mod service_orders;
pub mod users;
pub mod vehicles;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub parts: Arc<crate::services::parts::PartService>,
    pub quotes: Arc<crate::services::quotes::QuoteService>,
    pub service_orders: Arc<crate::services::service_orders::ServiceOrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let parts = Arc::new(crate::services::parts::PartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let quotes = Arc::new(crate::services::quotes::QuoteService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let service_orders = Arc::new(crate::services::service_orders::ServiceOrderService::new(
            db_pool,
            event_sender,
        ));

        Self {
            parts,
            quotes,
            service_orders,
        }
    }
}
