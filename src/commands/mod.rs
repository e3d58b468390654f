use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// Each business operation is encapsulated in a single object that can be
/// validated, executed, and produce events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod inventory;
pub mod quotes;
pub mod service_orders;
