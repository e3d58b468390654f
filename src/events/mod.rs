use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by commands after their writes commit.
///
/// These feed the logging consumer only; no business logic subscribes to
/// them. Stock reconciliation happens inside the state-transition commands
/// themselves, never in reaction to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Quote events
    QuoteCreated(Uuid),
    QuoteUpdated(Uuid),
    QuoteApproved(Uuid),
    QuoteRejected(Uuid),
    QuoteExpired(Uuid),

    // Service order events
    ServiceOrderCreated {
        order_id: Uuid,
        quote_id: Uuid,
    },
    ServiceOrderStarted(Uuid),
    ServiceOrderOnHold(Uuid),
    ServiceOrderConcluded(Uuid),
    ServiceOrderCancelled(Uuid),

    // Part usage events
    PartAddedToOrder {
        order_id: Uuid,
        part_id: Uuid,
        quantity: i32,
    },
    PartRemovedFromOrder {
        order_id: Uuid,
        part_id: Uuid,
    },
    PartUsageConfirmed {
        order_id: Uuid,
        part_id: Uuid,
        quantity: i32,
    },
    PartUsageReverted {
        order_id: Uuid,
        part_id: Uuid,
        quantity: i32,
    },

    // Stock ledger events
    StockAdjusted {
        part_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
    info!("event channel closed, stopping event processor");
}
