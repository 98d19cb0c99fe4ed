//! Order persistence collaborator.
//!
//! The webhook only ever moves an order to paid. Providers redeliver
//! notifications, so implementations must make that transition idempotent.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::OrderStoreError;

/// Result of a mark-as-paid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaid {
    /// The order moved to paid.
    Marked,
    /// The order was already paid; nothing changed.
    AlreadyPaid,
}

/// Payment state of an order as seen by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    Paid,
}

/// Storage backend for order payment state.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Record the order as paid. Must be safe to call repeatedly.
    async fn mark_order_paid(&self, order_id: &str) -> Result<MarkPaid, OrderStoreError>;
}

/// In-process order store.
///
/// Marking an unknown order id paid records it directly in the paid state.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, OrderState>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an order awaiting payment.
    pub async fn insert_pending(&self, order_id: impl Into<String>) {
        self.orders
            .write()
            .await
            .entry(order_id.into())
            .or_insert(OrderState::Pending);
    }

    pub async fn order_state(&self, order_id: &str) -> Option<OrderState> {
        self.orders.read().await.get(order_id).copied()
    }

    pub async fn paid_count(&self) -> usize {
        self.orders
            .read()
            .await
            .values()
            .filter(|s| **s == OrderState::Paid)
            .count()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn mark_order_paid(&self, order_id: &str) -> Result<MarkPaid, OrderStoreError> {
        let mut orders = self.orders.write().await;

        let state = orders
            .entry(order_id.to_string())
            .or_insert(OrderState::Pending);

        if *state == OrderState::Paid {
            info!(order_id = %order_id, "order_already_paid");
            return Ok(MarkPaid::AlreadyPaid);
        }

        *state = OrderState::Paid;
        info!(order_id = %order_id, "order_marked_paid");

        Ok(MarkPaid::Marked)
    }
}
