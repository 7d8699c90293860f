//! # Order Storage Seams
//!
//! Where a recalculation job reads orders from and writes snapshots to.
//! Production wires these to the database; [`InMemoryStore`] backs the CLI
//! and tests.

use async_trait::async_trait;
use margin_core::{FinancialSnapshot, Order};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::RecalcResult;

/// Source of orders to recalculate.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// All orders of a tenant, in a stable order.
    async fn load_orders(&self, tenant_id: &str) -> RecalcResult<Vec<Order>>;
}

/// Destination of computed snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Stores one batch; replaces earlier snapshots of the same orders.
    async fn store_snapshots(&self, snapshots: Vec<FinancialSnapshot>) -> RecalcResult<()>;
}

/// Orders and snapshots held in memory.
#[derive(Default)]
pub struct InMemoryStore {
    orders: RwLock<Vec<Order>>,
    snapshots: RwLock<HashMap<String, FinancialSnapshot>>,
    batches: RwLock<usize>,
}

impl InMemoryStore {
    pub fn new(orders: Vec<Order>) -> Self {
        InMemoryStore {
            orders: RwLock::new(orders),
            ..Default::default()
        }
    }

    pub async fn insert_order(&self, order: Order) {
        self.orders.write().await.push(order);
    }

    pub async fn snapshot(&self, order_id: &str) -> Option<FinancialSnapshot> {
        self.snapshots.read().await.get(order_id).cloned()
    }

    /// Stored snapshots in the order their orders were loaded.
    pub async fn snapshots(&self) -> Vec<FinancialSnapshot> {
        let orders = self.orders.read().await;
        let snapshots = self.snapshots.read().await;
        orders
            .iter()
            .filter_map(|o| snapshots.get(&o.id).cloned())
            .collect()
    }

    /// Number of `store_snapshots` calls received.
    pub async fn batch_count(&self) -> usize {
        *self.batches.read().await
    }
}

#[async_trait]
impl OrderSource for InMemoryStore {
    async fn load_orders(&self, tenant_id: &str) -> RecalcResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| o.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SnapshotSink for InMemoryStore {
    async fn store_snapshots(&self, snapshots: Vec<FinancialSnapshot>) -> RecalcResult<()> {
        let mut stored = self.snapshots.write().await;
        for snapshot in snapshots {
            stored.insert(snapshot.order_id.clone(), snapshot);
        }
        *self.batches.write().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(id: &str, tenant: &str) -> Order {
        serde_json::from_value(json!({ "id": id, "tenant_id": tenant })).unwrap()
    }

    #[tokio::test]
    async fn test_load_filters_by_tenant() {
        let store = InMemoryStore::new(vec![order("a", "t1"), order("b", "t2")]);
        store.insert_order(order("c", "t1")).await;

        let ids: Vec<String> = store
            .load_orders("t1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_store_replaces_snapshots() {
        let store = InMemoryStore::new(vec![order("a", "t1")]);
        let settings = margin_core::MarginSettings::default();
        let ctx = margin_core::ComputeContext::new(&settings, &[]);
        let snap = margin_core::compute(&order("a", "t1"), &ctx);

        store.store_snapshots(vec![snap.clone()]).await.unwrap();
        store.store_snapshots(vec![snap.clone()]).await.unwrap();

        assert_eq!(store.snapshots().await, vec![snap]);
        assert_eq!(store.batch_count().await, 2);
        assert!(store.snapshot("missing").await.is_none());
    }
}
