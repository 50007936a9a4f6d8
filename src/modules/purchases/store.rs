//! Persistence seam for purchases.
//!
//! The service only talks to these traits. [`PgPurchaseStore`] is the
//! production implementation; an in-memory one backs tests.
//!
//! [`PgPurchaseStore`]: super::postgres::PgPurchaseStore

use async_trait::async_trait;

use super::model::{FieldUpdate, NewPurchase, Purchase};

pub type StoreResult<T> = anyhow::Result<T>;

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Inserts an active purchase and returns its id.
    async fn insert(&self, purchase: &NewPurchase) -> StoreResult<i64>;

    async fn find_active(&self, id: i64) -> StoreResult<Option<Purchase>>;

    /// Every active purchase ordered by id.
    async fn list_active(&self) -> StoreResult<Vec<Purchase>>;

    async fn list_active_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Purchase>>;

    /// Flags an active purchase as removed. Returns the number of rows changed.
    async fn mark_removed(&self, id: i64) -> StoreResult<u64>;

    async fn begin(&self) -> StoreResult<Box<dyn PurchaseTransaction>>;
}

/// Statements issued by a sparse update.
///
/// Nothing is visible to other readers until [`commit`](Self::commit).
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait PurchaseTransaction: Send {
    /// Refreshes `purchase_date` on an active purchase. Returns rows touched.
    async fn touch_purchase_date(&mut self, id: i64) -> StoreResult<u64>;

    async fn apply(&mut self, id: i64, update: FieldUpdate) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
