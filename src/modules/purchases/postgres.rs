use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::model::{FieldUpdate, NewPurchase, Purchase};
use super::store::{PurchaseStore, PurchaseTransaction, StoreResult};

#[derive(Debug, Clone)]
pub struct PgPurchaseStore {
    pool: PgPool,
}

impl PgPurchaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn insert(&self, purchase: &NewPurchase) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO purchases (owner_id, product_id, price, quantity, removed)
             VALUES ($1, $2, $3, $4, FALSE)
             RETURNING id",
        )
        .bind(purchase.owner_id)
        .bind(purchase.product_id)
        .bind(purchase.price)
        .bind(purchase.quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_active(&self, id: i64) -> StoreResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(
            "SELECT id, owner_id, product_id, price, quantity, purchase_date, removed
             FROM purchases
             WHERE id = $1 AND removed = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    async fn list_active(&self) -> StoreResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT id, owner_id, product_id, price, quantity, purchase_date, removed
             FROM purchases
             WHERE removed = FALSE
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    async fn list_active_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT id, owner_id, product_id, price, quantity, purchase_date, removed
             FROM purchases
             WHERE owner_id = $1 AND removed = FALSE
             ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    async fn mark_removed(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE purchases SET removed = TRUE WHERE id = $1 AND removed = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn begin(&self) -> StoreResult<Box<dyn PurchaseTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPurchaseTransaction { tx }))
    }
}

pub struct PgPurchaseTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PurchaseTransaction for PgPurchaseTransaction {
    async fn touch_purchase_date(&mut self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE purchases SET purchase_date = NOW() WHERE id = $1 AND removed = FALSE",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn apply(&mut self, id: i64, update: FieldUpdate) -> StoreResult<u64> {
        let query = match update {
            FieldUpdate::Quantity(quantity) => {
                sqlx::query("UPDATE purchases SET quantity = $2 WHERE id = $1").bind(id).bind(quantity)
            }
            FieldUpdate::Price(price) => {
                sqlx::query("UPDATE purchases SET price = $2 WHERE id = $1").bind(id).bind(price)
            }
            FieldUpdate::ProductId(product_id) => {
                sqlx::query("UPDATE purchases SET product_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(product_id)
            }
        };

        let result = query.execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
