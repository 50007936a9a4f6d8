use anyhow::anyhow;
use tracing::instrument;

use sales_core::AppError;

use crate::metrics;
use crate::modules::purchases::model::{NewPurchase, Purchase, PurchasePatch};
use crate::modules::purchases::store::{PurchaseStore, PurchaseTransaction};

pub struct PurchaseService;

impl PurchaseService {
    #[instrument(skip(store))]
    pub async fn create(store: &dyn PurchaseStore, purchase: NewPurchase) -> Result<i64, AppError> {
        let id = store.insert(&purchase).await.map_err(AppError::database)?;

        metrics::track_purchase_created();
        tracing::info!(purchase_id = id, owner_id = purchase.owner_id, "Purchase created");

        Ok(id)
    }

    #[instrument(skip(store))]
    pub async fn get_by_id(store: &dyn PurchaseStore, id: i64) -> Result<Purchase, AppError> {
        store
            .find_active(id)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Purchase not found")))
    }

    #[instrument(skip(store))]
    pub async fn list(store: &dyn PurchaseStore) -> Result<Vec<Purchase>, AppError> {
        store.list_active().await.map_err(AppError::database)
    }

    #[instrument(skip(store))]
    pub async fn list_by_owner(
        store: &dyn PurchaseStore,
        owner_id: i64,
    ) -> Result<Vec<Purchase>, AppError> {
        store
            .list_active_by_owner(owner_id)
            .await
            .map_err(AppError::database)
    }

    /// Flags the purchase as removed. Repeating the call, or naming an id
    /// that never existed, is not an error.
    #[instrument(skip(store))]
    pub async fn soft_delete(store: &dyn PurchaseStore, id: i64) -> Result<(), AppError> {
        let changed = store.mark_removed(id).await.map_err(AppError::database)?;

        if changed == 0 {
            tracing::debug!(purchase_id = id, "Soft delete changed nothing");
        } else {
            tracing::info!(purchase_id = id, "Purchase removed");
        }
        metrics::track_purchase_removed(changed > 0);

        Ok(())
    }

    /// Refreshes `purchase_date` and writes every field present in `patch`
    /// inside one transaction.
    ///
    /// Statement order is fixed: date, quantity, price, product. Any failure
    /// rolls the whole update back; so does dropping the returned future.
    #[instrument(skip(store))]
    pub async fn sparse_update(
        store: &dyn PurchaseStore,
        id: i64,
        patch: PurchasePatch,
    ) -> Result<(), AppError> {
        let mut tx = store.begin().await.map_err(AppError::database)?;

        match Self::apply_patch(&mut tx, id, &patch).await {
            Ok(()) => {
                tx.commit().await.map_err(AppError::database)?;
                metrics::track_purchase_updated(patch.updates().count());
                tracing::info!(purchase_id = id, "Purchase updated");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        purchase_id = id,
                        error = ?rollback_err,
                        "Failed to roll back purchase update"
                    );
                }
                Err(err)
            }
        }
    }

    async fn apply_patch(
        tx: &mut Box<dyn PurchaseTransaction>,
        id: i64,
        patch: &PurchasePatch,
    ) -> Result<(), AppError> {
        let touched = tx
            .touch_purchase_date(id)
            .await
            .map_err(AppError::database)?;
        if touched == 0 {
            return Err(AppError::not_found(anyhow!("Purchase not found")));
        }

        for update in patch.updates() {
            tx.apply(id, update).await.map_err(AppError::database)?;
        }

        Ok(())
    }
}
