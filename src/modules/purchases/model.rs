use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use sales_core::AppError;

/// Wire value meaning "leave this field as it is".
pub const UNCHANGED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Purchase {
    pub id: i64,
    pub owner_id: i64,
    pub product_id: i64,
    pub price: i32,
    pub quantity: i32,
    pub purchase_date: DateTime<Utc>,
    pub removed: bool,
}

/// A purchase about to be inserted. The owner always comes from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub owner_id: i64,
    pub product_id: i64,
    pub price: i32,
    pub quantity: i32,
}

/// Columns a sparse update may touch besides `purchase_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    PurchaseDate,
    Quantity,
    Price,
    ProductId,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::PurchaseDate => "purchase_date",
            Column::Quantity => "quantity",
            Column::Price => "price",
            Column::ProductId => "product_id",
        }
    }
}

/// A single column write inside a sparse update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    Quantity(i32),
    Price(i32),
    ProductId(i64),
}

impl FieldUpdate {
    pub fn column(&self) -> Column {
        match self {
            FieldUpdate::Quantity(_) => Column::Quantity,
            FieldUpdate::Price(_) => Column::Price,
            FieldUpdate::ProductId(_) => Column::ProductId,
        }
    }
}

/// Fields to change on an existing purchase. `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchasePatch {
    pub quantity: Option<i32>,
    pub price: Option<i32>,
    pub product_id: Option<i64>,
}

impl PurchasePatch {
    /// Column writes in the order they are applied: quantity, price, product.
    pub fn updates(&self) -> impl Iterator<Item = FieldUpdate> + use<> {
        [
            self.quantity.map(FieldUpdate::Quantity),
            self.price.map(FieldUpdate::Price),
            self.product_id.map(FieldUpdate::ProductId),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.updates().next().is_none()
    }
}

fn unchanged_i32() -> i32 {
    UNCHANGED
}

fn unchanged_i64() -> i64 {
    i64::from(UNCHANGED)
}

/// Body of `POST /purchases/{id}`.
///
/// `-1` (or an absent field) means "do not modify" on update. On create
/// every field is required.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SavePurchaseDto {
    /// Ignored: the owner is always the authenticated caller
    #[serde(default, alias = "user_id")]
    pub owner_id: Option<i64>,
    #[serde(default = "unchanged_i64")]
    #[validate(range(min = -1))]
    pub product_id: i64,
    #[serde(default = "unchanged_i32")]
    #[validate(range(min = -1))]
    pub price: i32,
    #[serde(default = "unchanged_i32")]
    #[validate(range(min = -1))]
    pub quantity: i32,
}

impl SavePurchaseDto {
    pub fn into_new_purchase(self, owner_id: i64) -> Result<NewPurchase, AppError> {
        let patch = self.into_patch()?;

        match (patch.product_id, patch.price, patch.quantity) {
            (Some(product_id), Some(price), Some(quantity)) => Ok(NewPurchase {
                owner_id,
                product_id,
                price,
                quantity,
            }),
            _ => Err(AppError::bad_request(anyhow!(
                "product_id, price and quantity are required"
            ))),
        }
    }

    pub fn into_patch(self) -> Result<PurchasePatch, AppError> {
        if self.quantity == 0 {
            return Err(AppError::bad_request(anyhow!("quantity must be positive")));
        }

        Ok(PurchasePatch {
            quantity: (self.quantity != UNCHANGED).then_some(self.quantity),
            price: (self.price != UNCHANGED).then_some(self.price),
            product_id: (self.product_id != i64::from(UNCHANGED)).then_some(self.product_id),
        })
    }
}
