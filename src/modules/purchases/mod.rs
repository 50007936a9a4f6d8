pub mod controller;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod model;
pub mod postgres;
pub mod router;
pub mod service;
pub mod store;

pub use model::*;
pub use router::init_purchases_router;
pub use store::{PurchaseStore, PurchaseTransaction};
