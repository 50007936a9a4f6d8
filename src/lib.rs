//! # Sales API
//!
//! A REST API for purchase records built with Axum and PostgreSQL. Every
//! route runs behind a composable chain of request stages, and updates are
//! applied as transactional sparse patches.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── cli.rs           # Command line (serve, issue-token)
//! ├── middleware/      # Identity extraction, guards, stage chain
//! ├── modules/
//! │   └── purchases/   # Model, store, service, controller, router
//! ├── logging.rs       # Tracing setup and the observe stage
//! ├── metrics.rs       # Prometheus exporter and counters
//! ├── docs.rs          # OpenAPI document
//! ├── router.rs        # Application router
//! ├── state.rs         # Shared state
//! └── validator.rs     # Validated JSON extractor
//! ```
//!
//! Shared pieces live in workspace crates:
//!
//! - `sales-core`: [`AppError`](sales_core::AppError)
//! - `sales-config`: environment configuration
//! - `sales-auth`: claims, identity, allow-lists, JWT
//! - `sales-db`: connection pool
//!
//! ## Request pipeline
//!
//! ```text
//! observe -> identify -> authenticate -> authorize -> handler
//! ```
//!
//! A request without a verified identity is answered with 401 before any
//! role check can answer 403.
//!
//! ## Sparse updates
//!
//! `POST /api/purchases/{id}` with `id > 0` refreshes `purchase_date` and
//! writes only the fields not set to `-1`, in one transaction.

pub mod cli;
pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;
