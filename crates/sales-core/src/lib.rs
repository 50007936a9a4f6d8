//! # Sales Core
//!
//! Core types shared by every crate of the Sales API.
//!
//! - [`errors`]: the application error type and its HTTP response mapping
//!
//! # Example
//!
//! ```ignore
//! use sales_core::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Purchase not found"));
//! ```

pub mod errors;

pub use errors::AppError;
