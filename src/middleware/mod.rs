//! Request pipeline stages.
//!
//! Every protected route is wrapped by a [`chain::Chain`] whose stages run
//! outermost-first:
//!
//! 1. observe: request id, access log, metrics ([`crate::logging`])
//! 2. identify: decode the bearer token into an [`Identity`](sales_auth::Identity)
//!    and publish it in the request extensions ([`identity`])
//! 3. authenticate: reject with 401 when nothing was published ([`auth`])
//! 4. authorize: reject with 403 unless a role is on the allow-list ([`role`])
//!
//! # Example
//!
//! ```ignore
//! use axum::routing::get;
//! use sales_auth::AllowList;
//!
//! let list = Chain::new()
//!     .observe("get list")
//!     .identify()
//!     .authenticate()
//!     .authorize(AllowList::admin())
//!     .apply(get(list_purchases), &state.jwt_config)?;
//! ```

pub mod auth;
pub mod chain;
pub mod identity;
pub mod role;
