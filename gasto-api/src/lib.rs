//! gasto-api: HTTP client for the GastoSmart backend (statistics, transactions, recommendations)

pub mod auth;
pub mod error;
pub mod normalize;
pub mod client;

pub use auth::AuthContext;
pub use error::{ApiError, Messages};
pub use client::{ApiClient, ClientConfig, Endpoints};
