//! Session-token cache, issuer contract, and coalescing provider.

pub mod cache;
pub mod issuer;
pub mod provider;

mod metrics;

pub use cache::TokenCache;
pub use issuer::*;
pub use metrics::TokenMetrics;
pub use provider::TokenProvider;
