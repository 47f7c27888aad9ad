//! Provider-agnostic request execution layer: error taxonomy, rate
//! limiting, retrying executor, and the provider capability contract.

pub mod errors;
pub mod executor;
pub mod provider;
pub mod rate_limiter;
