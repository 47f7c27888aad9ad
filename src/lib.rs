//! Sports data hub core.
//!
//! Provider-agnostic sports data aggregation:
//! - Shared request plumbing: sliding-window rate limiting, retrying HTTP
//!   execution, and error classification (`api`)
//! - Normalized entity model (`data`)
//! - Provider adapters for ESPN, the NBA stats API, and The Odds API
//!   (`providers`)
//! - Cross-provider aggregation into dashboard views (`service`)

pub mod api;
pub mod config;
pub mod data;
pub mod providers;
pub mod service;
