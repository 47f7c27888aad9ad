//! Normalized data shapes shared across providers and aggregation.

pub mod models;
