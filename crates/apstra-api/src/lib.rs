//! Apstra API access
//!
//! - `client`: authenticated HTTP gateway and per-endpoint calls
//! - `resolve`: name-or-ID lookup over collection listings
//! - `types`: typed wire schemas for the endpoints the tools read

pub mod client;
pub mod resolve;
pub mod types;

pub use client::{endpoints, ApstraClient, AUTH_HEADER};
pub use resolve::{find_match, Labeled, Resolved};
pub use types::*;
