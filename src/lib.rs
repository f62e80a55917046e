//! Courier tracking through the KlikResi API.
//!
//! Two halves share one set of response rules:
//!
//! - [`proxy`]: an axum endpoint, `GET /trackings/{awb}/couriers/{courier}`,
//!   that adds the API key and browser headers, calls KlikResi once and
//!   relays the JSON or a normalized error envelope.
//! - [`client`]: calls the proxy, turns the payload into [`TrackingData`]
//!   and remembers the last successful query.
//!
//! [`classify`] holds the content-type and Cloudflare challenge checks both
//! halves run.

pub mod classify;
pub mod client;
pub mod config;
pub mod couriers;
pub mod error;
pub mod logging;
pub mod models;
pub mod proxy;
pub mod store;
pub mod transport;
pub mod upstream;

pub use client::TrackingClient;
pub use error::{ErrorBody, TrackingError, UpstreamDetail};
pub use models::{LastUsedQuery, TrackingData, TrackingHistoryEntry};
