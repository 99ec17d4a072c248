//! Remote access layer for the loft webhook drive.
//!
//! This crate provides:
//! - The `Webhook` capability trait consumed by the store layer
//! - A rate-limit-aware `Transport` whose shared `Gate` coordinates backoff
//!   across every concurrent caller of one remote handle
//! - `HttpWebhook`, the reqwest-backed implementation of the capability

pub mod error;
pub mod gate;
pub mod http;
pub mod transport;
pub mod webhook;

pub use error::{RemoteError, RemoteResult};
pub use gate::Gate;
pub use http::HttpWebhook;
pub use transport::{Transport, DEFAULT_BACKOFF};
pub use webhook::Webhook;
