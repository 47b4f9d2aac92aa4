//! Typed client for the SpamWatch ban-list API.
//!
//! # Overview
//! `Client` maps each SpamWatch endpoint to a method, authenticates every
//! request with a bearer token and turns documented error statuses into
//! `ApiError` variants. The HTTP round-trip goes through the `Transport`
//! trait; `UreqTransport` (feature `ureq`, on by default) is the stock
//! blocking implementation.
//!
//! # Design
//! - `Client` is immutable after construction and holds no per-call state.
//! - One dispatcher serves every endpoint. Its two halves,
//!   `Client::build_request` and `Client::parse_response`, are public so a
//!   caller can execute the exchange itself.
//! - Token lookups that may legitimately fail are wrapped with
//!   `or_fallback`, which substitutes a default for any `ApiError` while
//!   still propagating transport and JSON failures.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{check_status, or_fallback, Client};
pub use config::{Config, ConfigError, DEFAULT_HOST};
pub use error::{ApiError, Error, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{AddBan, Ban, CreateToken, Permission, Stats, Token, Version};
