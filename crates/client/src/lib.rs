#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! # Tournament Client
//!
//! Typed access to the trading tournament API: a pluggable transport
//! ([`ApiSender`]), the API client built on top of it ([`ApiClient`]), the
//! wire types and the session context that owns the access credential.

/// Error type.
pub mod error;

/// Transport.
pub mod sender;

/// API client.
pub mod client;

/// Wire types.
pub mod types;

/// Session context.
pub mod session;

pub use crate::{
    client::{ApiClient, CompetitionApi},
    error::Error,
    sender::{ApiRequest, ApiResponse, ApiSender, Method, TransportStats},
    session::{AuthState, Credential, SessionContext, Subscription},
};

#[cfg(http_sender)]
pub use crate::sender::HttpApiSender;

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Name of the cookie carrying the access credential.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

pub use time;
pub use url;
