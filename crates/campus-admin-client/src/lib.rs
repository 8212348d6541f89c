//! REST backend client for the campus admin dashboard
//!
//! All authenticated calls take an explicit [`Session`]. The [`SessionGuard`]
//! re-verifies a browser's stored token on a fixed interval and clears its
//! [`CredentialStore`] as soon as the backend stops accepting it.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod client;
pub mod error;
pub mod guard;
pub mod mock;
pub mod session;

pub use client::{ApiClient, DashboardCounts, DashboardSummary, LoginResponse};
pub use error::{ClientError, ClientResult};
pub use guard::{GuardOutcome, SessionGuard, TokenVerifier};
pub use session::{AUTH_TOKEN_KEY, CredentialStore, Session, USER_DATA_KEY};
