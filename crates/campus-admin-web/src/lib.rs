//! Campus admin dashboard
//!
//! Server-rendered pages for managing the content and admissions data of a
//! REST backend. Every signed-in browser gets a server-side session holding
//! its token, its cached lists and a background token check.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod state;
pub mod views;

pub use server::build_app;
pub use state::AppState;
