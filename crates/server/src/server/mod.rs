//! HTTP surface: routing, access control, handlers and the TLS listener.
//!
//! # Responsibilities
//! - Define the Axum router with every operation route and shared middleware.
//! - Authenticate and authorize protected routes via the access table.
//! - Map service errors onto status codes and JSON error bodies.
//! - Serve over plaintext or rustls-terminated TLS.

pub mod access;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tls;
