//! HTTP middleware stack for the ledger server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! The owner identity is not a layer: handlers that need it take the
//! [`CurrentOwner`] extractor.

pub mod owner;
pub mod request_id;

pub use owner::{CurrentOwner, OWNER_ID_HEADER, OwnerRejection};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
