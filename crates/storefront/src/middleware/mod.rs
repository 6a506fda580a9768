//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (record ID in span, Sentry scope and response)
//! 4. Security headers (CSP, frame and isolation policies)

pub mod request_id;
pub mod security_headers;

pub use request_id::{REQUEST_ID_HEADER, make_request_span, request_id_middleware};
pub use security_headers::security_headers_middleware;
