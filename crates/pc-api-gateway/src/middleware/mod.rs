//! Middleware stack for the API gateway.
//!
//! Layer order: CORS → tracing (tower-http) → timeout (tower-http) → handler.
//! Rate limiting lives in `round-engine::SubmissionPipeline` itself (it needs
//! to be keyed by `requestType`, not just by route), so there is no rate-limit
//! layer here.

pub mod cors;

pub use cors::create_cors_layer;
