//! REST API layer: router, handlers, extractors, and error mapping.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
