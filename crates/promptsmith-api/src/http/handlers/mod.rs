//! HTTP request handlers.

pub mod history;
pub mod optimize;
