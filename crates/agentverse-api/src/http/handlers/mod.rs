//! HTTP request handlers for the REST API.

pub mod agents;
pub mod events;
pub mod replies;
pub mod session;
