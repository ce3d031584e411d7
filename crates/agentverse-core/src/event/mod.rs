//! Reply lifecycle event bus.
//!
//! Provides a `ReplyEventBus` that distributes `ReplyEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::ReplyEventBus;
