//! WebSocket transport for pushing monitor events to subscribers.
//!
//! Provides the HTTP upgrade handler; the subscriber registry itself is
//! owned by the coordinator, which this module feeds through the join
//! channel.

mod handler;

pub use handler::ws_handler;
