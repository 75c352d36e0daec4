//! Loadwatch API server library.
//!
//! Exposes the building blocks (config, state, routes, monitor tasks,
//! WebSocket transport) so integration tests and the binary entrypoint
//! can both access them.

pub mod config;
pub mod monitor;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
