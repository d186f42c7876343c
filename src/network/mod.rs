//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One worker thread per connection, bounded by `max_connections`
//! - Frames routed through the Broker

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
