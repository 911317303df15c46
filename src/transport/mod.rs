//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It defines the JSON protocol used between clients and the server, the
//! identity issuer, and the WebSocket server that forwards client requests to
//! the broker.

pub mod identity;
pub mod message;
pub mod websocket;


pub use identity::IdentityIssuer;
pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};
