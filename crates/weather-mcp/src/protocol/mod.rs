//! MCP protocol handling: JSON-RPC methods on top of the dispatcher.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
