//! Weather MCP server library.

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod repl;
pub mod transport;
pub mod types;

pub use dispatch::{Dispatcher, DispatcherConfig};
pub use handlers::build_registry;
pub use protocol::ProtocolHandler;
pub use registry::CapabilityRegistry;
pub use transport::StdioTransport;
