//! MCP host - JSON-RPC messages, stdio server loop, and method routing

pub mod handler;
pub mod messages;
pub mod server;

pub use handler::{DEFAULT_PROTOCOL_VERSION, McpHandler, SERVER_NAME};
pub use messages::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Methods, RequestId};
pub use server::{RequestHandler, serve};
