//! Provider-agnostic chat types
//!
//! These are the only shapes callers see; wire formats for each backend live
//! in `crate::protocol`.

pub mod message;
pub mod options;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{FunctionCall, Message, Role, ToolCall};
pub use options::ChatOptions;
pub use response::{ChatResponse, Usage};
pub use stream::{ResponseType, StreamResponse, ToolCallDelta};
pub use tool::{FunctionDef, Tool, ToolChoice};
