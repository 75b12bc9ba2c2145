pub mod claude;
pub mod document;
pub mod image;
pub mod models;

pub use claude::ClaudeService;
pub use models::{ClaudeConfig, ClaudeResponse, ToolChoiceMode, ToolSchema, ToolUse, Usage};
