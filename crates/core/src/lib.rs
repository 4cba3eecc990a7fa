//! # repochat core
//!
//! Domain types, traits, and error definitions for the repochat agent loop.
//! This crate has **no I/O of its own**: it defines the message model, the
//! Completion Service (`Provider`) and tool (`ToolProvider`) seams, and the
//! error taxonomy that every other crate builds against.
//!
//! Implementations live in their respective crates:
//! - `repochat-providers` talks to the model endpoint
//! - `repochat-tools` runs the sandboxed read-only tools
//! - `repochat-agent` drives the conversation

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationId, Message, Role};
pub use provider::{GenerationOptions, Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{render_catalog, truncate_output, ToolDescriptor, ToolInvocation, ToolProvider, TRUNCATION_MARKER};
