//! Security module for repochat: filesystem sandboxing.
//!
//! Every tool that touches the filesystem resolves its path argument through
//! [`resolve_in_sandbox`], which guarantees the result lies under a single
//! sandbox root.

pub mod path;

pub use path::{resolve_in_sandbox, PathValidationError};
