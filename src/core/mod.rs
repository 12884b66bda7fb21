//! Core types & traits: protocol shapes, tool contracts and input schemas.

pub mod content;
pub mod error;
pub mod mcp;
pub mod schema;
pub mod tool;
