//! Text protocol for model-issued tool calls.
//!
//! [`render`] turns a tool catalog into prompt instructions, [`parse`]
//! recovers a single validated [`ToolCall`] from whatever the model wrote.

pub mod config;
pub mod error;
pub mod escape;
pub mod grammar;
pub mod parse;
pub mod render;
pub mod types;


pub use error::{CatalogError, ParseError, ParseErrorKind};
pub use escape::{escape, unescape};
pub use grammar::format_call;
pub use parse::{parse, truncate_after_call, ParseOptions, Parser, TrailingCallPolicy};
pub use render::{render, render_catalog};
pub use types::{Catalog, ToolCall, ToolDescriptor, ToolParameter};
