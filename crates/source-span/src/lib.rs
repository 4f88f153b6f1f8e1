//! Source position utilities for astro-parser.
//!
//! This crate provides the byte-offset [`Span`] type carried by every AST
//! node, a [`LineIndex`] for offset ↔ line/column conversion, and the
//! [`code_frame`] renderer used by parse diagnostics.

mod code_frame;
mod line_index;
mod span;

pub use code_frame::code_frame;
pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};
