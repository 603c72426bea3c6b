//! Markdown Line Scanner and Renderers
//!
//! Converts the Markdown that AI models return into an ordered list of render
//! instructions, and renders those instructions as HTML or plain text.

pub mod code_block;
pub mod inline;
pub mod ir;
pub mod renderer;

pub use code_block::CodeBlockAnalyzer;
pub use ir::{MarkdownScanner, RenderInstruction};
pub use renderer::Renderer;
