//! Multi-format rendering of the block IR.
//!
//! Three independent renderers project a parsed block sequence into HTML,
//! Gemtext, or a Gophermap. Rendering is pure: no I/O happens here, and all
//! state that can influence a block's output travels in one explicit
//! [`RenderContext`] per call rather than loose keyword-style arguments.
//!
//! Extensibility lives in two registries owned by [`Registries`]: custom
//! inline tokens (`[!TOKEN] [label](href)`) and `{{name}}` variables. Both
//! come pre-loaded with the built-ins and accept runtime registration; a
//! render call borrows them read-only.

pub mod escape;
pub mod gemtext;
pub mod gopher;
pub mod html;
pub mod inline;
pub mod slugify;
pub mod tokens;
pub mod vars;

use std::collections::HashMap;

use crate::ir::Block;
use crate::site::{Page, Site};

use tokens::TokenRegistry;
use vars::VarRegistry;

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Gemini,
    Gopher,
}

impl Format {
    /// Output file extension, with the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => ".html",
            Format::Gemini => ".gmi",
            Format::Gopher => ".txt",
        }
    }

    /// Parse a user-facing format name. Accepts the common aliases.
    pub fn from_name(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "html" => Some(Format::Html),
            "gemini" | "gemtext" => Some(Format::Gemini),
            "gopher" | "gophermap" => Some(Format::Gopher),
            _ => None,
        }
    }
}

/// The custom token and variable registries for one rendering session.
///
/// Built-ins are registered up front; user registration happens before
/// rendering starts and the maps are read-only from then on.
pub struct Registries {
    pub tokens: TokenRegistry,
    pub vars: VarRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Registries {
            tokens: TokenRegistry::with_builtins(),
            vars: VarRegistry::with_builtins(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that can influence the rendering of one document.
///
/// Constructed once per page and passed by reference; `extra` carries
/// caller-supplied variables (navigation fragments, listing markup) that the
/// variable registry falls back to for names without a registered handler.
pub struct RenderContext<'a> {
    pub title: Option<String>,
    pub description: Option<String>,
    pub creation_date: Option<String>,
    pub creation_time: Option<String>,
    pub modify_date: Option<String>,
    pub modify_time: Option<String>,
    pub version: Option<String>,
    pub toc: Option<String>,
    pub site: Option<&'a Site>,
    pub page: Option<&'a Page>,
    pub extra: HashMap<String, String>,
    pub gopher_host: String,
    pub gopher_port: u16,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        RenderContext {
            title: None,
            description: None,
            creation_date: None,
            creation_time: None,
            modify_date: None,
            modify_time: None,
            version: None,
            toc: None,
            site: None,
            page: None,
            extra: HashMap::new(),
            gopher_host: "localhost".to_string(),
            gopher_port: 70,
        }
    }
}

impl<'a> Default for RenderContext<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a block sequence into the requested format.
pub fn render_blocks(
    blocks: &[Block],
    format: Format,
    ctx: &RenderContext,
    registries: &Registries,
) -> String {
    match format {
        Format::Html => html::render_document(blocks, ctx, registries),
        Format::Gemini => gemtext::render_document(blocks, ctx, registries),
        Format::Gopher => gopher::render_document(blocks, ctx, registries),
    }
}
