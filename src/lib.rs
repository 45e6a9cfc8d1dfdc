//! # shale
//!
//! A fast, lightweight Markdown-to-static-site converter with three output
//! formats: HTML, Gemtext (Gemini) and Gophermaps.
//!
//! ## Features
//!
//! - Block-oriented Markdown parsing into a format-agnostic IR
//! - Three independent renderers over the same blocks
//! - Custom inline tokens (`[!MD-PAGE]`, `[!BUTTON]`, `[!EXTERNAL]`,
//!   `[!TIP]`) and `{{name}}` variables, both runtime-extensible
//! - Category-organized multi-page sites with navigation, breadcrumbs,
//!   blog listings and RSS feeds
//!
//! ## Quick Start
//!
//! ```
//! use shale::parse::parse;
//! use shale::render::{Format, Registries, RenderContext, render_blocks};
//!
//! let blocks = parse("# Hello World\n\nSome *markdown* text.");
//! let html = render_blocks(&blocks, Format::Html, &RenderContext::new(), &Registries::new());
//! assert!(html.starts_with("<h1 id='hello-world' class='content-h1'>"));
//! ```
//!
//! ## Working with Sites
//!
//! A site is one `index.md`, one `<category>.md` root page per category, and
//! the category's member pages under `<category>/`. [`site::discover_site`]
//! builds the read-only site graph; [`build::build_site`] renders every page
//! in every requested format and writes per-category RSS feeds.

pub mod build;
pub mod error;
pub mod frontmatter;
pub mod ir;
pub mod parse;
pub mod render;
pub mod site;

pub use error::{Error, Result};
pub use ir::{Block, CalloutKind, ListItem};
pub use parse::{generate_toc, parse};
pub use render::{Format, Registries, RenderContext, render_blocks};
pub use site::{Category, Page, Site, discover_site};
