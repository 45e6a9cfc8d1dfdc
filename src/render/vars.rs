//! `{{name}}` variable substitution.
//!
//! Variables are resolved through a registry of named handlers so callers can
//! plug in their own (`registries.vars.register("build-id", ...)`). Names
//! without a handler fall back to the context's `extra` map, then to the
//! empty string — an unrecognized placeholder never aborts a render.
//!
//! Substitution runs on heading, paragraph, blockquote, image and table-cell
//! text *before* inline-token rendering, so a placeholder may expand into
//! Markdown link syntax that then gets rendered normally.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::RenderContext;

static VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)\s*\}\}").expect("valid regex"));

type VarHandler = Box<dyn Fn(&RenderContext) -> String + Send + Sync>;

/// Registry of `{{name}}` resolvers. Last registration for a name wins.
pub struct VarRegistry {
    handlers: HashMap<String, VarHandler>,
}

impl VarRegistry {
    /// An empty registry with no handlers at all.
    pub fn empty() -> Self {
        VarRegistry {
            handlers: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in variables.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register("title", |ctx| ctx.title.clone().unwrap_or_default());
        registry.register("description", |ctx| {
            ctx.description.clone().unwrap_or_default()
        });
        registry.register("creation_date", |ctx| {
            ctx.creation_date.clone().unwrap_or_default()
        });
        registry.register("creation_time", |ctx| {
            ctx.creation_time.clone().unwrap_or_default()
        });
        registry.register("modify_date", |ctx| {
            ctx.modify_date.clone().unwrap_or_default()
        });
        registry.register("modify_time", |ctx| {
            ctx.modify_time.clone().unwrap_or_default()
        });
        registry.register("version", |ctx| ctx.version.clone().unwrap_or_default());
        registry.register("datetime", |ctx| {
            let parts: Vec<&str> = [ctx.creation_date.as_deref(), ctx.creation_time.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect();
            parts.join(" ")
        });
        registry.register("toc", |ctx| ctx.toc.clone().unwrap_or_default());

        // Navigation variables are supplied by the site build through the
        // context's extra map.
        for name in ["nav_header", "nav_category", "category_name", "breadcrumbs"] {
            registry.register(name, move |ctx| {
                ctx.extra.get(name).cloned().unwrap_or_default()
            });
        }

        registry
    }

    /// Register a handler for a variable name, replacing any existing one.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl Fn(&RenderContext) -> String + Send + Sync + 'static,
    ) {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    /// Resolve one variable name against the context.
    pub fn resolve(&self, name: &str, ctx: &RenderContext) -> String {
        if let Some(handler) = self.handlers.get(name) {
            return handler(ctx);
        }
        ctx.extra.get(name).cloned().unwrap_or_default()
    }

    /// Substitute every `{{name}}` placeholder in `text`.
    pub fn apply(&self, text: &str, ctx: &RenderContext) -> String {
        VAR_RE
            .replace_all(text, |caps: &regex::Captures| self.resolve(&caps[1], ctx))
            .into_owned()
    }
}
