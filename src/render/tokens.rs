//! Custom inline token registry.
//!
//! Tokens use the syntax `[!TOKEN] [label](href)`; some (like `[!TIP]`)
//! appear bare, so the label/href pair is optional in the match. Handlers map
//! a match to replacement text per output format. Dispatch is fail-open: an
//! unrecognized token, or a handler declining a match, leaves the original
//! text untouched — the trailing `[label](href)` then renders as an ordinary
//! link and the `[!TOKEN]` marker survives verbatim.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::Format;
use super::escape::escape_html;
use crate::site::nav::relative_path;
use crate::site::{Page, Site, normalize_path};

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+://").expect("valid regex"));

/// One matched token occurrence.
pub struct TokenMatch<'t> {
    pub name: &'t str,
    pub label: Option<&'t str>,
    pub href: Option<&'t str>,
    /// The full matched substring, returned verbatim on fallback.
    pub whole: &'t str,
}

/// Read-only surroundings a handler may consult.
pub struct TokenScope<'a> {
    pub format: Format,
    pub site: Option<&'a Site>,
    pub page: Option<&'a Page>,
}

type TokenHandler = Box<dyn Fn(&TokenMatch, &TokenScope) -> Option<String> + Send + Sync>;

/// Registry mapping uppercase token names to handlers.
pub struct TokenRegistry {
    handlers: HashMap<String, TokenHandler>,
}

impl TokenRegistry {
    /// An empty registry with no handlers at all.
    pub fn empty() -> Self {
        TokenRegistry {
            handlers: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in tokens.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("MD-PAGE", md_page);
        registry.register("BUTTON", button);
        registry.register("EXTERNAL", external);
        registry.register("TIP", tip);
        registry
    }

    /// Register a handler, replacing any existing one for that name.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl Fn(&TokenMatch, &TokenScope) -> Option<String> + Send + Sync + 'static,
    ) {
        self.handlers
            .insert(name.to_ascii_uppercase(), Box::new(handler));
    }

    /// Run the handler for a match; `None` means "leave the text as written".
    pub fn dispatch(&self, token: &TokenMatch, scope: &TokenScope) -> Option<String> {
        let handler = self.handlers.get(&token.name.to_ascii_uppercase())?;
        handler(token, scope)
    }
}

/// `MD-PAGE`: site-aware page link.
///
/// With site context the href is resolved to the target page's output file,
/// relative to the current page's output directory; otherwise (or when the
/// target cannot be found) the `.md` suffix is rewritten for the output
/// format. A trailing `.md` never survives, even on fallback.
fn md_page(token: &TokenMatch, scope: &TokenScope) -> Option<String> {
    let label = token.label?;
    let href = token.href?;

    let resolved = resolve_site_link(href, scope).unwrap_or_else(|| href.to_string());
    let resolved = rewrite_md_suffix(&resolved, scope.format);

    match scope.format {
        Format::Html => Some(format!(
            "<a href=\"{}\" class=\"content-md_page\">{}</a>",
            escape_html(&resolved),
            escape_html(label)
        )),
        Format::Gemini | Format::Gopher => Some(format!("[{label}]({resolved})")),
    }
}

/// `BUTTON`: a clickable element navigating to the href.
fn button(token: &TokenMatch, scope: &TokenScope) -> Option<String> {
    let label = token.label?;
    let href = token.href?;

    match scope.format {
        Format::Html => Some(format!(
            "<button class=\"content-button\" onclick=\"window.location.href='{}'\">{}</button>",
            escape_html(href),
            escape_html(label)
        )),
        Format::Gemini | Format::Gopher => Some(format!("[{label}]({href})")),
    }
}

/// `EXTERNAL`: an external-styled link with protocol inference and label
/// simplification.
fn external(token: &TokenMatch, scope: &TokenScope) -> Option<String> {
    let label = token.label?;
    let href = infer_protocol(token.href?);
    let label = simplify_label(label);

    match scope.format {
        Format::Html => Some(format!(
            "<a href=\"{}\" class=\"content-external\">{}</a>",
            escape_html(&href),
            escape_html(&label)
        )),
        Format::Gemini | Format::Gopher => Some(format!("[{label}]({href})")),
    }
}

/// Prefix a protocol for hrefs that read like bare hosts of a known flavor.
///
/// Everything else is left exactly as written: an ordinary bare domain is
/// assumed to already be correct as typed.
fn infer_protocol(href: &str) -> String {
    if SCHEME_RE.is_match(href)
        || href.starts_with('/')
        || href.starts_with("./")
        || href.starts_with("../")
    {
        return href.to_string();
    }
    if href.ends_with(".onion") {
        format!("http://{href}")
    } else if href.ends_with(".gopher") {
        format!("gopher://{href}")
    } else if href.ends_with(".gemini") {
        format!("gemini://{href}")
    } else if href.ends_with(".eth") || href.starts_with("www.") {
        format!("https://{href}")
    } else {
        href.to_string()
    }
}

/// Strip a leading `scheme://` and `www.` from the displayed label only.
fn simplify_label(label: &str) -> String {
    let label = SCHEME_RE.replace(label, "");
    label.strip_prefix("www.").unwrap_or(&label).to_string()
}

/// `TIP`: a support/tip-jar block from the page's `tipping` frontmatter.
///
/// Resolves to the empty string when the page has no tipping configuration.
fn tip(_token: &TokenMatch, scope: &TokenScope) -> Option<String> {
    let channels = scope
        .page
        .map(|page| page.frontmatter.tipping())
        .unwrap_or_default();
    if channels.is_empty() {
        return Some(String::new());
    }

    match scope.format {
        Format::Html => {
            let mut parts = vec!["<strong>Support:</strong>".to_string()];
            for (key, value) in &channels {
                if key == "kofi" {
                    parts.push(format!(
                        "<a href=\"https://ko-fi.com/{}\" class=\"content-link\">Ko-fi</a>",
                        escape_html(value)
                    ));
                } else {
                    parts.push(format!(
                        "<strong>{}:</strong> {}",
                        escape_html(&key.to_uppercase()),
                        escape_html(value)
                    ));
                }
            }
            Some(format!("<div class=\"content-tip\">{}</div>", parts.join(" ")))
        }
        Format::Gemini => {
            let mut lines = vec!["Support:".to_string()];
            for (key, value) in &channels {
                if key == "kofi" {
                    lines.push(format!("=> https://ko-fi.com/{value} Ko-fi"));
                } else {
                    lines.push(format!("* {}: {}", key.to_uppercase(), value));
                }
            }
            Some(lines.join("\n"))
        }
        Format::Gopher => {
            let mut lines = vec!["Support:".to_string()];
            for (key, value) in &channels {
                if key == "kofi" {
                    lines.push(format!("Ko-fi: https://ko-fi.com/{value}"));
                } else {
                    lines.push(format!("- {}: {}", key.to_uppercase(), value));
                }
            }
            Some(lines.join("\n"))
        }
    }
}

/// Resolve an `.md` href against the site topology: relative to the current
/// page's source, or from the site root for `/`-prefixed hrefs. Returns the
/// path of the target's output file relative to the current page's output
/// directory, or `None` when there is no context or no matching page.
fn resolve_site_link(href: &str, scope: &TokenScope) -> Option<String> {
    let site = scope.site?;
    let page = scope.page?;

    if !href.to_ascii_lowercase().ends_with(".md") {
        return None;
    }

    let target_source = if let Some(rooted) = href.strip_prefix('/') {
        site.root_path.join(rooted)
    } else {
        page.source_path.parent()?.join(href)
    };
    let target = site.find_by_source(&normalize_path(&target_source))?;

    // The target's output path carries the primary (HTML) extension; point
    // at the file this format's build writes instead.
    let output = target
        .output_path
        .with_extension(scope.format.extension().trim_start_matches('.'));

    let base = page.output_path.parent()?;
    let rel = relative_path(&output, base)
        .unwrap_or_else(|| output.file_name().map(Into::into).unwrap_or_default());
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Suffix-rewrite a trailing `.md`/`.MD` for the output format.
fn rewrite_md_suffix(href: &str, format: Format) -> String {
    if href.to_ascii_lowercase().ends_with(".md") {
        format!("{}{}", &href[..href.len() - 3], format.extension())
    } else {
        href.to_string()
    }
}
