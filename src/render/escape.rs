//! Pure HTML escaping utilities.
//!
//! Everything inserted into HTML output (labels, alt text, captions, code)
//! goes through [`escape_html`]. Gemtext and gopher output is raw text and is
//! never escaped.

/// Escape HTML-sensitive characters (`&`, `<`, `>`, `"`, `'`).
///
/// # Examples
///
/// ```
/// use shale::render::escape::escape_html;
///
/// assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
/// assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
