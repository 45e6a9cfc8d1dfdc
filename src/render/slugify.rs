//! Slug generation for heading anchors.

/// Derive an anchor id from heading text.
///
/// Lowercases the text, drops characters outside `[a-z0-9]` and whitespace,
/// and collapses whitespace runs into single hyphens. Slugs are not
/// de-duplicated across a document; identical headings share an id.
///
/// # Examples
///
/// ```
/// use shale::render::slugify::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Another Heading with Symbols!"), "another-heading-with-symbols");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c.is_whitespace() {
                ' '
            } else {
                // Skip other characters
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
