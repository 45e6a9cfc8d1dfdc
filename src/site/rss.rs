//! RSS 2.0 feed generation for blog categories.

use std::path::Path;

use chrono::NaiveDateTime;

use super::Category;

/// Generate an RSS 2.0 feed for a category's blog posts.
///
/// Items are the category's blog posts, newest first. `output_root` is
/// stripped from page output paths to form site-absolute URLs; pass `None`
/// when output paths are already site-relative.
pub fn generate_rss_feed(
    category: &Category,
    site_url: &str,
    site_title: &str,
    site_description: &str,
    output_root: Option<&Path>,
) -> String {
    let site_url = site_url.trim_end_matches('/');
    let posts = category.blog_posts();

    let root_rel = rel_str(&category.root_page.output_path, output_root);
    let feed_dir = posts
        .first()
        .and_then(|post| {
            let rel = rel_str(&post.output_path, output_root);
            rel.rsplit_once('/').map(|(dir, _)| dir.to_string())
        })
        .unwrap_or_else(|| category.name.clone());

    let mut feed = String::new();
    feed.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    feed.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    feed.push_str("  <channel>\n");
    feed.push_str(&format!(
        "    <title>{} - {}</title>\n",
        escape_xml(site_title),
        escape_xml(&category.root_page.title)
    ));
    feed.push_str(&format!("    <link>{site_url}/{root_rel}</link>\n"));
    feed.push_str(&format!(
        "    <description>{}</description>\n",
        escape_xml(site_description)
    ));
    feed.push_str(&format!(
        "    <atom:link href=\"{site_url}/{feed_dir}/feed.xml\" rel=\"self\" type=\"application/rss+xml\"/>\n"
    ));

    for post in posts {
        let link = format!("{site_url}/{}", rel_str(&post.output_path, output_root));
        feed.push_str("    <item>\n");
        feed.push_str(&format!(
            "      <title>{}</title>\n",
            escape_xml(&post.title)
        ));
        feed.push_str(&format!("      <link>{}</link>\n", escape_xml(&link)));
        if let Some(description) = post.frontmatter.description() {
            feed.push_str(&format!(
                "      <description>{}</description>\n",
                escape_xml(description)
            ));
        }
        if let Some(author) = post.frontmatter.author() {
            feed.push_str(&format!(
                "      <author>{}</author>\n",
                escape_xml(author)
            ));
        }
        if let Some(date) = post.date() {
            feed.push_str(&format!(
                "      <pubDate>{}</pubDate>\n",
                format_rfc822_date(date)
            ));
        }
        feed.push_str(&format!(
            "      <guid isPermaLink=\"true\">{}</guid>\n",
            escape_xml(&link)
        ));
        feed.push_str("    </item>\n");
    }

    feed.push_str("  </channel>\n");
    feed.push_str("</rss>\n");
    feed
}

/// RFC 822 date for `pubDate`, pinned to +0000.
fn format_rfc822_date(date: NaiveDateTime) -> String {
    date.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn rel_str(path: &Path, output_root: Option<&Path>) -> String {
    let rel = match output_root {
        Some(root) => path.strip_prefix(root).unwrap_or(path),
        None => path,
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
