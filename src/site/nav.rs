//! Navigation fragments and link-path resolution.
//!
//! Everything here computes strings for the `{{nav_header}}`,
//! `{{nav_category}}`, `{{breadcrumbs}}` and blog-listing variables. Hrefs
//! are computed relative to the current page's output directory; when no
//! current page is available (or the computation is undefined) the bare
//! output filename is used instead.

use std::path::{Component, Path, PathBuf};

use crate::render::Format;

use super::{Category, Page, Site};

/// Compute `target` relative to the directory `base_dir`.
///
/// Works for arbitrary depths (`../../target.html`). Returns `None` when the
/// two paths have no common footing (e.g. mixing absolute and relative
/// paths), in which case callers fall back to the bare filename.
pub fn relative_path(target: &Path, base_dir: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base_dir.is_absolute() {
        return None;
    }

    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base_dir.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component);
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Some(out)
}

/// Relative href from the current page to a target output file, with the
/// filename fallback.
fn href_to(target: &Path, current: Option<&Page>) -> String {
    let fallback = || {
        target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    match current.and_then(|page| page.output_path.parent()) {
        Some(base) => relative_path(target, base)
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(fallback),
        None => fallback(),
    }
}

/// One link per category, sorted by category name, pointing at the category
/// root page. With `include_home`, a link to the index page (labeled with
/// its title) is prepended.
pub fn generate_header_nav(site: &Site, current: Option<&Page>, include_home: bool) -> String {
    let mut links = Vec::new();

    if include_home {
        let label = if site.index_page.title.is_empty() {
            "Home"
        } else {
            &site.index_page.title
        };
        links.push(format!(
            "<a href=\"{}\" class=\"content-nav_header\">{label}</a>",
            href_to(&site.index_page.output_path, current)
        ));
    }

    let mut names: Vec<&String> = site.categories.keys().collect();
    names.sort();
    for name in names {
        let category = &site.categories[name.as_str()];
        links.push(format!(
            "<a href=\"{}\" class=\"content-nav_header\">{}</a>",
            href_to(&category.root_page.output_path, current),
            category.root_page.title
        ));
    }

    links.join("\n")
}

/// An unordered list of links to the pages of one category. Blog-flavored
/// categories list their posts newest first, each with a date suffix.
pub fn generate_category_nav(category: &Category, current: Option<&Page>) -> String {
    if category.pages.is_empty() {
        return String::new();
    }

    let blog_posts = category.blog_posts();
    let pages: Vec<&Page> = if blog_posts.is_empty() {
        category.pages.iter().collect()
    } else {
        blog_posts
    };

    let mut links = Vec::new();
    for page in pages {
        let href = href_to(&page.output_path, current);
        if page.is_blog_post()
            && let Some(date) = page.frontmatter.date_str()
        {
            links.push(format!(
                "  <li><a href=\"{href}\" class=\"content-nav_category\">{}</a> <span class=\"date\">({date})</span></li>",
                page.title
            ));
        } else {
            links.push(format!(
                "  <li><a href=\"{href}\" class=\"content-nav_category\">{}</a></li>",
                page.title
            ));
        }
    }

    format!("<ul>\n{}\n</ul>", links.join("\n"))
}

/// Breadcrumbs: Home → category root → current page.
///
/// The index page itself gets no breadcrumbs (empty string). The Home crumb
/// is labeled with the index page's title; the current page links to itself
/// by filename. Category roots end at the category crumb.
pub fn generate_breadcrumbs(
    page_category: Option<&str>,
    site: &Site,
    current: Option<&Page>,
) -> String {
    let is_index = |page: &Page| page.source_path == site.index_page.source_path;
    if page_category.is_none() && current.is_none_or(is_index) {
        return String::new();
    }

    let home_label = if site.index_page.title.is_empty() {
        "Home"
    } else {
        &site.index_page.title
    };
    let mut crumbs = vec![format!(
        "<a href=\"{}\" class=\"breadcrumb\">{home_label}</a>",
        href_to(&site.index_page.output_path, current)
    )];

    if let Some(name) = page_category
        && let Some(category) = site.categories.get(name)
    {
        crumbs.push(format!(
            "<a href=\"{}\" class=\"breadcrumb\">{}</a>",
            href_to(&category.root_page.output_path, current),
            category.root_page.title
        ));
    }

    if let Some(page) = current {
        let is_category_root = page_category
            .and_then(|name| site.categories.get(name))
            .is_some_and(|category| {
                category.root_page.source_path == page.source_path
            });
        if !is_category_root && !is_index(page) {
            let self_href = page
                .output_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            crumbs.push(format!(
                "<a href=\"{self_href}\" class=\"breadcrumb current\">{}</a>",
                page.title
            ));
        }
    }

    let separator = " <span class=\"breadcrumb-separator\">/</span> ";
    format!(
        "<nav class=\"breadcrumbs\">{}</nav>",
        crumbs.join(separator)
    )
}

/// Four parallel arrays describing every blog post across all categories,
/// newest first. Index `i` refers to the same post in all four.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogListing {
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    /// Rendered-page hrefs; the extension follows the output format.
    pub views: Vec<String>,
    /// Raw Markdown hrefs (a `.md` sibling of the output path).
    pub contents: Vec<String>,
}

/// Build the blog listing variables for one page and output format.
pub fn blog_listing(site: &Site, current: Option<&Page>, format: Format) -> BlogListing {
    let mut listing = BlogListing::default();

    for post in site.all_blog_posts() {
        listing.titles.push(post.title.clone());
        listing
            .descriptions
            .push(post.frontmatter.description().unwrap_or_default().to_string());

        let view_path = with_extension(&post.output_path, format.extension());
        let content_path = with_extension(&post.output_path, ".md");
        listing.views.push(href_to(&view_path, current));
        listing.contents.push(href_to(&content_path, current));
    }

    listing
}

/// Joined markup for the `{{blog_listing}}` variable, per output format.
pub fn blog_listing_markup(listing: &BlogListing, format: Format) -> String {
    let mut out = Vec::new();
    for i in 0..listing.titles.len() {
        let title = &listing.titles[i];
        let description = &listing.descriptions[i];
        let view = &listing.views[i];
        let content = &listing.contents[i];
        match format {
            Format::Html => {
                let description_html = if description.is_empty() {
                    String::new()
                } else {
                    format!(" <span class=\"description\">{description}</span>")
                };
                out.push(format!(
                    "  <li><a href=\"{view}\" class=\"content-nav_category\">{title}</a>{description_html} <a href=\"{content}\" class=\"content-raw\">[md]</a></li>"
                ));
            }
            Format::Gemini => {
                out.push(format!("=> {view} {title}"));
                if !description.is_empty() {
                    out.push(description.clone());
                }
            }
            Format::Gopher => {
                out.push(format!("- {title}: {view}"));
            }
        }
    }

    match format {
        Format::Html if !out.is_empty() => format!("<ul>\n{}\n</ul>", out.join("\n")),
        _ => out.join("\n"),
    }
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension.trim_start_matches('.'))
}
