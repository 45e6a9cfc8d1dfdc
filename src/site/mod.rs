//! Site structure: pages, categories, discovery.
//!
//! A site is one `index.md` at the source root, one `<category>.md` root page
//! per category, and the category's member pages under `<category>/`. The
//! graph is built once at discovery time and treated as read-only by
//! navigation and rendering.

pub mod nav;
pub mod rss;

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Error, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::parse;

/// Output directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Structure {
    /// Mirror the source layout: `<cat>.html`, `<cat>/<page>.html`.
    #[default]
    Flat,
    /// Group rendered pages under `pages/<cat>/`.
    Tree,
}

impl Structure {
    pub fn from_name(name: &str) -> Option<Structure> {
        match name.to_ascii_lowercase().as_str() {
            "flat" => Some(Structure::Flat),
            "tree" => Some(Structure::Tree),
            _ => None,
        }
    }
}

/// One source document mapped to one output location.
#[derive(Debug, Clone)]
pub struct Page {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub frontmatter: Frontmatter,
    /// Category name; `None` for the index page.
    pub category: Option<String>,
    pub is_category_root: bool,
    /// Frontmatter title, else the first H1/H2 of the content, else "Untitled".
    pub title: String,
}

impl Page {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        frontmatter: Frontmatter,
        category: Option<String>,
        is_category_root: bool,
    ) -> Page {
        let title = frontmatter
            .title()
            .unwrap_or("Untitled")
            .to_string();
        Page {
            source_path: source_path.into(),
            output_path: output_path.into(),
            frontmatter,
            category,
            is_category_root,
            title,
        }
    }

    /// Blog posts carry a blog type and a date; everything else is a page.
    pub fn is_blog_post(&self) -> bool {
        matches!(
            self.frontmatter.page_type(),
            Some("blog") | Some("blog-post")
        ) && self.frontmatter.date().is_some()
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.frontmatter.date()
    }
}

/// A named category: its root page and ordered member pages.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub root_page: Page,
    pub pages: Vec<Page>,
}

impl Category {
    pub fn new(name: impl Into<String>, root_page: Page, pages: Vec<Page>) -> Category {
        Category {
            name: name.into(),
            root_page,
            pages,
        }
    }

    /// Member pages that are blog posts, newest first. Stable: pages sharing
    /// a date keep their discovery order.
    pub fn blog_posts(&self) -> Vec<&Page> {
        let mut posts: Vec<&Page> = self.pages.iter().filter(|p| p.is_blog_post()).collect();
        posts.sort_by(|a, b| b.date().cmp(&a.date()));
        posts
    }
}

/// The whole site graph.
#[derive(Debug, Clone)]
pub struct Site {
    pub root_path: PathBuf,
    pub output_root: PathBuf,
    pub index_page: Page,
    pub categories: IndexMap<String, Category>,
}

impl Site {
    /// Find a page by its source path (lexically normalized comparison).
    pub fn find_by_source(&self, source: &Path) -> Option<&Page> {
        let wanted = normalize_path(source);
        if normalize_path(&self.index_page.source_path) == wanted {
            return Some(&self.index_page);
        }
        for category in self.categories.values() {
            if normalize_path(&category.root_page.source_path) == wanted {
                return Some(&category.root_page);
            }
            if let Some(page) = category
                .pages
                .iter()
                .find(|page| normalize_path(&page.source_path) == wanted)
            {
                return Some(page);
            }
        }
        None
    }

    /// Every blog post across all categories, newest first.
    pub fn all_blog_posts(&self) -> Vec<&Page> {
        let mut posts: Vec<&Page> = self
            .categories
            .values()
            .flat_map(|category| category.blog_posts())
            .collect();
        posts.sort_by(|a, b| b.date().cmp(&a.date()));
        posts
    }
}

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem (targets may not exist yet).
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Discover the site structure under `source_dir`.
///
/// Output paths are computed for the primary (HTML) format; other formats
/// swap the extension at build time. Category directories whose root page is
/// missing are skipped with a warning; a page whose frontmatter category
/// contradicts its directory is a hard error.
pub fn discover_site(
    source_dir: &Path,
    output_dir: Option<&Path>,
    structure: Structure,
) -> Result<Site> {
    let source_dir = source_dir.to_path_buf();
    let output_root = output_dir.map(Path::to_path_buf).unwrap_or_else(|| source_dir.clone());

    let index_source = source_dir.join("index.md");
    if !index_source.exists() {
        return Err(Error::MissingIndex(source_dir));
    }
    let index_page = load_page(
        &index_source,
        output_root.join("index.html"),
        None,
        false,
    )?;

    let mut category_names = index_page.frontmatter.categories();
    if category_names.is_empty() {
        category_names = scan_category_names(&source_dir)?;
    }

    let mut categories = IndexMap::new();
    for name in category_names {
        let root_source = source_dir.join(format!("{name}.md"));
        if !root_source.exists() {
            warn!(category = %name, "category root page missing, skipping");
            continue;
        }

        let root_output = match structure {
            Structure::Flat => output_root.join(format!("{name}.html")),
            Structure::Tree => output_root.join("pages").join(&name).join("index.html"),
        };
        let root_page = load_page(&root_source, root_output, Some(name.clone()), true)?;

        let mut pages = Vec::new();
        let pages_dir = source_dir.join(&name);
        if pages_dir.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(&pages_dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("md")
                })
                .collect();
            entries.sort();

            for path in entries {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                let output = match structure {
                    Structure::Flat => output_root.join(&name).join(format!("{stem}.html")),
                    Structure::Tree => {
                        output_root.join("pages").join(&name).join(format!("{stem}.html"))
                    }
                };
                let page = load_page(&path, output, Some(name.clone()), false)?;

                if let Some(declared) = page.frontmatter.category()
                    && declared != name
                {
                    return Err(Error::InvalidCategory {
                        category: name.clone(),
                        reason: format!(
                            "{} declares category '{declared}'",
                            path.display()
                        ),
                    });
                }
                pages.push(page);
            }
        }

        categories.insert(name.clone(), Category::new(name, root_page, pages));
    }

    Ok(Site {
        root_path: source_dir,
        output_root,
        index_page,
        categories,
    })
}

/// Sanity warnings about a discovered site; the caller decides whether to
/// surface them.
pub fn validate_site_structure(site: &Site) -> Vec<String> {
    let mut warnings = Vec::new();

    for category in site.categories.values() {
        if category.pages.is_empty() {
            warnings.push(format!("category '{}' has no pages", category.name));
        }
        for post in category.blog_posts() {
            if post.frontmatter.description().is_none() {
                warnings.push(format!(
                    "blog post {} has no description (feeds will be sparse)",
                    post.source_path.display()
                ));
            }
        }
    }

    warnings
}

fn load_page(
    source: &Path,
    output: PathBuf,
    category: Option<String>,
    is_category_root: bool,
) -> Result<Page> {
    let text = fs::read_to_string(source)?;
    let (fm, content) = frontmatter::extract(&text)?;

    let errors = frontmatter::validate(&fm, source);
    if !errors.is_empty() {
        return Err(Error::FrontmatterInvalid(errors));
    }

    let mut page = Page::new(source, output, fm, category, is_category_root);
    if page.frontmatter.title().is_none() {
        let blocks = parse::parse(&content);
        if let Some(heading) = parse::first_heading(&blocks) {
            page.title = heading.to_string();
        }
    }
    Ok(page)
}

fn scan_category_names(source_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries: Vec<PathBuf> = fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir()
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
            && !name.starts_with('.')
            && source_dir.join(format!("{name}.md")).exists()
        {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.md")),
            PathBuf::from("/a/c/d.md")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_is_blog_post() {
        let (fm, _) =
            frontmatter::extract("---\ntype: blog\ntitle: T\ndate: 2024-12-01\n---\nx").unwrap();
        let page = Page::new("post.md", "post.html", fm, Some("blog".into()), false);
        assert!(page.is_blog_post());

        let (fm, _) = frontmatter::extract("---\ntype: page\n---\nx").unwrap();
        let page = Page::new("about.md", "about.html", fm, Some("pages".into()), false);
        assert!(!page.is_blog_post());
    }

    #[test]
    fn test_blog_post_type_alias() {
        let (fm, _) = frontmatter::extract(
            "---\ntype: blog-post\ntitle: T\ndate: 2025-12-05 13:14\n---\nx",
        )
        .unwrap();
        let page = Page::new("p.md", "p.html", fm, Some("blog".into()), false);
        assert!(page.is_blog_post());
    }

    #[test]
    fn test_blog_posts_sorted_newest_first() {
        let make = |name: &str, date: &str| {
            let (fm, _) = frontmatter::extract(&format!(
                "---\ntitle: {name}\ntype: blog\ndate: {date}\n---\nx"
            ))
            .unwrap();
            Page::new(
                format!("blog/{name}.md"),
                format!("blog/{name}.html"),
                fm,
                Some("blog".into()),
                false,
            )
        };
        let root = Page::new("blog.md", "blog.html", Frontmatter::empty(), Some("blog".into()), true);
        let category = Category::new(
            "blog",
            root,
            vec![
                make("old", "2024-01-01"),
                make("new", "2025-01-01"),
                make("mid", "2024-06-01"),
            ],
        );
        let titles: Vec<&str> = category.blog_posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }
}
