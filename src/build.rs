//! Build orchestration: single pages, whole sites, and in-place updates.
//!
//! This is the I/O layer over the pure parse/render core. It reads sources,
//! extracts frontmatter, assembles the [`RenderContext`], runs the template
//! substitution, and writes output files. HTML pages gain a trailing
//! metadata comment (`<!-- shale: {...} -->`) recording their source and
//! template paths so `update` can later re-render them without arguments.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::ir::Block;
use crate::parse;
use crate::render::{Format, Registries, RenderContext, render_blocks};
use crate::site::{self, Page, Site, Structure, nav, rss};

static METADATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- shale: (\{.*\}) -->").expect("valid regex"));

/// Options for building a single page.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub format: Option<Format>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub template: Option<PathBuf>,
}

/// Options for building a whole site.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub structure: Structure,
    pub formats: Vec<Format>,
}

/// Options for updating an existing output file.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub template: Option<PathBuf>,
    pub description: Option<String>,
}

fn version_string() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

fn now_stamps() -> (String, String) {
    let now = Local::now();
    (
        now.format("%d/%m/%Y").to_string(),
        now.format("%H:%M").to_string(),
    )
}

/// Build one page from a Markdown source.
///
/// Frontmatter takes precedence over the CLI-supplied title, description and
/// template. HTML output requires a template.
pub fn build_page(input: &Path, output: &Path, options: &PageOptions) -> Result<()> {
    let md_text = fs::read_to_string(input)?;
    let (fm, content) = frontmatter::extract(&md_text)?;

    let errors = frontmatter::validate(&fm, input);
    if !errors.is_empty() {
        return Err(Error::FrontmatterInvalid(errors));
    }

    let blocks = parse::parse(&content);
    let title = resolve_title(&fm, options.title.as_deref(), &blocks);
    let description = fm
        .description()
        .map(str::to_string)
        .or_else(|| options.description.clone())
        .unwrap_or_default();
    let template = fm
        .template()
        .map(PathBuf::from)
        .or_else(|| options.template.clone());

    let (date, time) = now_stamps();
    let render = PageRender {
        blocks: &blocks,
        format: options.format.unwrap_or(Format::Html),
        output,
        source: input,
        template: template.as_deref(),
        title,
        description,
        creation_date: date.clone(),
        creation_time: time.clone(),
        modify_date: date,
        modify_time: time,
        site: None,
        page: None,
        extra: Vec::new(),
    };
    write_page(&render, &Registries::new())
}

/// Re-render an existing output file from its Markdown source.
///
/// When `input_file` is omitted, the source, template and creation stamps are
/// recovered from the metadata trailer of the output file; the creation date
/// stays stable while the modify date is refreshed. The output extension
/// selects the format.
pub fn update_page(
    output_file: &Path,
    input_file: Option<&Path>,
    options: &UpdateOptions,
) -> Result<()> {
    if !output_file.exists() {
        return Err(Error::OutputMissing(output_file.to_path_buf()));
    }

    let mut input = input_file.map(Path::to_path_buf);
    let mut template = options.template.clone();
    let mut creation_date = None;
    let mut creation_time = None;

    if input.is_none() {
        let metadata = read_trailer_metadata(output_file)?;
        input = metadata
            .get("source")
            .and_then(|v| v.as_str())
            .map(PathBuf::from);
        if template.is_none() {
            template = metadata
                .get("template")
                .and_then(|v| v.as_str())
                .map(PathBuf::from);
        }
        creation_date = metadata
            .get("creation_date")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        creation_time = metadata
            .get("creation_time")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if let Some(ref input) = input {
            info!(source = %input.display(), "recovered build metadata from output");
        }
    }

    let Some(input) = input else {
        return Err(Error::MissingMetadata(output_file.to_path_buf()));
    };
    if !input.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("input file '{}' does not exist", input.display()),
        )));
    }

    let md_text = fs::read_to_string(&input)?;
    let (fm, content) = frontmatter::extract(&md_text)?;
    let errors = frontmatter::validate(&fm, &input);
    if !errors.is_empty() {
        return Err(Error::FrontmatterInvalid(errors));
    }

    let blocks = parse::parse(&content);
    let title = resolve_title(&fm, None, &blocks);
    let description = fm
        .description()
        .map(str::to_string)
        .or_else(|| options.description.clone())
        .unwrap_or_default();
    let template = fm.template().map(PathBuf::from).or(template);

    let format = match output_file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("html") | Some("htm") => Format::Html,
        Some("gmi") => Format::Gemini,
        Some("txt") => Format::Gopher,
        other => {
            warn!(extension = ?other, "unknown output extension, defaulting to HTML");
            Format::Html
        }
    };

    let (modify_date, modify_time) = now_stamps();
    let render = PageRender {
        blocks: &blocks,
        format,
        output: output_file,
        source: &input,
        template: template.as_deref(),
        title,
        description,
        creation_date: creation_date.unwrap_or_else(|| modify_date.clone()),
        creation_time: creation_time.unwrap_or_else(|| modify_time.clone()),
        modify_date,
        modify_time,
        site: None,
        page: None,
        extra: Vec::new(),
    };
    write_page(&render, &Registries::new())
}

/// Build a whole site: index, category roots, member pages, and per-category
/// RSS feeds, in every requested format. Returns the number of page files
/// written.
pub fn build_site(options: &SiteOptions) -> Result<usize> {
    let site = site::discover_site(
        &options.source,
        options.output.as_deref(),
        options.structure,
    )?;

    for warning in site::validate_site_structure(&site) {
        warn!("{warning}");
    }
    info!(
        categories = site.categories.len(),
        output = %site.output_root.display(),
        "discovered site"
    );

    let registries = Registries::new();
    let mut built = 0usize;

    for &format in &options.formats {
        if build_site_page(&site.index_page, &site, None, format, options, &registries)? {
            built += 1;
        }

        for (name, category) in &site.categories {
            if build_site_page(
                &category.root_page,
                &site,
                Some(name),
                format,
                options,
                &registries,
            )? {
                built += 1;
            }
            for page in &category.pages {
                if build_site_page(page, &site, Some(name), format, options, &registries)? {
                    built += 1;
                }
            }
        }
    }

    if options.formats.contains(&Format::Html) {
        write_feeds(&site)?;
    }

    Ok(built)
}

/// Render one page of a discovered site in one format. Returns false when
/// the page is skipped (HTML without a template).
fn build_site_page(
    page: &Page,
    site: &Site,
    category_name: Option<&str>,
    format: Format,
    options: &SiteOptions,
    registries: &Registries,
) -> Result<bool> {
    let md_text = fs::read_to_string(&page.source_path)?;
    let (fm, content) = frontmatter::extract(&md_text)?;
    let blocks = parse::parse(&content);

    let template = match format {
        Format::Html => match fm.template() {
            Some(template) => Some(resolve_template_path(
                Path::new(template),
                options.templates.as_deref(),
            )),
            None => {
                warn!(
                    source = %page.source_path.display(),
                    "no template specified, skipping HTML output"
                );
                return Ok(false);
            }
        },
        _ => None,
    };

    let (modify_date, modify_time) = now_stamps();
    let creation_date = fm.date_str().unwrap_or_else(|| modify_date.clone());

    let extra = navigation_extra(site, category_name, page, format);

    let output = match format {
        Format::Html => page.output_path.clone(),
        _ => page
            .output_path
            .with_extension(format.extension().trim_start_matches('.')),
    };

    let render = PageRender {
        blocks: &blocks,
        format,
        output: &output,
        source: &page.source_path,
        template: template.as_deref(),
        title: page.title.clone(),
        description: fm.description().unwrap_or_default().to_string(),
        creation_date,
        creation_time: modify_time.clone(),
        modify_date,
        modify_time,
        site: Some(site),
        page: Some(page),
        extra,
    };
    write_page(&render, registries)?;
    Ok(true)
}

/// Navigation and listing variables for one page render.
fn navigation_extra(
    site: &Site,
    category_name: Option<&str>,
    page: &Page,
    format: Format,
) -> Vec<(String, String)> {
    let mut extra = Vec::new();

    extra.push((
        "nav_header".to_string(),
        nav::generate_header_nav(site, Some(page), true),
    ));
    extra.push((
        "breadcrumbs".to_string(),
        nav::generate_breadcrumbs(category_name, site, Some(page)),
    ));
    extra.push((
        "category_name".to_string(),
        category_name.unwrap_or_default().to_string(),
    ));

    let category_nav = category_name
        .and_then(|name| site.categories.get(name))
        .map(|category| nav::generate_category_nav(category, Some(page)))
        .unwrap_or_default();
    extra.push(("nav_category".to_string(), category_nav));

    let listing = nav::blog_listing(site, Some(page), format);
    extra.push((
        "blog_listing".to_string(),
        nav::blog_listing_markup(&listing, format),
    ));
    extra.push(("blog_title".to_string(), listing.titles.join("\n")));
    extra.push(("blog_description".to_string(), listing.descriptions.join("\n")));
    extra.push(("blog_view".to_string(), listing.views.join("\n")));
    extra.push(("blog_content".to_string(), listing.contents.join("\n")));

    extra
}

fn write_feeds(site: &Site) -> Result<()> {
    let site_url = site
        .index_page
        .frontmatter
        .url()
        .unwrap_or("https://example.com");
    let site_title = &site.index_page.title;
    let site_description = site.index_page.frontmatter.description().unwrap_or_default();

    for category in site.categories.values() {
        let posts = category.blog_posts();
        if posts.is_empty() {
            continue;
        }

        let feed = rss::generate_rss_feed(
            category,
            site_url,
            site_title,
            site_description,
            Some(&site.output_root),
        );

        // The feed sits in the category's page directory.
        let feed_path = match posts[0].output_path.parent() {
            Some(dir) => dir.join("feed.xml"),
            None => site.output_root.join(&category.name).join("feed.xml"),
        };
        if let Some(parent) = feed_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&feed_path, feed)?;
        info!(
            category = %category.name,
            posts = posts.len(),
            path = %feed_path.display(),
            "generated feed.xml"
        );
    }

    Ok(())
}

/// One page render ready to be written out.
struct PageRender<'a> {
    blocks: &'a [Block],
    format: Format,
    output: &'a Path,
    source: &'a Path,
    template: Option<&'a Path>,
    title: String,
    description: String,
    creation_date: String,
    creation_time: String,
    modify_date: String,
    modify_time: String,
    site: Option<&'a Site>,
    page: Option<&'a Page>,
    extra: Vec<(String, String)>,
}

fn write_page(render: &PageRender, registries: &Registries) -> Result<()> {
    let mut ctx = RenderContext::new();
    ctx.title = Some(render.title.clone());
    ctx.description = Some(render.description.clone());
    ctx.creation_date = Some(render.creation_date.clone());
    ctx.creation_time = Some(render.creation_time.clone());
    ctx.modify_date = Some(render.modify_date.clone());
    ctx.modify_time = Some(render.modify_time.clone());
    ctx.version = Some(version_string());
    ctx.site = render.site;
    ctx.page = render.page;
    for (name, value) in &render.extra {
        ctx.extra.insert(name.clone(), value.clone());
    }

    let text = match render.format {
        Format::Html => {
            let template = render.template.ok_or(Error::TemplateRequired)?;
            let template_text = fs::read_to_string(template)
                .map_err(|_| Error::MissingTemplate(template.to_path_buf()))?;

            ctx.toc = Some(parse::generate_toc(render.blocks));
            let content = render_blocks(render.blocks, Format::Html, &ctx, registries);
            ctx.extra.insert("content".to_string(), content);

            let html = registries.vars.apply(&template_text, &ctx);
            let trailer = trailer_comment(render, template)?;
            format!("{}\n{trailer}\n", html.trim_end())
        }
        Format::Gemini | Format::Gopher => {
            render_blocks(render.blocks, render.format, &ctx, registries)
        }
    };

    if let Some(parent) = render.output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(render.output, text)?;
    info!(output = %render.output.display(), format = ?render.format, "output saved");
    Ok(())
}

/// The machine-readable trailer appended to HTML pages.
fn trailer_comment(render: &PageRender, template: &Path) -> Result<String> {
    let absolute = |path: &Path| -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    };
    let metadata = serde_json::json!({
        "source": absolute(render.source),
        "template": absolute(template),
        "creation_date": render.creation_date,
        "creation_time": render.creation_time,
    });
    Ok(format!("<!-- shale: {} -->", serde_json::to_string(&metadata)?))
}

/// Recover the JSON trailer from the last KiB of an output file.
fn read_trailer_metadata(output_file: &Path) -> Result<serde_json::Value> {
    let bytes = fs::read(output_file)?;
    let start = bytes.len().saturating_sub(1024);
    let tail = String::from_utf8_lossy(&bytes[start..]);

    let caps = METADATA_RE
        .captures(&tail)
        .ok_or_else(|| Error::MissingMetadata(output_file.to_path_buf()))?;
    Ok(serde_json::from_str(&caps[1])?)
}

fn resolve_title(fm: &Frontmatter, override_title: Option<&str>, blocks: &[Block]) -> String {
    fm.title()
        .or(override_title)
        .map(str::to_string)
        .or_else(|| parse::first_heading(blocks).map(str::to_string))
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Resolve a template path against the templates directory when it is
/// relative and exists there.
fn resolve_template_path(template: &Path, templates_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = templates_dir
        && template.is_relative()
    {
        let candidate = dir.join(template);
        if candidate.exists() {
            return candidate;
        }
    }
    template.to_path_buf()
}
