//! shale - Markdown to static formats (HTML/Gemini/Gopher)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shale::build::{self, PageOptions, SiteOptions, UpdateOptions};
use shale::error::Error;
use shale::render::Format;
use shale::site::Structure;

#[derive(Parser)]
#[command(name = "shale")]
#[command(version, about = "Markdown to static formats (HTML/Gemini/Gopher)", long_about = None)]
#[command(after_help = "EXAMPLES:
    shale page post.md out/post.html -T base.html    Build one HTML page
    shale page post.md out/post.gmi -f gemini        Build one gemtext page
    shale build -s content -o dist -T templates      Build the whole site
    shale update out/post.html                       Re-render from recorded metadata")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a single page from a Markdown source
    Page {
        /// Input markdown file
        input: PathBuf,
        /// Output path and filename (e.g. pages/post.html)
        output: PathBuf,
        /// Output format: html (default), gemini, gopher
        #[arg(short, long, default_value = "html")]
        format: String,
        /// Title override (instead of the first heading in the markdown)
        #[arg(short, long)]
        title: Option<String>,
        /// Brief description of the page (metadata)
        #[arg(short, long)]
        description: Option<String>,
        /// Template path (required for HTML output)
        #[arg(short = 'T', long)]
        template: Option<PathBuf>,
    },
    /// Build an entire site from index.md
    Build {
        /// Source directory containing Markdown files
        #[arg(short, long, default_value = ".")]
        source: PathBuf,
        /// Output directory (default: same as source)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory containing templates
        #[arg(short = 'T', long)]
        templates: Option<PathBuf>,
        /// Output structure: flat (mirror source) or tree (pages/ subtree)
        #[arg(long, default_value = "flat")]
        structure: String,
        /// Comma-separated output formats: html,gemini,gopher
        #[arg(long, default_value = "html")]
        formats: String,
    },
    /// Update an existing output file from its Markdown source
    Update {
        /// Existing output file to update
        output_file: PathBuf,
        /// Input markdown file (optional if build metadata exists)
        input_file: Option<PathBuf>,
        /// Template path override
        #[arg(short = 'T', long)]
        template: Option<PathBuf>,
        /// Brief description of the page (metadata)
        #[arg(short, long)]
        description: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Page {
            input,
            output,
            format,
            title,
            description,
            template,
        } => {
            let format =
                Format::from_name(&format).ok_or_else(|| Error::UnsupportedFormat(format))?;
            build::build_page(
                &input,
                &output,
                &PageOptions {
                    format: Some(format),
                    title,
                    description,
                    template,
                },
            )?;
            println!("output saved at: {}", output.display());
            Ok(())
        }
        Command::Build {
            source,
            output,
            templates,
            structure,
            formats,
        } => {
            let structure = Structure::from_name(&structure)
                .ok_or_else(|| Error::UnsupportedFormat(format!("structure '{structure}'")))?;
            let formats = formats
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    Format::from_name(name).ok_or_else(|| Error::UnsupportedFormat(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let built = build::build_site(&SiteOptions {
                source,
                output,
                templates,
                structure,
                formats,
            })?;
            println!("site build complete, {built} pages written");
            Ok(())
        }
        Command::Update {
            output_file,
            input_file,
            template,
            description,
        } => {
            build::update_page(
                &output_file,
                input_file.as_deref(),
                &UpdateOptions {
                    template,
                    description,
                },
            )?;
            println!("updated: {}", output_file.display());
            Ok(())
        }
    }
}
