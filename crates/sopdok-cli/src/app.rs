//! CLI Application logic

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sopdok_export::{
    extract_pages, ExportFormat, ExportOptions, ExportPipeline, ExportRequest, ExtractionStrategy,
    DEFAULT_PAGE_CLASS,
};
use sopdok_layout::{BlockId, FooterVariant, MeasuredLayout, PageBreakCalculator, PaginationReport};
use sopdok_render::RenderClient;
use sopdok_server::ServiceConfig;
use tracing::info;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripts
    Json,
}

/// Export target
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Pdf,
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

#[derive(Parser)]
#[command(name = "sopdok")]
#[command(author, version, about = "Paginated SOP documents, exported", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP export service
    Serve {
        /// TOML configuration file
        #[arg(short, long, env = "SOPDOK_CONFIG")]
        config: Option<PathBuf>,

        /// Listen address, overrides configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Export a paginated HTML document through the rendering service
    Export {
        /// Input HTML file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: FormatArg,

        /// Output file (defaults to the title-derived file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(short, long)]
        title: Option<String>,

        /// Rendering service base URL
        #[arg(long, env = "GOTENBERG_URL")]
        renderer_url: String,

        /// Class marking page containers
        #[arg(long, default_value = DEFAULT_PAGE_CLASS)]
        page_class: String,

        /// Delay before capture, in milliseconds
        #[arg(long, default_value_t = 1000)]
        settle_delay_ms: u64,
    },

    /// Report the pages found in an HTML document
    Pages {
        /// Input HTML file
        input: PathBuf,

        /// Class marking page containers
        #[arg(long, default_value = DEFAULT_PAGE_CLASS)]
        page_class: String,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compute page breaks for a measurement snapshot
    Paginate {
        /// Measurement snapshot (JSON)
        input: PathBuf,

        /// Footer variant (tiny, small, signature, placeholder)
        #[arg(long, default_value = "small")]
        footer: FooterVariant,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            serve_command(config.as_deref(), bind.as_deref())?;
        }
        Commands::Export {
            input,
            format,
            output,
            title,
            renderer_url,
            page_class,
            settle_delay_ms,
        } => {
            let settings = ExportSettings {
                format: format.into(),
                title,
                renderer_url,
                page_class,
                settle_delay: Duration::from_millis(settle_delay_ms),
            };
            let written = export_command(&input, output.as_deref(), &settings)?;
            println!("Wrote {}", written.display());
        }
        Commands::Pages {
            input,
            page_class,
            format,
        } => {
            print!("{}", pages_command(&input, &page_class, format)?);
        }
        Commands::Paginate {
            input,
            footer,
            format,
        } => {
            print!("{}", paginate_command(&input, footer, format)?);
        }
    }

    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

/// Execute the serve command
pub fn serve_command(config: Option<&Path>, bind: Option<&str>) -> Result<()> {
    let mut config = ServiceConfig::load(config).context("Failed to load configuration")?;
    if let Some(bind) = bind {
        config.server.bind = bind.to_string();
    }
    runtime()?
        .block_on(sopdok_server::serve(&config))
        .with_context(|| format!("Export service failed on {}", config.server.bind))
}

/// Settings for a one-off export
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub title: Option<String>,
    pub renderer_url: String,
    pub page_class: String,
    pub settle_delay: Duration,
}

/// Execute the export command, returning the written path
pub fn export_command(
    input: &Path,
    output: Option<&Path>,
    settings: &ExportSettings,
) -> Result<PathBuf> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read HTML file: {}", input.display()))?;

    let client = RenderClient::new(settings.renderer_url.clone())
        .with_context(|| format!("Invalid renderer URL: {}", settings.renderer_url))?;
    let pipeline = ExportPipeline::new()
        .with_renderer(Arc::new(client))
        .with_options(ExportOptions {
            settle_delay: settings.settle_delay,
            page_class: settings.page_class.clone(),
            ..ExportOptions::default()
        });

    let mut request = ExportRequest::new(html, settings.format);
    if let Some(title) = &settings.title {
        request = request.with_title(title.clone());
    }

    let artifact = runtime()?
        .block_on(pipeline.export(&request))
        .with_context(|| format!("Failed to export {}", input.display()))?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&artifact.file_name),
    };
    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write output: {}", path.display()))?;
    info!(path = %path.display(), bytes = artifact.bytes.len(), "export written");
    Ok(path)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PagesSummary {
    pages: usize,
    strategy: ExtractionStrategy,
    page_bytes: Vec<usize>,
}

/// Execute the pages command
pub fn pages_command(input: &Path, page_class: &str, format: OutputFormat) -> Result<String> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read HTML file: {}", input.display()))?;
    pages_report(&html, page_class, format)
}

/// Page extraction summary for a document
pub fn pages_report(html: &str, page_class: &str, format: OutputFormat) -> Result<String> {
    let extracted = extract_pages(html, page_class);
    let summary = PagesSummary {
        pages: extracted.len(),
        strategy: extracted.strategy,
        page_bytes: extracted.pages.iter().map(String::len).collect(),
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)? + "\n"),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(
                out,
                "{} page(s) via {}",
                summary.pages,
                summary.strategy.name()
            )?;
            for (i, bytes) in summary.page_bytes.iter().enumerate() {
                writeln!(out, "  page {}: {} bytes", i + 1, bytes)?;
            }
            Ok(out)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginationSummary {
    footer: FooterVariant,
    #[serde(flatten)]
    report: PaginationReport,
    pages: Vec<Vec<BlockId>>,
}

/// Execute the paginate command
pub fn paginate_command(input: &Path, footer: FooterVariant, format: OutputFormat) -> Result<String> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read measurements: {}", input.display()))?;
    paginate_report(&json, footer, format)
}

/// Page groupings for a measurement snapshot
pub fn paginate_report(json: &str, footer: FooterVariant, format: OutputFormat) -> Result<String> {
    let layout = MeasuredLayout::from_json(json).context("Invalid measurement snapshot")?;
    let blocks = layout.block_ids();
    let report = PageBreakCalculator::new(footer).calculate_report(&blocks, &layout);
    let pages = report.breaks.paginate(&blocks);
    let summary = PaginationSummary {
        footer,
        report,
        pages,
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)? + "\n"),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(
                out,
                "footer: {} ({}px, {})",
                summary.footer,
                summary.report.footer_height,
                if summary.report.footer_measured {
                    "measured"
                } else {
                    "fallback"
                }
            )?;
            writeln!(out, "available height: {}px", summary.report.available_height)?;
            for (i, page) in summary.pages.iter().enumerate() {
                let ids: Vec<&str> = page.iter().map(BlockId::as_str).collect();
                writeln!(out, "page {}: {}", i + 1, ids.join(", "))?;
            }
            if !summary.report.skipped.is_empty() {
                let ids: Vec<&str> = summary.report.skipped.iter().map(BlockId::as_str).collect();
                writeln!(out, "skipped: {}", ids.join(", "))?;
            }
            if !summary.report.oversized.is_empty() {
                let ids: Vec<&str> = summary.report.oversized.iter().map(BlockId::as_str).collect();
                writeln!(out, "oversized: {}", ids.join(", "))?;
            }
            Ok(out)
        }
    }
}
