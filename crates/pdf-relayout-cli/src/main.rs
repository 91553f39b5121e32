//! PDF Relayout CLI - Command line tool for layout-preserving PDF translation.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_relayout_core::{AppConfig, DocumentTranslator, Lang, PdfDocument, TextColor};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, ValueEnum)]
enum ColorOption {
    Black,
    DarkRed,
    Blue,
    DarkGreen,
}

impl From<ColorOption> for TextColor {
    fn from(opt: ColorOption) -> Self {
        match opt {
            ColorOption::Black => Self::black(),
            ColorOption::DarkRed => Self::dark_red(),
            ColorOption::Blue => Self::blue(),
            ColorOption::DarkGreen => Self::dark_green(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdf-relayout")]
#[command(author, version, about = "Translate PDF documents in place, preserving layout", long_about = None)]
struct Args {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file (default: input-<target>.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code (auto = detect)
    #[arg(short = 's', long, default_value = "auto")]
    source: String,

    /// Target language code
    #[arg(short = 't', long, default_value = "es")]
    target: String,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE", default_value = "http://localhost:8080/v1")]
    api_base: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL", default_value = "default_model")]
    model: String,

    /// Color for re-inserted text (default: keep each unit's own color)
    #[arg(long, value_enum)]
    color: Option<ColorOption>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable translation caching
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    config.source_lang = Lang::new(&args.source);
    config.target_lang = Lang::new(&args.target);
    if let Some(color) = args.color {
        config.text_color = Some(color.into());
    }

    if args.no_cache {
        config.cache.memory_enabled = false;
        config.cache.disk_enabled = false;
    }

    // Configure translator
    config.translator =
        pdf_relayout_core::TranslatorConfig::new(args.api_base, args.api_key, args.model);

    // Load input PDF
    info!("Loading PDF: {}", args.input.display());
    let doc = PdfDocument::from_file(&args.input)
        .context(format!("Failed to load PDF: {}", args.input.display()))?;

    let total_pages = doc.page_count();
    info!("Document has {} pages", total_pages);

    let translator =
        DocumentTranslator::new(config).context("Failed to initialize translator")?;

    // Progress bar tracks whole-document completion in percent
    let pb = ProgressBar::new(100);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let progress_bar = pb.clone();
    let on_progress = move |fraction: f32| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        progress_bar.set_position((fraction * 100.0).round() as u64);
    };

    let warning_bar = pb.clone();
    let on_warning = move |message: &str| {
        warn!("{}", message);
        warning_bar.println(format!("warning: {message}"));
    };

    let output_bytes = translator
        .translate_document(&doc, Some(&on_progress), Some(&on_warning))
        .await
        .context("Failed to translate document")?;

    pb.finish_with_message("Translation complete");

    // Determine output path
    let output_path = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        args.input
            .with_file_name(format!("{}-{}.pdf", stem, args.target))
    });

    // Save output
    std::fs::write(&output_path, output_bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Translated PDF saved to: {}", output_path.display());
    }

    Ok(())
}
