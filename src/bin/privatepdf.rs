//! CLI binary for privatepdf.
//!
//! A thin shim over the library crate that maps CLI flags to an
//! `EditConfig`, applies page edits to an `EditSession` and writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use privatepdf::{
    format_file_size, parse_page_list, CompressionLevel, DocumentInfo, DropPosition, EditConfig,
    EditSession, SaveProgressCallback, SaveStage, SaveStats,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar running 0–100 % through the save
/// stages, with the current stage as its message.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Saving");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl SaveProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: SaveStage, percent: u8) {
        if stage == SaveStage::CompressionSkipped {
            self.bar.println(format!("  {} {}", cyan("⚠"), stage));
        }
        self.bar.set_message(stage.to_string());
        self.bar.set_position(percent as u64);
    }

    fn on_page_compressing(&self, page_num: usize, total_pages: usize, percent: u8) {
        self.bar
            .set_message(format!("Compressing page {page_num}/{total_pages}"));
        self.bar.set_position(percent as u64);
    }

    fn on_save_complete(&self, _stats: &SaveStats) {
        self.bar.finish_and_clear();
    }

    fn on_save_error(&self, error: &str) {
        self.bar.abandon_with_message(red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recompress a scan (writes scan-modified.pdf next to it)
  privatepdf scan.pdf

  # Merge two files, smallest output
  privatepdf a.pdf b.pdf --compression high -o merged.pdf

  # Keep pages 3, 1 and 2 in that order, without recompressing
  privatepdf --order 3,1,2 --no-compress report.pdf

  # Drop pages 2 and 5-7, then drag page 9 before page 1
  privatepdf --remove 2,5-7 --move 9:before:1 report.pdf -o out/

  # Page thumbnails as PNG files
  privatepdf --thumbnails thumbs/ --inspect-only report.pdf

  # Page count, sizes and metadata as JSON
  privatepdf --inspect-only --json report.pdf

COMPRESSION LEVELS:
  Level    JPEG quality  Effect
  ───────  ────────────  ─────────────────────────
  low      90            larger files, best quality
  medium   70            balanced (default)
  high     50            smallest files

  Compression renders every page to an image. Text stops being selectable.
  Use --no-compress to keep pages as they are.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium, or the directory holding it
  PRIVATEPDF_*            Any flag, e.g. PRIVATEPDF_COMPRESSION=high
  RUST_LOG                Override log filtering
"#;

/// Reorder, delete, merge and recompress PDF pages locally.
#[derive(Parser, Debug)]
#[command(
    name = "privatepdf",
    version,
    about = "Reorder, delete, merge and recompress PDF pages locally",
    long_about = "Edit PDF files without uploading them anywhere. Several inputs are merged \
in the order given; pages can be reordered and removed; the output is recompressed by \
rendering each page to JPEG.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files. Several files are merged in this order; non-PDF files are skipped.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file or directory. Default: the directory of the first input.
    #[arg(short, long, env = "PRIVATEPDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Keep exactly these pages, in this order (e.g. 3,1,2 or 1-4,7).
    #[arg(long, env = "PRIVATEPDF_ORDER")]
    order: Option<String>,

    /// Remove these pages (e.g. 2,5-7). Applied after --order.
    #[arg(long, env = "PRIVATEPDF_REMOVE")]
    remove: Option<String>,

    /// Move a page: DRAGGED:before|after:TARGET. Repeatable; applied after --remove.
    #[arg(long = "move", value_name = "MOVE", value_parser = parse_move)]
    moves: Vec<PageMove>,

    /// Compression level: low, medium, high.
    #[arg(long, env = "PRIVATEPDF_COMPRESSION", value_enum, default_value = "medium")]
    compression: CompressionArg,

    /// Keep pages as they are instead of recompressing them.
    #[arg(long, env = "PRIVATEPDF_NO_COMPRESS")]
    no_compress: bool,

    /// Render scale used for recompression (0.5–4.0).
    #[arg(long, env = "PRIVATEPDF_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PRIVATEPDF_PASSWORD")]
    password: Option<String>,

    /// Suffix added to the output file name.
    #[arg(long, env = "PRIVATEPDF_SUFFIX", default_value = "-modified")]
    suffix: String,

    /// Write a PNG thumbnail of each kept page into this directory.
    #[arg(long, env = "PRIVATEPDF_THUMBNAILS")]
    thumbnails: Option<PathBuf>,

    /// Thumbnail scale (0.1–2.0).
    #[arg(long, env = "PRIVATEPDF_THUMBNAIL_SCALE", default_value_t = 0.7)]
    thumbnail_scale: f32,

    /// Print document info only; do not save.
    #[arg(long)]
    inspect_only: bool,

    /// Print results as JSON.
    #[arg(long, env = "PRIVATEPDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PRIVATEPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PRIVATEPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PRIVATEPDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    Low,
    Medium,
    High,
}

impl From<CompressionArg> for CompressionLevel {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::Low => CompressionLevel::Low,
            CompressionArg::Medium => CompressionLevel::Medium,
            CompressionArg::High => CompressionLevel::High,
        }
    }
}

/// A `--move` argument.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PageMove {
    dragged: u32,
    position: DropPosition,
    target: u32,
}

fn parse_move(s: &str) -> Result<PageMove, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let [dragged, position, target] = parts.as_slice() else {
        return Err(format!("expected DRAGGED:before|after:TARGET, got '{s}'"));
    };
    let page = |v: &str| {
        v.parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| format!("'{v}' is not a page number"))
    };
    let position = match position.to_ascii_lowercase().as_str() {
        "before" => DropPosition::Before,
        "after" => DropPosition::After,
        other => return Err(format!("position must be 'before' or 'after', got '{other}'")),
    };
    Ok(PageMove {
        dragged: page(*dragged)?,
        position,
        target: page(*target)?,
    })
}

/// `--json` output of a save.
#[derive(Serialize)]
struct SaveReport<'a> {
    output: &'a Path,
    file_name: &'a str,
    stats: &'a SaveStats,
    kept_pages: &'a [u32],
    skipped_inputs: Vec<&'a str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config & session ───────────────────────────────────────────
    let mut builder = EditConfig::builder()
        .compression(cli.compression.into())
        .recompress(!cli.no_compress)
        .render_scale(cli.scale)
        .thumbnail_scale(cli.thumbnail_scale)
        .output_suffix(cli.suffix.clone());
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut session = tokio::task::block_in_place(|| EditSession::new(config))
        .context("Failed to start the PDF engine")?;

    let info = session
        .open_files(&cli.inputs)
        .await
        .context("Failed to open input")?
        .clone();

    if let Some(loaded) = session.loaded() {
        for skipped in loaded.skipped_sources() {
            if !cli.quiet {
                eprintln!(
                    "  {} skipped {}: {}",
                    cyan("⚠"),
                    skipped.name,
                    dim(&skipped.reason)
                );
            }
        }
    }

    // ── Page edits ───────────────────────────────────────────────────────
    if let Some(ref order) = cli.order {
        let pages = parse_page_list(order).context("Invalid --order")?;
        session.set_page_order(pages).context("Invalid --order")?;
    }
    if let Some(ref remove) = cli.remove {
        for page in parse_page_list(remove).context("Invalid --remove")? {
            session
                .remove_page(page)
                .with_context(|| format!("Cannot remove page {page}"))?;
        }
    }
    for m in &cli.moves {
        session
            .move_page(m.dragged, m.target, m.position)
            .with_context(|| format!("Cannot move page {}", m.dragged))?;
    }

    // ── Thumbnails ───────────────────────────────────────────────────────
    if let Some(ref dir) = cli.thumbnails {
        write_thumbnails(&session, dir, cli.quiet).await?;
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        print_info(&cli, &info, session.kept_pages().map(|k| k.as_slice()))?;
        return Ok(());
    }

    // ── Save ─────────────────────────────────────────────────────────────
    let dest = cli.output.clone().unwrap_or_else(|| default_destination(&cli.inputs));
    let (path, output) = session
        .save_to_path(&dest)
        .await
        .context("Failed to save PDF")?;

    if cli.json {
        let report = SaveReport {
            output: &path,
            file_name: &output.file_name,
            stats: &output.stats,
            kept_pages: session.kept_pages().map(|k| k.as_slice()).unwrap_or(&[]),
            skipped_inputs: session
                .loaded()
                .map(|d| d.skipped_sources().iter().map(|s| s.name.as_str()).collect())
                .unwrap_or_default(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        let stats = &output.stats;
        let compression = match stats.compression {
            Some(level) => format!("compression {level}"),
            None if stats.compression_failed => red("compression failed"),
            None => "not recompressed".to_string(),
        };
        eprintln!(
            "{}  {} pages  {} → {}  ({})  {}ms  →  {}",
            if stats.compression_failed {
                cyan("⚠")
            } else {
                green("✔")
            },
            stats.page_count,
            format_file_size(stats.original_size),
            format_file_size(stats.output_size),
            compression,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
    }

    Ok(())
}

/// The directory of the first PDF input, or the working directory.
fn default_destination(inputs: &[PathBuf]) -> PathBuf {
    inputs
        .iter()
        .find(|p| privatepdf::pipeline::input::is_pdf_path(p))
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn write_thumbnails(session: &EditSession, dir: &Path, quiet: bool) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut stream = session
        .thumbnail_stream()
        .context("Failed to render thumbnails")?;
    let mut written = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(thumb) => {
                let path = dir.join(format!("page-{}.png", thumb.page_number));
                tokio::fs::write(&path, &thumb.png)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                written += 1;
            }
            Err(e) => {
                if !quiet {
                    eprintln!("  {} {}", red("✗"), e);
                }
            }
        }
    }
    if !quiet {
        eprintln!(
            "{} {} thumbnails → {}",
            green("✔"),
            bold(&written.to_string()),
            dir.display()
        );
    }
    Ok(())
}

fn print_info(cli: &Cli, info: &DocumentInfo, kept: Option<&[u32]>) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(info).context("Failed to serialize document info")?
        );
        return Ok(());
    }

    for f in &info.source_files {
        println!("File:         {}", f);
    }
    if let Some(ref t) = info.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = info.author {
        println!("Author:       {}", a);
    }
    println!("Pages:        {}", info.page_count);
    println!("PDF Version:  {}", info.pdf_version);
    println!("Size:         {}", format_file_size(info.file_size_bytes));
    if let Some(ref p) = info.producer {
        println!("Producer:     {}", p);
    }
    if let Some(kept) = kept {
        if kept.len() as u32 != info.page_count || kept.windows(2).any(|w| w[0] > w[1]) {
            let list: Vec<String> = kept.iter().map(u32::to_string).collect();
            println!("Kept pages:   {}", list.join(","));
        }
    }
    for page in &info.pages {
        println!(
            "  {:>4}  {:>7.1} × {:<7.1} pt{}",
            page.page_number,
            page.width,
            page.height,
            if page.rotation != 0 {
                dim(&format!("  rotated {}°", page.rotation))
            } else {
                String::new()
            }
        );
    }
    Ok(())
}
