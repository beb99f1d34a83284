//! Logging setup.
//!
//! - JSON file logging through `tracing` with a daily rolling appender
//! - `log` macros bridged into `tracing`
//! - gzip compression of rolled files in the background
//! - miette report handler tuned to the detected terminal

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flate2::write::GzEncoder;
use flate2::Compression;
use supports_color::Stream;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix of the rolling log. Rolled files get a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "aim-studio.log";

static TERMINAL_CAPS: OnceLock<TerminalCapabilities> = OnceLock::new();

fn get_terminal_caps() -> &'static TerminalCapabilities {
    TERMINAL_CAPS.get_or_init(TerminalCapabilities::detect)
}

// ============================================================================
// Terminal Capability Detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLevel {
    TrueColor,
    Ansi256,
    Ansi16,
    NoColor,
}

#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub color_level: ColorLevel,
    pub supports_unicode: bool,
    pub is_interactive: bool,
    pub width: u16,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let color_level = match supports_color::on(Stream::Stdout) {
            Some(support) if support.has_16m => ColorLevel::TrueColor,
            Some(support) if support.has_256 => ColorLevel::Ansi256,
            Some(support) if support.has_basic => ColorLevel::Ansi16,
            _ => ColorLevel::NoColor,
        };

        let is_interactive = io::stdout().is_terminal();
        let width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80);

        let supports_unicode = std::env::var("TERM")
            .map(|t| !t.contains("dumb"))
            .unwrap_or(true)
            && std::env::var("LANG")
                .map(|l| l.contains("UTF-8") || l.contains("utf8"))
                .unwrap_or(true);

        Self {
            color_level,
            supports_unicode,
            is_interactive,
            width,
        }
    }

    pub fn should_colorize(&self) -> bool {
        self.is_interactive && self.color_level != ColorLevel::NoColor
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize logging for TUI mode.
///
/// Everything goes to a JSON file under `log_dir`; there is no stdout layer
/// because ratatui owns the terminal. The returned guard must stay alive
/// until shutdown so buffered lines get flushed.
pub fn init_tui(log_dir: &Path) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(file_layer).init();

    // `init` above may already have installed the bridge
    if let Err(e) = tracing_log::LogTracer::init() {
        log::debug!("LogTracer not installed: {e}");
    }

    init_miette();

    let log_dir_owned = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(log_dir_owned);
    });

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_PREFIX)
    );

    guard
}

/// Whether `name` is a rolled log from a previous day that is not yet compressed.
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(&format!("{LOG_FILE_PREFIX}."))
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

fn compress_old_logs(log_dir: PathBuf) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(&log_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !should_compress(name, &today_suffix) {
            continue;
        }
        match compress_file(&path) {
            Ok(()) => log::info!("Compressed old log: {:?}", path),
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);

    let mut gz_path_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_path_name.push(".gz");
    let parent_dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?;
    let gz_path = parent_dir.join(gz_path_name);

    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(())
}

fn init_miette() {
    let caps = get_terminal_caps();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(caps.color_level == ColorLevel::TrueColor)
                .unicode(caps.supports_unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(caps.should_colorize())
                .build(),
        )
    }))
    .ok(); // already set
}
