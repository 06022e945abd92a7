pub mod agent_core;
pub mod config;
pub mod context;
pub mod inference;
pub mod notify;
pub mod persona;
pub mod server;

use std::sync::Arc;

use anyhow::Context as _;

use config::AppConfig;
use context::AppContext;

/// Env var overriding the log directory.
const LOG_DIR_VAR: &str = "CAREER_CHAT_LOG_DIR";

/// Return the platform-standard data directory for career-chat.
///
/// - macOS: `~/Library/Application Support/career-chat/`
/// - Windows: `{FOLDERID_RoamingAppData}\career-chat\`
/// - Linux: `$XDG_DATA_HOME/career-chat/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.career-chat/` only if none of the above can be resolved.
pub(crate) fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("career-chat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".career-chat")
}

fn log_dir() -> std::path::PathBuf {
    match std::env::var(LOG_DIR_VAR) {
        Ok(dir) if !dir.trim().is_empty() => std::path::PathBuf::from(dir),
        _ => data_dir(),
    }
}

/// Initialize the tracing subscriber, writing structured logs to the log directory.
///
/// On each startup:
/// 1. Rotates existing logs (career-chat.log → .1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh career-chat.log with a line-flushing writer.
/// 3. Logs a startup banner with the log path for discoverability.
fn init_tracing() -> std::io::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("career-chat.log");
    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let flushing_writer = FlushingWriter::new(log_file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("career_chat=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(flushing_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== career-chat starting ==="
    );
    Ok(())
}

/// Rotate log files: `career-chat.log` → `.1` → `.2` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &std::path::Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write, so each
/// log line is on disk even if the process is killed.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run the chat server.
pub async fn run() -> anyhow::Result<()> {
    // `.env` may set RUST_LOG and the log directory, so it goes before tracing.
    let dotenv = config::apply_dotenv();
    init_tracing().context("failed to initialize logging")?;
    if let Some(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded .env");
    }

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(?config, "configuration resolved");

    let ctx = AppContext::from_config(&config).context("failed to start")?;
    server::serve(Arc::new(ctx), &config.server.bind)
        .await
        .with_context(|| format!("server on {} failed", config.server.bind))
}
