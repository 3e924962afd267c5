use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskd::{config::ServerConfig, storage::Storage, web, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "taskd",
    about = "taskd — self-hosted task tracker web server",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database, config, and attachments
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Log output format: "pretty" or "json"
    #[arg(long, env = "TASKD_LOG_FORMAT")]
    log_format: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server (default when no subcommand given).
    ///
    /// Runs taskd in the foreground.
    ///
    /// Examples:
    ///   taskd serve
    ///   taskd
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        // `serve` is the default subcommand.
        None | Some(Command::Serve) => run_server(args).await,
    }
}

async fn run_server(args: Args) -> Result<()> {
    let config = Arc::new(ServerConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.log_format,
        args.bind_address,
    ));

    let _log_guard = init_tracing(&config.log, &config.log_format, args.log_file.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "taskd starting");
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        bind = %config.bind_address,
        "config loaded"
    );

    install_panic_hook(config.data_dir.clone());
    report_previous_crash(&config.data_dir);

    let storage = Arc::new(
        Storage::new_with_slow_query(&config.data_dir, config.slow_query_threshold_ms).await?,
    );

    let ctx = Arc::new(AppContext::new(config, storage));
    web::start_web_server(ctx).await
}

/// Initialize the tracing stack: an `EnvFilter` plus one fmt layer per sink.
///
/// Stdout is always a sink; `--log-file` adds a daily-rotated file. Both
/// honor `log_format` ("pretty" or "json"). The returned guard flushes the
/// file writer and must stay alive for the process lifetime.
fn init_tracing(
    log_level: &str,
    log_format: &str,
    log_file: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let json = log_format == "json";
    let mut layers = vec![if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().compact().boxed()
    }];

    let mut guard = None;
    if let Some(path) = log_file {
        match rolling_log_writer(path) {
            Ok((writer, g)) => {
                layers.push(if json {
                    fmt::layer().json().with_writer(writer).boxed()
                } else {
                    fmt::layer().with_writer(writer).boxed()
                });
                guard = Some(g);
            }
            // A bad log path must not stop the server; stdout still works.
            Err(e) => eprintln!("warn: cannot open log file '{}': {e}", path.display()),
        }
    }

    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(layers)
        .init();
    guard
}

/// Open a daily-rotated, non-blocking writer at `path`, creating parent
/// directories as needed.
fn rolling_log_writer(
    path: &std::path::Path,
) -> std::io::Result<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => std::path::Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));
    Ok(tracing_appender::non_blocking(
        tracing_appender::rolling::daily(dir, file_name),
    ))
}

// ── Crash reporting ──────────────────────────────────────────────────────────

/// On panic, leave a report at `{data_dir}/crash.log` once the default hook
/// has printed to stderr. `report_previous_crash` surfaces it on next start.
fn install_panic_hook(data_dir: std::path::PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        let report = format!(
            "taskd {} {info}\nbacktrace:\n{}\n",
            env!("CARGO_PKG_VERSION"),
            std::backtrace::Backtrace::force_capture()
        );
        let _ = std::fs::write(data_dir.join("crash.log"), report);
    }));
}

/// Log and clear the crash report left by a previous run, if any.
fn report_previous_crash(data_dir: &std::path::Path) {
    let path = data_dir.join("crash.log");
    if let Ok(report) = std::fs::read_to_string(&path) {
        tracing::error!(report = %report.trim(), "previous run ended in a panic");
        let _ = std::fs::remove_file(&path);
    }
}
