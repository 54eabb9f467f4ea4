use clap::Parser;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

mod etrade_api;
mod platform;
mod utils;

use platform::monitor::PortfolioMonitor;
use platform::settings::Config;
use platform::source::SnapshotFile;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    settings: String,
    /// Classify a single snapshot, print it and exit
    #[arg(long)]
    once: bool,
}

fn get_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    }
}

fn start_logging(log_level: &str) {
    let subscriber = tracing_subscriber::fmt()
        // Display source code file paths
        .with_file(true)
        // Display source code line numbers
        .with_line_number(true)
        // Display the thread ID an event was recorded on
        .with_thread_ids(true)
        // Don't display the event's target (module path)
        .with_target(false)
        // Table goes to stdout, logs stay on stderr
        .with_writer(std::io::stderr)
        // Assign a log-level
        .with_max_level(get_log_level(log_level))
        // Use a more compact, abbreviated log format
        .compact()
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {err}");
    }
}

fn graceful_shutdown(is_graceful_shutdown: &mut bool, shutdown_signal: &CancellationToken) {
    *is_graceful_shutdown = true;
    info!("Graceful shutdown initiated");
    shutdown_signal.cancel();
}

#[tokio::main]
async fn main() {
    let cmdline_args = Args::parse();
    let settings = match Config::read_config_file(cmdline_args.settings.as_str()) {
        Err(val) => {
            eprintln!("Settings file error: {val}");
            std::process::exit(exitcode::CONFIG);
        }
        Ok(val) => val,
    };
    start_logging(settings.log_level.as_str());

    info!("___/********Options Portfolio********\\___");
    info!(
        "Account: {}, snapshot: {}",
        settings.account_id,
        settings.snapshot.display()
    );

    let source = SnapshotFile::new(settings.snapshot.clone(), settings.account_id.clone());
    let mut monitor = PortfolioMonitor::new(source, settings.expand_all);

    if cmdline_args.once {
        if let Err(err) = monitor.run_once().await {
            error!("Failed to classify positions, error: {}", err);
            std::process::exit(exitcode::DATAERR);
        }
        std::process::exit(exitcode::OK);
    }

    let cancel_token = CancellationToken::new();
    let mut is_graceful_shutdown = false;
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(val) => val,
        Err(err) => {
            error!("Failed to install SIGTERM handler, error: {}", err);
            std::process::exit(exitcode::OSERR);
        }
    };

    let refresh = Duration::from_secs(settings.refresh_secs);
    let mut monitor_handle = tokio::spawn(monitor.run(refresh, cancel_token.clone()));

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                if let Err(err) = (&mut monitor_handle).await {
                    error!("Portfolio monitor task failed, error: {}", err);
                }
                if is_graceful_shutdown {
                    std::process::exit(exitcode::OK);
                }
                else {
                    warn!("exiting early");
                    std::process::exit(exitcode::SOFTWARE)
                }
            }
            result = &mut monitor_handle => {
                if let Err(err) = result {
                    error!("Portfolio monitor task failed, error: {}", err);
                }
                if is_graceful_shutdown {
                    std::process::exit(exitcode::OK);
                }
                error!("Portfolio monitor stopped unexpectedly");
                std::process::exit(exitcode::SOFTWARE)
            }
            _ = sigterm.recv() => {
                graceful_shutdown(&mut is_graceful_shutdown, &cancel_token);
            }
            _ = signal::ctrl_c() => {
                graceful_shutdown(&mut is_graceful_shutdown, &cancel_token);
            }
        }
    }
}
