//! orbmind — run the orb against a host over stdin/stdout
//!
//! Usage:
//!   orbmind                          → serve the bridge protocol on stdio
//!   orbmind --config orbmind.toml    → same, with tuned parameters
//!   orbmind --dump-config            → print the effective config as TOML

use clap::Parser;
use orbmind::Bridge;
use orbmind_cognition::{OrbConfig, OrbController};
use orbmind_runtime::OrbHandle;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "orbmind",
    about = "Cognitive synthesis engine for a floating assistant orb",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Path to the orb config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective config as TOML and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,

    /// Write logs to a file (in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());

    let config = match &cli.config {
        Some(path) => OrbConfig::load(path),
        None => OrbConfig::default(),
    };

    if cli.dump_config {
        println!("{}", config.to_toml());
        return Ok(());
    }

    let controller = OrbController::with_reference_collaborators(config);
    let orb = OrbHandle::start(controller);
    Bridge::new(orb)
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await?;
    Ok(())
}

/// Logs go to stderr; stdout belongs to the bridge protocol.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "orbmind=info,orbmind_cognition=info,orbmind_runtime=info".into()
        })
    };
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr)
            .init();
        return None;
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "orbmind.log".into());
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(filter())
        .with(stderr)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Some(guard)
}
