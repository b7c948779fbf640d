use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

use dormcheck_lib::application::config::AppConfig;
use dormcheck_lib::application::services::BackgroundLoops;
use dormcheck_lib::presentation::bootstrap::build_app_state;
use dormcheck_lib::presentation::cli::{Cli, Command};
use dormcheck_lib::presentation::commands;
use dormcheck_lib::presentation::state::AppState;

/// How long queued result emails get to go out after shutdown
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

fn init_logging(config: &AppConfig) {
    let log_dir = config.log_dir();

    match dormcheck_infrastructure::logging::init_logger(&log_dir, config.log_level.as_str()) {
        Ok(()) => {
            info!("🚀 DormCheck starting...");
            info!("📝 File logging initialized at: {}", log_dir.display());
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {:#}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| {
                            tracing_subscriber::EnvFilter::new(config.log_level.as_str())
                        }),
                )
                .with_target(true)
                .with_line_number(true)
                .try_init();
        }
    }
}

async fn run_daemon(state: &AppState) -> Result<()> {
    let background = BackgroundLoops::start(
        &state.runtime.config.schedule,
        state.loops.polling.clone(),
        state.loops.refresher.clone(),
        state.loops.reset.clone(),
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("🛑 Shutdown requested");

    background.shutdown().await;
    Ok(())
}

/// Let queued result emails go out, then close the database
async fn close(state: AppState) {
    let AppState {
        runtime,
        repositories,
        services,
        loops,
        notification_worker,
    } = state;

    // Every dispatcher clone must go before the worker can drain and exit
    drop(loops);
    drop(services);
    drop(repositories);

    if let Some(worker) = notification_worker {
        match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, worker).await {
            Ok(Ok(())) => info!("Pending notifications delivered"),
            Ok(Err(e)) => warn!("Notification worker ended abnormally: {}", e),
            Err(_) => warn!(
                "Gave up waiting for notifications after {}s",
                NOTIFICATION_DRAIN_TIMEOUT.as_secs()
            ),
        }
    }

    runtime.db.close().await;
    info!("👋 DormCheck stopped");
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = AppConfig::config_path(cli.config.as_deref());
    let config = AppConfig::load(&config_path)?;
    init_logging(&config);
    info!(
        "Config loaded from {} (data dir {})",
        config_path.display(),
        config.data_dir.display()
    );

    let state = build_app_state(config).await?;

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(&state).await,
        Command::Bind { account_id } => commands::bind(&state, &account_id).await,
        Command::Sessions => commands::sessions(&state).await,
        Command::Activities { account_id } => commands::activities(&state, &account_id).await,
        Command::Task { command } => commands::task(&state, command).await,
        Command::Tick => commands::tick(&state).await,
    };

    close(state).await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let line = commands::render_error(&e);
            error!("{}", line);
            eprintln!("Error: {}", line);
            ExitCode::FAILURE
        }
    }
}
