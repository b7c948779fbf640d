use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::config::AppConfig;
use crate::application::services::{
    AccountLocks, DailyReset, NotificationDispatcher, PollingScheduler, SessionAuthenticator,
    SessionRefresher, SessionService, SignInExecutor, TaskService,
};
use crate::presentation::state::{AppState, Loops, Repositories, Runtime, Services};
use dormcheck_domain::notification::NotificationSender;
use dormcheck_domain::platform::{CaptchaSolver, PlatformClient};
use dormcheck_domain::session::SessionRepository;
use dormcheck_domain::task::SignTaskRepository;
use dormcheck_infrastructure::captcha::DashScopeCaptchaSolver;
use dormcheck_infrastructure::http::PlatformHttpClient;
use dormcheck_infrastructure::notification::EmailSender;
use dormcheck_infrastructure::persistence::{
    repositories::{SqliteSessionRepository, SqliteSignTaskRepository},
    Database,
};
use dormcheck_infrastructure::security::{SaltStore, SecretCipher};

pub async fn build_app_state(config: AppConfig) -> Result<AppState> {
    let startup_started_at = Instant::now();

    let started_at = Instant::now();
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("Failed to create data directory {}", config.data_dir.display())
    })?;
    info!(
        "✓ Ensured data dir {:?} exists ({}ms)",
        config.data_dir,
        started_at.elapsed().as_millis()
    );

    info!("🔐 Initializing encryption...");
    let started_at = Instant::now();
    let salt = SaltStore::new(&config.data_dir)
        .load_or_create()
        .context("Failed to initialize encryption salt")?;
    let cipher = Arc::new(
        SecretCipher::derive(&config.master_password, &salt)
            .context("Failed to derive encryption key")?,
    );
    info!(
        "✓ Encryption initialized ({}ms)",
        started_at.elapsed().as_millis()
    );

    let db_path = config.database_path();
    info!("🔌 Connecting to database {:?}...", db_path);
    let started_at = Instant::now();
    let database = Database::new(&db_path)
        .await
        .context("Failed to open database")?;
    info!(
        "✓ Database connection established ({}ms)",
        started_at.elapsed().as_millis()
    );

    info!("🔄 Running migrations...");
    let started_at = Instant::now();
    database
        .run_migrations()
        .await
        .context("Failed to run migrations")?;
    info!(
        "✓ Migrations completed ({}ms)",
        started_at.elapsed().as_millis()
    );

    let pool = database.pool();
    let task_repo =
        Arc::new(SqliteSignTaskRepository::new(pool.clone())) as Arc<dyn SignTaskRepository>;
    let session_repo = Arc::new(SqliteSessionRepository::new(pool, cipher))
        as Arc<dyn SessionRepository>;

    let timeouts = config.timeouts.to_timeout_config();
    let platform = Arc::new(
        PlatformHttpClient::new(config.platform.clone(), &timeouts)
            .context("Failed to create platform client")?,
    ) as Arc<dyn PlatformClient>;
    let solver = Arc::new(
        DashScopeCaptchaSolver::new(config.captcha.clone(), &timeouts)
            .context("Failed to create captcha solver")?,
    ) as Arc<dyn CaptchaSolver>;

    let (notifications, notification_worker) = match &config.smtp {
        Some(smtp) => {
            let sender = Arc::new(
                EmailSender::new(smtp, &timeouts).context("Failed to create SMTP sender")?,
            ) as Arc<dyn NotificationSender>;
            info!("✓ Result emails enabled via {}:{}", smtp.host, smtp.port);
            let (dispatcher, worker) = NotificationDispatcher::spawn(sender);
            (dispatcher, Some(worker))
        }
        None => {
            warn!("No smtp section configured, result emails are disabled");
            (NotificationDispatcher::disabled(), None)
        }
    };

    let locks = Arc::new(AccountLocks::new());
    let authenticator = Arc::new(SessionAuthenticator::new(platform.clone(), solver));

    let executor = Arc::new(SignInExecutor::new(
        task_repo.clone(),
        session_repo.clone(),
        platform.clone(),
        locks.clone(),
        notifications.clone(),
    ));
    let sessions = Arc::new(SessionService::new(
        authenticator,
        platform,
        session_repo.clone(),
        locks,
    ));
    let tasks = Arc::new(TaskService::new(task_repo.clone()));

    let loops = Loops {
        polling: Arc::new(PollingScheduler::new(
            task_repo.clone(),
            executor.clone(),
            config.schedule.retry_cooldown(),
        )),
        refresher: Arc::new(SessionRefresher::new(
            session_repo.clone(),
            sessions.clone(),
        )),
        reset: Arc::new(DailyReset::new(task_repo.clone())),
    };

    info!(
        "✓ Application state ready ({}ms total)",
        startup_started_at.elapsed().as_millis()
    );

    Ok(AppState {
        runtime: Runtime {
            config,
            db: Arc::new(database),
        },
        repositories: Repositories {
            task: task_repo,
            session: session_repo,
        },
        services: Services {
            tasks,
            sessions,
            executor,
            notifications,
        },
        loops,
        notification_worker,
    })
}
