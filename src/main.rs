use std::{process, sync::Arc};

use plantlog::{
    application::{
        error::AppError,
        health_logs::HealthLogService,
        plants::PlantService,
        repos::{HealthLogsRepo, HealthLogsWriteRepo, PlantsRepo, PlantsWriteRepo, StoreHealth},
        upstream::{ImageUploader, PlantDiagnoser},
    },
    cache::{CacheConfig, ReadThrough},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
        uploads::ScratchStorage,
        upstream::{CloudinaryUploader, GeminiDiagnoser},
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(
        target = "plantlog::migrate",
        "Database migrations applied"
    );
    repositories.pool().close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    if !settings.object_storage.is_configured() {
        return Err(InfraError::configuration(
            "object_storage.cloud_name, api_key and api_secret are required",
        )
        .into());
    }
    if !settings.diagnosis.is_configured() {
        return Err(InfraError::configuration("diagnosis.api_key is required").into());
    }

    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories, &settings).await?;
    serve_http(&settings, state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApiState, AppError> {
    let plants_repo: Arc<dyn PlantsRepo> = repositories.clone();
    let plants_write_repo: Arc<dyn PlantsWriteRepo> = repositories.clone();
    let health_logs_repo: Arc<dyn HealthLogsRepo> = repositories.clone();
    let health_logs_write_repo: Arc<dyn HealthLogsWriteRepo> = repositories.clone();
    let store_health: Arc<dyn StoreHealth> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let store = cache_config.connect().await?;
    info!(
        target = "plantlog::cache",
        backend = ?cache_config.backend,
        "Cache backend ready"
    );
    let cache = ReadThrough::new(store);

    let uploader: Arc<dyn ImageUploader> =
        Arc::new(CloudinaryUploader::new(&settings.object_storage)?);
    let diagnoser: Arc<dyn PlantDiagnoser> = Arc::new(GeminiDiagnoser::new(&settings.diagnosis)?);

    let scratch = Arc::new(
        ScratchStorage::new(settings.uploads.scratch_dir.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let plants = Arc::new(PlantService::new(
        plants_repo.clone(),
        plants_write_repo,
        cache.clone(),
        uploader.clone(),
    ));
    let health_logs = Arc::new(HealthLogService::new(
        health_logs_repo,
        health_logs_write_repo,
        plants_repo,
        cache,
        uploader,
        diagnoser,
    ));

    Ok(ApiState {
        plants,
        health_logs,
        scratch,
        store_health,
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.uploads.limit_bytes());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "plantlog::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = stop_rx.await;
        },
    );
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        _ = shutdown_signal() => {}
    }

    info!(
        target = "plantlog::http",
        timeout_secs = settings.server.graceful_shutdown.as_secs(),
        "Shutdown signal received; draining connections"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                target = "plantlog::http",
                "Graceful shutdown timed out; exiting with open connections"
            );
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
