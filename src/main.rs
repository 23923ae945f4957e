use std::{process, sync::Arc, time::Duration};

use pazar::{
    application::{
        catalog::CatalogQueryEngine,
        error::AppError,
        favorites::FavoriteService,
        listings::ListingService,
        materials::MaterialResolver,
        messages::MessageService,
        repos::{
            CatalogRepo, FavoritesRepo, HealthRepo, ListingsRepo, ListingsWriteRepo, MessagesRepo,
        },
    },
    cache::{CacheConfig, CatalogCaches, InvalidationCoordinator},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use sqlx::postgres::PgPool;
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

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let http_state = build_http_state(repositories, &settings);
    serve_http(&settings, http_state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    apply_migrations(&pool).await?;
    info!(target = "pazar::migrate", "Migrations applied");
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(pool)
        .await
        .map_err(|err| AppError::from(InfraError::Migration(err.to_string())))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect_pool(settings).await?;
    apply_migrations(&pool).await?;
    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> HttpState {
    let catalog_repo: Arc<dyn CatalogRepo> = repositories.clone();
    let listings_repo: Arc<dyn ListingsRepo> = repositories.clone();
    let listings_write_repo: Arc<dyn ListingsWriteRepo> = repositories.clone();
    let favorites_repo: Arc<dyn FavoritesRepo> = repositories.clone();
    let messages_repo: Arc<dyn MessagesRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    if !cache_config.enabled {
        warn!(target = "pazar::cache", "Caching disabled; every read hits the store");
    }
    let caches = Arc::new(CatalogCaches::new(&cache_config));
    let invalidation = Arc::new(InvalidationCoordinator::new(&cache_config, caches.clone()));

    let catalog = Arc::new(CatalogQueryEngine::new(
        catalog_repo.clone(),
        caches,
        settings.catalog.page_size.get(),
        settings.database.query_timeout,
    ));

    HttpState {
        catalog,
        materials: MaterialResolver::new(catalog_repo),
        listings: ListingService::new(listings_repo, listings_write_repo, invalidation.clone()),
        favorites: FavoriteService::new(favorites_repo, invalidation.clone()),
        messages: MessageService::new(messages_repo, invalidation.clone()),
        invalidation,
        health: health_repo,
    }
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "pazar::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "pazar::serve", "Server stopped");
    Ok(())
}

/// Resolves on the first shutdown signal, then arms a hard deadline for
/// connections that do not drain in time.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "pazar::serve", error = %err, "failed to listen for ctrl-c");
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
                warn!(target = "pazar::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "pazar::serve",
        grace_seconds = grace.as_secs(),
        "Shutdown signal received; draining connections"
    );

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        error!(target = "pazar::serve", "Graceful shutdown deadline exceeded");
        process::exit(1);
    });
}
