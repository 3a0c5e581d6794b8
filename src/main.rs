use std::{process, sync::Arc};

use cornice::{
    application::{
        engagement::EngagementService,
        error::AppError,
        gallery::GalleryService,
        ingest::IngestService,
        repos::{EngagementRepo, ImagesRepo},
    },
    config,
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{self, GalleryState},
        storage::ContentStorage,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let (_cli, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let pool = SqliteRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::Database(err)))?;

    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::Migration(err)))?;

    let repositories = Arc::new(SqliteRepositories::new(pool));
    let storage = Arc::new(
        ContentStorage::new(settings.content.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let images_repo: Arc<dyn ImagesRepo> = repositories.clone();
    let engagement_repo: Arc<dyn EngagementRepo> = repositories.clone();

    let state = GalleryState {
        ingest: Arc::new(IngestService::new(
            images_repo.clone(),
            storage.clone(),
            settings.content.max_upload_bytes.get(),
            settings.content.max_width.get(),
        )),
        gallery: Arc::new(GalleryService::new(
            images_repo,
            settings.gallery.page_size,
        )),
        engagement: Arc::new(EngagementService::new(engagement_repo)),
        storage,
        db: repositories,
    };

    let router = http::build_router(state, settings.content.max_upload_bytes.get());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    info!(
        target = "cornice::server",
        addr = %settings.server.addr,
        content_dir = %settings.content.directory.display(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
