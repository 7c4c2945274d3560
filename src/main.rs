use std::{process, sync::Arc, time::Duration as StdDuration};

use postline::{
    application::{
        accounts::AccountService,
        auth::{CredentialCodec, CredentialVerifier, PasswordScheme},
        error::AppError,
        files::FileStore,
        posts::PostService,
        reconcile::reconcile_post_lists,
        repos::{AccountsRepo, PostsRepo},
        status::StatusService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, HttpState, RouterState},
        security::{Argon2Scheme, JwtCodec},
        telemetry,
        uploads::UploadStorage,
    },
};
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

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Reconcile(_) => run_reconcile(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_router_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn run_reconcile(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let accounts: Arc<dyn AccountsRepo> = repositories;

    let report = reconcile_post_lists(accounts)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(
        target = "postline::reconcile",
        accounts_changed = report.accounts_changed,
        "reconcile finished"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<RouterState, AppError> {
    let token_secret = settings
        .auth
        .token_secret
        .as_deref()
        .ok_or_else(|| InfraError::configuration("auth.token_secret is not configured"))?;
    let token_ttl = time::Duration::try_from(settings.auth.token_ttl)
        .map_err(|err| InfraError::configuration(format!("auth.token_ttl_seconds: {err}")))?;

    let accounts_repo: Arc<dyn AccountsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();

    let codec: Arc<dyn CredentialCodec> = Arc::new(JwtCodec::from_secret(token_secret.as_bytes()));
    let passwords: Arc<dyn PasswordScheme> = Arc::new(Argon2Scheme::new());

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone()).map_err(InfraError::from)?,
    );
    let files: Arc<dyn FileStore> = upload_storage.clone();

    let account_service = Arc::new(AccountService::new(
        accounts_repo.clone(),
        passwords,
        codec.clone(),
        token_ttl,
    ));
    let post_service = Arc::new(
        PostService::new(posts_repo, accounts_repo.clone(), files)
            .with_page_size(settings.feed.page_size.get()),
    );
    let status_service = Arc::new(StatusService::new(accounts_repo));

    Ok(RouterState {
        http: HttpState {
            db: repositories,
            upload_storage: upload_storage.clone(),
        },
        api: ApiState {
            accounts: account_service,
            posts: post_service,
            status: status_service,
            verifier: CredentialVerifier::new(codec),
            upload_storage,
        },
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let upload_body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|err| InfraError::configuration(format!("uploads.max_request_bytes: {err}")))?;
    let router = http::build_router(state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| InfraError::server(err.to_string()))?;

    info!("server stopped");
    Ok(())
}

/// Resolves on the first shutdown signal and arms a watchdog that aborts the
/// process if in-flight requests do not drain within `grace`.
async fn shutdown_signal(grace: StdDuration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!(
        grace_seconds = grace.as_secs(),
        "shutdown requested; draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!("graceful shutdown timed out");
        process::exit(1);
    });
}
