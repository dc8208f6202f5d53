use std::{future::IntoFuture, io::Write, process, sync::Arc};

use notebook::{
    application::{
        content::ContentLoader,
        error::AppError,
        reload::ReloadService,
        render::{ComrakRenderService, RenderPipelineConfig, RenderService},
    },
    config,
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{self, HttpState, ReloadAuthorizer},
        telemetry,
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

    if let config::Command::Stylesheet(_) = command {
        return run_stylesheet(&settings);
    }

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Load(_) => run_load(settings).await,
        config::Command::Stylesheet(_) => run_stylesheet(&settings),
    }
}

fn build_renderer(settings: &config::Settings) -> Result<Arc<ComrakRenderService>, AppError> {
    ComrakRenderService::new(RenderPipelineConfig::from(&settings.render))
        .map(Arc::new)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))
}

async fn build_reload_service(
    settings: &config::Settings,
) -> Result<(ReloadService, Arc<SqliteRepositories>), AppError> {
    let repositories = Arc::new(
        SqliteRepositories::open(&settings.database.path, settings.database.max_connections.get())
            .await?,
    );
    let renderer = build_renderer(settings)?;
    let loader = ContentLoader::new(
        settings.content.directory.clone(),
        renderer,
        settings.site.origin.clone(),
    );
    let reload = ReloadService::new(loader, repositories.clone());
    Ok((reload, repositories))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (reload, repositories) = build_reload_service(&settings).await?;

    if let Err(err) = reload.reload().await {
        warn!(error = %err, "startup load failed; serving with the existing store contents");
    }

    let state = HttpState {
        reload: Arc::new(reload),
        authorizer: Arc::new(ReloadAuthorizer::from_settings(&settings.reload)),
        db: repositories,
    };

    serve_http(&settings, state).await
}

async fn run_load(settings: config::Settings) -> Result<(), AppError> {
    let (reload, _) = build_reload_service(&settings).await?;
    let summary = reload.reload().await?;
    info!(
        loaded = summary.loaded,
        failed = summary.failed,
        "load complete"
    );
    Ok(())
}

fn run_stylesheet(settings: &config::Settings) -> Result<(), AppError> {
    let renderer = build_renderer(settings)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(renderer.stylesheet().as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        addr = %settings.server.addr,
        site = %settings.site.title,
        base_url = %settings.site.base_url,
        "listening"
    );

    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        },
    );

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        if drain_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline => {
            warn!(grace_seconds = grace.as_secs(), "graceful shutdown window elapsed");
        }
    }

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
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
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
