use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use visit_pass::adapters::gateway::{
    CallbackVerifier, HttpGatewayConfig, HttpPaymentGateway, SessionTokenCache,
};
use visit_pass::adapters::http::{self, AppState, LedgerPorts, LedgerSettings};
use visit_pass::adapters::postgres::{
    PostgresPaymentRepository, PostgresSubscriptionRepository, PostgresTemplateRepository,
    PostgresVisitRepository,
};
use visit_pass::adapters::reconciliation::{ReconciliationPoller, ReconciliationPollerConfig};
use visit_pass::config::AppConfig;
use visit_pass::ports::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server.log_level, config.is_production());
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    let templates = Arc::new(PostgresTemplateRepository::new(pool.clone()));
    let payments = Arc::new(PostgresPaymentRepository::new(pool.clone()));

    let gateway_config = HttpGatewayConfig::new(
        config.gateway.base_url.clone(),
        config.gateway.service_user.clone(),
        config.gateway.service_password.clone(),
        config.gateway.terminal_id.clone(),
    )
    .with_timeout(config.gateway.timeout());
    let gateway = HttpPaymentGateway::new(gateway_config, Arc::new(SessionTokenCache::new()))?;

    let ports = LedgerPorts {
        payments: payments.clone(),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        templates: templates.clone(),
        catalog: templates,
        visits: Arc::new(PostgresVisitRepository::new(pool)),
        gateway: Arc::new(gateway),
        clock: Arc::new(SystemClock),
    };

    let callback_verifier = CallbackVerifier::new(config.gateway.callback_secret.clone());
    if !callback_verifier.is_enabled() {
        warn!("Gateway callback signatures are not verified");
    }

    let settings = LedgerSettings {
        callback_urls: config.gateway.callback_urls(),
        payment_options: config.gateway.payment_options(),
        duplicate_window: config.redemption.duplicate_window()?,
        callback_verifier,
    };
    let state = AppState::new(ports.clone(), settings);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_task = if config.reconciliation.enabled {
        let poller = ReconciliationPoller::new(
            ports.payments.clone(),
            state.reconcile.clone(),
            ports.clock.clone(),
            ReconciliationPollerConfig::default()
                .with_interval(config.reconciliation.interval())
                .with_min_age(config.reconciliation.min_age())
                .with_batch_size(config.reconciliation.batch_size)
                .with_concurrency(config.reconciliation.concurrency),
        );
        Some(tokio::spawn(async move { poller.run(shutdown_rx).await }))
    } else {
        info!("Reconciliation poller disabled");
        None
    };

    let app = http::router(state, config.server.request_timeout());
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = poller_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Reconciliation poller ended abnormally");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// JSON lines in production, human-readable output elsewhere. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received");
}
