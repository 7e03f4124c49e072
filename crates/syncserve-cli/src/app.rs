//! Wires the sync engine, webhook dispatcher and HTTP server together

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use syncserve_core::{SyncEngine, WebhookDispatcher, event_queue};
use syncserve_fs::StaticGateway;
use syncserve_git::Git2Backend;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::server;

/// Run until a signal arrives or the sync loop fails.
///
/// With `settings.once` a single cycle runs, its event is delivered and the
/// function returns without starting the HTTP server.
pub async fn run(settings: Settings) -> Result<()> {
    let target = settings.target()?;
    let shutdown = CancellationToken::new();

    let mut engine = SyncEngine::new(target.clone(), Arc::new(Git2Backend::new()))
        .with_interval(settings.interval)
        .with_operation_timeout(settings.timeout)
        .with_notify_policy(settings.notify)
        .with_shutdown(shutdown.clone())
        .with_span(info_span!("sync", repository = %target.repository_url(), branch = %target.branch()));

    let dispatcher = match settings.webhook()? {
        Some(config) => {
            let (tx, rx) = event_queue();
            engine = engine.with_events(tx);
            let dispatcher = WebhookDispatcher::new(config)?
                .with_span(info_span!("webhook", url = ?settings.webhook_url));
            Some(tokio::spawn(dispatcher.run(rx, shutdown.clone())))
        }
        None => {
            info!("No webhook URL configured; notifications disabled");
            None
        }
    };

    if settings.once {
        let event = engine.run_cycle().await;
        // Closing the queue lets the dispatcher drain the event and stop.
        drop(engine);
        join_dispatcher(dispatcher).await;
        event?;
        return Ok(());
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    let listener = TcpListener::bind(addr).await?;
    let gateway = StaticGateway::new(settings.serve_root(&target));
    let server = tokio::spawn(server::serve(
        listener,
        gateway,
        shutdown.clone(),
        info_span!("http", port = settings.port),
    ));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                () = shutdown_signal() => shutdown.cancel(),
                () = shutdown.cancelled() => {}
            }
        }
    });

    let result = engine.run().await;
    shutdown.cancel();
    drop(engine);

    join_dispatcher(dispatcher).await;
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "HTTP server failed"),
        Err(e) => warn!(error = %e, "HTTP server task failed"),
    }

    result?;
    info!("Shut down cleanly");
    Ok(())
}

async fn join_dispatcher(dispatcher: Option<JoinHandle<()>>) {
    if let Some(handle) = dispatcher
        && let Err(e) = handle.await
    {
        warn!(error = %e, "Webhook dispatcher task failed");
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
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
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
