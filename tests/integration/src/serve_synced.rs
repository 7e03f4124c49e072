//! Serving a checkout produced by the sync engine

use std::sync::Arc;

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use syncserve_cli::server;
use syncserve_core::{SyncEngine, SyncTarget};
use syncserve_fs::StaticGateway;
use syncserve_git::Git2Backend;
use syncserve_test_utils::UpstreamRepo;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn start_server(gateway: StaticGateway, shutdown: CancellationToken) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, gateway, shutdown, tracing::Span::none()));
    format!("http://{addr}")
}

async fn status_and_body(url: String) -> (StatusCode, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_synced_site_is_served_and_git_dir_hidden() {
    let upstream = UpstreamRepo::new();
    upstream.commit_file("index.html", "<h1>v1</h1>", "Publish v1");
    upstream.commit_file("blog/index.html", "<h1>blog</h1>", "Add blog");
    let dest = TempDir::new().unwrap();

    let target = SyncTarget::new(upstream.url(), dest.path())
        .unwrap()
        .with_branch("main");
    let engine = SyncEngine::new(target.clone(), Arc::new(Git2Backend::new()));
    engine.run_cycle().await.unwrap();

    let shutdown = CancellationToken::new();
    let base = start_server(StaticGateway::new(target.local_path().clone()), shutdown.clone()).await;

    assert_eq!(
        status_and_body(format!("{base}/")).await,
        (StatusCode::OK, "<h1>v1</h1>".to_string())
    );
    assert_eq!(
        status_and_body(format!("{base}/blog/")).await,
        (StatusCode::OK, "<h1>blog</h1>".to_string())
    );
    assert_eq!(
        status_and_body(format!("{base}/.git/HEAD")).await.0,
        StatusCode::NOT_FOUND
    );

    // The next pull is visible without restarting the server.
    upstream.commit_file("index.html", "<h1>v2</h1>", "Publish v2");
    engine.run_cycle().await.unwrap();
    assert_eq!(
        status_and_body(format!("{base}/")).await,
        (StatusCode::OK, "<h1>v2</h1>".to_string())
    );

    shutdown.cancel();
}

#[tokio::test]
async fn test_serve_root_subdirectory() {
    let upstream = UpstreamRepo::new();
    upstream.commit_file("public/index.html", "public", "Add public site");
    upstream.commit_file("private.txt", "private", "Add private file");
    let dest = TempDir::new().unwrap();

    let target = SyncTarget::new(upstream.url(), dest.path())
        .unwrap()
        .with_branch("main");
    SyncEngine::new(target.clone(), Arc::new(Git2Backend::new()))
        .run_cycle()
        .await
        .unwrap();

    let shutdown = CancellationToken::new();
    let gateway = StaticGateway::new(target.local_path().join("public"));
    let base = start_server(gateway, shutdown.clone()).await;

    assert_eq!(
        status_and_body(format!("{base}/")).await,
        (StatusCode::OK, "public".to_string())
    );
    assert_eq!(
        status_and_body(format!("{base}/private.txt")).await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_and_body(format!("{base}/../private.txt")).await.0,
        StatusCode::NOT_FOUND
    );

    shutdown.cancel();
}
