//! End-to-end sync: libgit2 transport, engine, queue and webhook delivery

mod support;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use pretty_assertions::assert_eq;
use syncserve_core::{
    Event, NotifyPolicy, PayloadTemplate, SyncAction, SyncEngine, SyncTarget, WebhookConfig,
    WebhookDispatcher, event_queue,
};
use syncserve_git::Git2Backend;
use syncserve_test_utils::UpstreamRepo;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use support::WebhookSink;

fn engine_for(upstream: &UpstreamRepo, dest: &TempDir) -> SyncEngine {
    let target = SyncTarget::new(upstream.url(), dest.path())
        .unwrap()
        .with_branch(upstream.branch());
    SyncEngine::new(target, Arc::new(Git2Backend::new()))
}

#[tokio::test]
async fn test_clone_then_pull_tracks_upstream() {
    let upstream = UpstreamRepo::new();
    upstream.commit_file("index.html", "v1", "Publish v1");
    let dest = TempDir::new().unwrap();
    let engine = engine_for(&upstream, &dest);
    let checkout = engine.target().local_path().to_native();

    let first = engine.run_cycle().await.unwrap().unwrap();
    assert_eq!(first, Event::new(upstream.url(), "main", SyncAction::Cloned));
    assert_eq!(fs::read_to_string(checkout.join("index.html")).unwrap(), "v1");

    upstream.commit_file("index.html", "v2", "Publish v2");
    let second = engine.run_cycle().await.unwrap().unwrap();
    assert_eq!(second.action(), SyncAction::Updated);
    assert_eq!(fs::read_to_string(checkout.join("index.html")).unwrap(), "v2");

    // Nothing new upstream: still reported under the default policy.
    let third = engine.run_cycle().await.unwrap().unwrap();
    assert_eq!(third.action(), SyncAction::Updated);
}

#[tokio::test]
async fn test_on_change_policy_with_real_backend() {
    let upstream = UpstreamRepo::new();
    let dest = TempDir::new().unwrap();
    let engine = engine_for(&upstream, &dest).with_notify_policy(NotifyPolicy::OnChange);

    assert!(engine.run_cycle().await.unwrap().is_some());
    assert!(engine.run_cycle().await.unwrap().is_none());

    upstream.commit_file("news.html", "fresh", "Add news");
    assert!(engine.run_cycle().await.unwrap().is_some());
}

#[tokio::test]
async fn test_events_reach_webhook_in_order() {
    let (sink, hook_url) = WebhookSink::start().await;
    let upstream = UpstreamRepo::new();
    let dest = TempDir::new().unwrap();
    let shutdown = CancellationToken::new();

    let config = WebhookConfig::new(
        &hook_url,
        "POST",
        PayloadTemplate::new(r#"{"action":"{{Action}}","branch":"{{Branch}}"}"#),
    )
    .unwrap();
    let dispatcher = WebhookDispatcher::new(config).unwrap();
    let (tx, rx) = event_queue();
    let dispatcher = tokio::spawn(dispatcher.run(rx, shutdown.clone()));

    let engine = engine_for(&upstream, &dest).with_events(tx);
    engine.run_cycle().await.unwrap();
    upstream.commit_file("page.html", "p", "Add page");
    engine.run_cycle().await.unwrap();
    drop(engine);

    tokio::time::timeout(Duration::from_secs(10), dispatcher)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        sink.received(),
        vec![
            (Method::POST, r#"{"action":"Cloned","branch":"main"}"#.to_string()),
            (Method::POST, r#"{"action":"Updated","branch":"main"}"#.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_get_webhook_with_action_repository_template() {
    let (sink, hook_url) = WebhookSink::start().await;
    let config = WebhookConfig::new(
        &hook_url,
        "GET",
        PayloadTemplate::new("{{Action}} {{Repository}}"),
    )
    .unwrap();
    let dispatcher = WebhookDispatcher::new(config).unwrap();

    dispatcher
        .deliver(&Event::new("test", "main", SyncAction::Updated))
        .await
        .unwrap();

    assert_eq!(sink.received(), vec![(Method::GET, "Updated test".to_string())]);
}

#[tokio::test]
async fn test_failed_clone_stops_loop_and_leaves_nothing() {
    let dest = TempDir::new().unwrap();
    let missing = dest.path().join("no-upstream");
    let target = SyncTarget::new(missing.display().to_string(), dest.path().join("out")).unwrap();
    let engine = SyncEngine::new(target, Arc::new(Git2Backend::new()));

    let result = tokio::time::timeout(Duration::from_secs(30), engine.run())
        .await
        .unwrap();

    assert!(result.is_err());
    assert!(!engine.target().local_path().to_native().exists());
}

#[tokio::test]
async fn test_once_mode_delivers_default_payload() {
    let (sink, hook_url) = WebhookSink::start().await;
    let upstream = UpstreamRepo::new();
    let dest = TempDir::new().unwrap();

    let cli = syncserve_cli::Cli {
        repo: Some(upstream.url()),
        dest: Some(dest.path().to_path_buf()),
        branch: Some("main".to_string()),
        webhook_url: Some(hook_url),
        once: true,
        ..Default::default()
    };
    let settings = syncserve_cli::Settings::resolve(cli).unwrap();

    syncserve_cli::app::run(settings).await.unwrap();

    assert_eq!(
        sink.wait_for(1).await,
        vec![format!("Cloned {}", upstream.url())]
    );
}
