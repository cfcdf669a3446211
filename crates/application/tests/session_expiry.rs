//! Integration tests for the session expiry notifier and the extend action.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Harness, Notice, RefreshMode, wait_for_pending, wait_for_refresh_call};
use pretty_assertions::assert_eq;
use tether_application::auth::{SESSION_EXPIRED_MESSAGE, SESSION_EXTENDED_MESSAGE};
use tether_application::ports::SessionStore;
use tether_application::{ExpiryCheck, RefreshPhase};
use tether_domain::{ApiRequest, PipelineSettings, TokenBundle};

#[tokio::test]
async fn warns_once_inside_the_window() {
    let harness = Harness::new(RefreshMode::Flat, "/dashboard");
    harness.signed_in().await;
    let expiry = &harness.pipeline.expiry;

    // 3600s session, 90s left.
    harness.clock.advance(3510);
    assert_eq!(
        expiry.poll_once().await,
        ExpiryCheck::Warned {
            remaining: Duration::from_secs(90)
        }
    );
    assert!(expiry.is_warning_pending());

    harness.clock.advance(10);
    assert_eq!(expiry.poll_once().await, ExpiryCheck::AlreadyWarned);
    harness.clock.advance(10);
    assert_eq!(expiry.poll_once().await, ExpiryCheck::AlreadyWarned);

    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::Expiring(Duration::from_secs(90))]
    );
}

#[tokio::test]
async fn stays_quiet_outside_the_window() {
    let harness = Harness::new(RefreshMode::Flat, "/dashboard");
    let expiry = &harness.pipeline.expiry;
    assert_eq!(expiry.poll_once().await, ExpiryCheck::NoSession);

    harness.signed_in().await;
    harness.clock.advance(3480);
    assert_eq!(
        expiry.poll_once().await,
        ExpiryCheck::Healthy {
            remaining: Duration::from_secs(120)
        }
    );
    assert_eq!(harness.notifier.expiring_count(), 0);
}

#[tokio::test]
async fn renewed_session_rearms_the_warning() {
    let harness = Harness::new(RefreshMode::Flat, "/dashboard");
    harness.signed_in().await;
    let expiry = &harness.pipeline.expiry;

    harness.clock.advance(3510);
    expiry.poll_once().await;
    assert_eq!(harness.notifier.expiring_count(), 1);

    harness
        .store
        .set_tokens(TokenBundle::new("access-7", Some("refresh-7".to_string()), 100))
        .await
        .unwrap();
    assert_eq!(
        expiry.poll_once().await,
        ExpiryCheck::Warned {
            remaining: Duration::from_secs(100)
        }
    );
    assert_eq!(harness.notifier.expiring_count(), 2);
}

#[tokio::test]
async fn elapsed_session_is_terminated() {
    let harness = Harness::new(RefreshMode::Flat, "/agents/3");
    harness.signed_in().await;

    harness.clock.advance(3600);
    assert_eq!(harness.pipeline.expiry.poll_once().await, ExpiryCheck::Expired);

    assert!(harness.store.session().await.is_none());
    assert_eq!(harness.navigator.redirects(), vec!["/login".to_string()]);
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::Error(SESSION_EXPIRED_MESSAGE.to_string())]
    );
    assert_eq!(harness.pipeline.expiry.poll_once().await, ExpiryCheck::NoSession);
}

#[tokio::test]
async fn extend_session_refreshes_and_clears_the_warning() {
    let harness = Harness::new(RefreshMode::Nested, "/dashboard");
    harness.signed_in().await;
    let expiry = &harness.pipeline.expiry;

    harness.clock.advance(3510);
    expiry.poll_once().await;
    assert!(expiry.is_warning_pending());

    expiry.extend_session().await.unwrap();

    assert!(!expiry.is_warning_pending());
    let session = harness.store.session().await.unwrap();
    assert_eq!(session.access_token, "access-2");
    assert_eq!(session.user.email, "ada@example.com");
    assert_eq!(harness.transport.refresh_requests(), 1);
    assert_eq!(
        harness.notifier.notices().last(),
        Some(&Notice::Success(SESSION_EXTENDED_MESSAGE.to_string()))
    );
    assert!(matches!(expiry.poll_once().await, ExpiryCheck::Healthy { .. }));
}

#[tokio::test]
async fn failed_extension_ends_the_session() {
    let harness = Harness::new(RefreshMode::Rejected, "/dashboard");
    harness.signed_in().await;

    let err = harness.pipeline.expiry.extend_session().await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(harness.store.session().await.is_none());
    assert_eq!(harness.navigator.redirects(), vec!["/login".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn extend_session_joins_an_automatic_refresh() {
    let harness = Harness::new(RefreshMode::Flat, "/dashboard");
    harness.signed_in().await;
    harness.transport.hold_refreshes();

    let request = tokio::spawn({
        let client = harness.pipeline.client.clone();
        async move { client.send(ApiRequest::get("/agents")).await }
    });
    wait_for_refresh_call(&harness.transport, 1).await;
    assert_eq!(harness.coordinator().phase(), RefreshPhase::Refreshing);

    let extend = tokio::spawn({
        let expiry = Arc::clone(&harness.pipeline.expiry);
        async move { expiry.extend_session().await }
    });
    wait_for_pending(harness.coordinator(), 1).await;
    harness.transport.release_refresh();

    request.await.unwrap().unwrap();
    extend.await.unwrap().unwrap();
    assert_eq!(harness.transport.refresh_requests(), 1);
}

#[tokio::test]
async fn run_loop_polls_and_stops_on_shutdown() {
    let settings = PipelineSettings {
        poll_interval_secs: 1,
        ..PipelineSettings::default()
    };
    let harness = Harness::with_settings(RefreshMode::Flat, "/dashboard", settings);
    harness.signed_in().await;
    harness.clock.advance(3510);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let expiry = Arc::clone(&harness.pipeline.expiry);
    let runner = tokio::spawn(async move { expiry.run(shutdown_rx).await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.notifier.expiring_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(harness.notifier.expiring_count(), 1);
}
