//! Session renewal against the mock backend.
//!
//! Run with: cargo test -p storefront-integration-tests

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use futures::future::join_all;
use secrecy::ExposeSecret;
use storefront_client::{ClientError, RequestOptions};
use storefront_core::Storage;
use storefront_core::storage::keys;
use storefront_integration_tests::{INITIAL_ACCESS, MockBackend};

const CONCURRENT_CALLS: usize = 10;

// ============================================================================
// Single-flight
// ============================================================================

#[tokio::test]
async fn test_concurrent_401s_share_one_renewal() {
    let backend = MockBackend::start().await.unwrap();
    let (api, storage) = backend.client_with_stale_session().unwrap();

    let calls = (0..CONCURRENT_CALLS).map(|_| api.get_cart());
    let results = join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap().len(), 2);
    }
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).as_deref(), Some("access-1"));
    assert_eq!(storage.get(keys::REFRESH_TOKEN).as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_rejected_renewal_fails_every_waiter() {
    let backend = MockBackend::start().await.unwrap();
    backend.state.reject_refresh.store(true, Ordering::SeqCst);
    let (api, storage) = backend.client_with_stale_session().unwrap();
    storage.set(keys::USER, r#"{"name":"Ana"}"#).unwrap();

    let calls = (0..CONCURRENT_CALLS).map(|_| api.get_cart());
    let results = join_all(calls).await;

    for result in results {
        assert!(matches!(result, Err(ClientError::AuthExpired)));
    }
    assert_eq!(backend.state.refreshes(), 1);
    assert!(!api.is_authenticated());
    assert!(api.session().refresh_token().is_none());
    assert!(api.current_user().is_none());
}

#[tokio::test]
async fn test_later_401_starts_a_new_renewal() {
    let backend = MockBackend::start().await.unwrap();
    let (api, storage) = backend.client_with_stale_session().unwrap();

    api.get_cart().await.unwrap();
    assert_eq!(backend.state.refreshes(), 1);

    // Invalidate the access credential again; the rotated refresh credential
    // stays valid.
    storage.set(keys::ACCESS_TOKEN, "stale-again").unwrap();
    api.get_cart().await.unwrap();
    assert_eq!(backend.state.refreshes(), 2);
}

#[tokio::test]
async fn test_missing_refresh_token_expires_session() {
    let backend = MockBackend::start().await.unwrap();
    let (api, storage) = backend.client().unwrap();
    storage.set(keys::ACCESS_TOKEN, "stale").unwrap();

    let err = api.get_cart().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthExpired));
    assert!(!api.is_authenticated());
}

// ============================================================================
// Retry bounds
// ============================================================================

#[tokio::test]
async fn test_rejected_retry_is_not_retried_again() {
    let backend = MockBackend::start().await.unwrap();
    let (api, _) = backend.client_with_stale_session().unwrap();

    let err = api
        .request("/always-401", &RequestOptions::get(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::AuthExpired));
    assert_eq!(backend.state.unauthorized_calls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.state.refreshes(), 1);
    assert!(!api.is_authenticated());
}

#[tokio::test]
async fn test_retry_disabled_surfaces_401() {
    let backend = MockBackend::start().await.unwrap();
    let (api, _) = backend.client_with_stale_session().unwrap();

    let err = api
        .request("/always-401", &RequestOptions::get(), false)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, ClientError::Http { .. }));
    assert_eq!(backend.state.unauthorized_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.refreshes(), 0);
    assert!(api.is_authenticated());
}

#[tokio::test]
async fn test_valid_token_needs_no_renewal() {
    let backend = MockBackend::start().await.unwrap();
    let (api, storage) = backend.client().unwrap();
    storage
        .set_many(&[(keys::ACCESS_TOKEN, INITIAL_ACCESS), (keys::REFRESH_TOKEN, "r")])
        .unwrap();

    api.get_cart().await.unwrap();
    assert_eq!(backend.state.refreshes(), 0);
    assert_eq!(
        api.session().access_token().unwrap().expose_secret(),
        INITIAL_ACCESS
    );
}
