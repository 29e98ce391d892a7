//! Azure App Configuration backend against an in-process REST mock

mod common;

use common::{init_rustls, start_app_config_mock, AppConfigMock};
use parameter_store_controller::provider::azure::{AzureAppConfiguration, StaticTokenCredential};
use parameter_store_controller::provider::{ParameterBackend, ResolvedValue, TransportError};
use parameter_store_controller::ControllerConfig;
use std::sync::atomic::Ordering;
use std::sync::Arc;

async fn backend(mock: &Arc<AppConfigMock>) -> AzureAppConfiguration {
    init_rustls();
    let endpoint = start_app_config_mock(Arc::clone(mock)).await;
    let config = ControllerConfig {
        endpoint_override: Some(endpoint),
        ..Default::default()
    };
    AzureAppConfiguration::new(&config).unwrap()
}

#[tokio::test]
async fn test_key_with_slashes_is_resolved_verbatim() {
    let mock = Arc::new(AppConfigMock::new(&[("/app/db-url", "postgres://db")], vec![]));
    let store = backend(&mock).await;

    let resolved = store.resolve_by_name("/app/db-url").await.unwrap();

    assert_eq!(resolved, ResolvedValue::new("/app/db-url", "postgres://db"));
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let mock = Arc::new(AppConfigMock::new(&[], vec![]));
    let store = backend(&mock).await;

    let err = store.resolve_by_name("/app/missing").await.unwrap_err();

    assert_eq!(err, TransportError::NotFound("/app/missing".to_string()));
}

#[tokio::test]
async fn test_rejected_token_is_a_request_error() {
    init_rustls();
    let mock = Arc::new(AppConfigMock::new(&[("/app/user", "admin")], vec![]));
    let endpoint = start_app_config_mock(Arc::clone(&mock)).await;
    let store = AzureAppConfiguration::with_credential(
        &endpoint,
        Arc::new(StaticTokenCredential::new("wrong-token")),
    )
    .unwrap();

    let err = store.resolve_by_name("/app/user").await.unwrap_err();

    assert!(matches!(err, TransportError::Request(_)), "got {err:?}");
    assert!(err.to_string().contains("401"), "got {err}");
}

#[tokio::test]
async fn test_prefix_listing_follows_next_link_and_first_duplicate_wins() {
    let mock = Arc::new(AppConfigMock::new(
        &[],
        vec![
            vec![("/app/token", "v2"), ("/app/db-url", "postgres://db")],
            vec![("/app/token", "v1"), ("/other/token", "x")],
            vec![("/app/nested/user", "admin")],
        ],
    ));
    let store = backend(&mock).await;

    let values = store.resolve_by_prefix("/app/", true).await.unwrap();

    assert_eq!(mock.requests.load(Ordering::SeqCst), 3);
    assert_eq!(
        values,
        vec![
            ResolvedValue::new("TOKEN", "v2"),
            ResolvedValue::new("DB_URL", "postgres://db"),
            ResolvedValue::new("USER", "admin"),
        ]
    );
}

#[tokio::test]
async fn test_prefix_without_matches_is_empty() {
    let mock = Arc::new(AppConfigMock::new(&[], vec![vec![("/other/token", "x")]]));
    let store = backend(&mock).await;

    let values = store.resolve_by_prefix("/app/", true).await.unwrap();

    assert!(values.is_empty());
}

#[tokio::test]
async fn test_not_found_on_later_page_discards_earlier_pages() {
    let mut mock = AppConfigMock::new(
        &[],
        vec![vec![("/app/a", "1")], vec![("/app/b", "2")]],
    );
    mock.missing_from_page = Some(1);
    let mock = Arc::new(mock);
    let store = backend(&mock).await;

    let err = store.resolve_by_prefix("/app/", true).await.unwrap_err();

    assert!(matches!(err, TransportError::Request(_)), "got {err:?}");
    assert!(err.to_string().contains("404"), "got {err}");
    assert_eq!(mock.requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_not_found_on_first_page_is_not_an_empty_result() {
    let mut mock = AppConfigMock::new(&[], vec![vec![("/app/a", "1")]]);
    mock.missing_from_page = Some(0);
    let mock = Arc::new(mock);
    let store = backend(&mock).await;

    let err = store.resolve_by_prefix("/app/", true).await.unwrap_err();

    assert!(matches!(err, TransportError::Request(_)), "got {err:?}");
}
