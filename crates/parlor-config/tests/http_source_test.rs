use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::json;

use parlor_config::{
    ConfigError, ConfigSettings, ConfigSource, HttpConfigSource, MESSAGE_LENGTH_KEY, RemoteConfig,
};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetches_flat_object() {
    let app = Router::new().route(
        "/config",
        get(|| async { Json(json!({ (MESSAGE_LENGTH_KEY): 42, "theme": "dark" })) }),
    );
    let base = serve(app).await;

    let source = HttpConfigSource::new(format!("{}/config", base));
    let values = source.fetch().await.unwrap();
    assert_eq!(values.get("theme"), Some(&json!("dark")));

    let mut config = RemoteConfig::new(Arc::new(source), ConfigSettings::default());
    assert_eq!(config.fetch_and_activate().await, 42);
}

#[tokio::test]
async fn test_bad_responses_are_errors() {
    let app = Router::new()
        .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/list", get(|| async { Json(json!([1, 2, 3])) }));
    let base = serve(app).await;

    let down = HttpConfigSource::new(format!("{}/down", base));
    assert!(matches!(down.fetch().await, Err(ConfigError::Transport(_))));

    let list = HttpConfigSource::new(format!("{}/list", base));
    assert!(matches!(list.fetch().await, Err(ConfigError::Malformed(_))));

    // Unreachable config leaves the default in place.
    let mut config = RemoteConfig::new(Arc::new(down), ConfigSettings::default());
    assert_eq!(config.fetch_and_activate().await, 10);
}
