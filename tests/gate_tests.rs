use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use galponero::api::AppState;
use galponero::config::Config;
use galponero::services::GateError;
use http_body_util::BodyExt;
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "galponero_default_api_key_please_regenerate";
const DEFAULT_CLAVE: &str = "gallos2024";

async fn spawn_app() -> (Router, Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.images_path = dir.path().join("images").to_string_lossy().into_owned();
    config.general.web_path = dir.path().join("web").to_string_lossy().into_owned();
    config.server.secure_cookies = false;

    let state = galponero::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    (galponero::api::router(state.clone()).await, state, dir)
}

#[tokio::test]
async fn default_clave_works_without_prior_setup() {
    let (_app, state, _dir) = spawn_app().await;

    // No profile row exists yet; verification seeds and accepts the default.
    let verdict = state.gate().verify(1, 1, DEFAULT_CLAVE).await.unwrap();
    assert!(verdict.is_authorized());

    let verdict = state.gate().verify(1, 1, "otra-clave").await.unwrap();
    assert!(!verdict.is_authorized());

    let verdict = state.gate().verify(1, 1, "").await.unwrap();
    assert!(!verdict.is_authorized());
}

#[tokio::test]
async fn verification_is_scoped_to_the_owner() {
    let (_app, state, _dir) = spawn_app().await;

    let config = state.config().await;
    let other = state
        .store()
        .create_user("vecino", "segura12345", &config.security)
        .await
        .unwrap();

    // A different session user never passes, even with the right key.
    let verdict = state
        .gate()
        .verify(1, other.id, DEFAULT_CLAVE)
        .await
        .unwrap();
    assert!(!verdict.is_authorized());

    // And each user holds an independent key.
    let verdict = state
        .gate()
        .verify(other.id, other.id, DEFAULT_CLAVE)
        .await
        .unwrap();
    assert!(verdict.is_authorized());
}

#[tokio::test]
async fn change_clave_validations() {
    let (_app, state, _dir) = spawn_app().await;
    let gate = state.gate();

    let err = gate.change_clave(1, "", "nueva-clave", "nueva-clave").await;
    assert!(matches!(err, Err(GateError::Validation(_))));

    let err = gate
        .change_clave(1, DEFAULT_CLAVE, "nueva-clave", "distinta")
        .await;
    assert!(matches!(err, Err(GateError::Validation(_))));

    let err = gate.change_clave(1, DEFAULT_CLAVE, "abc", "abc").await;
    assert!(matches!(err, Err(GateError::Validation(_))));

    let err = gate
        .change_clave(1, DEFAULT_CLAVE, DEFAULT_CLAVE, DEFAULT_CLAVE)
        .await;
    assert!(matches!(err, Err(GateError::Validation(_))));

    let err = gate
        .change_clave(1, "clave-equivocada", "nueva-clave", "nueva-clave")
        .await;
    assert!(matches!(err, Err(GateError::Denied)));
}

#[tokio::test]
async fn change_and_reset_roundtrip() {
    let (_app, state, _dir) = spawn_app().await;
    let gate = state.gate();

    gate.change_clave(1, DEFAULT_CLAVE, "mi-clave-nueva", "mi-clave-nueva")
        .await
        .unwrap();

    assert!(!gate.verify(1, 1, DEFAULT_CLAVE).await.unwrap().is_authorized());
    assert!(gate.verify(1, 1, "mi-clave-nueva").await.unwrap().is_authorized());

    // Changing again requires the current key, not the original default.
    let err = gate
        .change_clave(1, DEFAULT_CLAVE, "otra-clave-mas", "otra-clave-mas")
        .await;
    assert!(matches!(err, Err(GateError::Denied)));

    gate.reset_to_default(1).await.unwrap();
    assert!(gate.verify(1, 1, DEFAULT_CLAVE).await.unwrap().is_authorized());
    assert!(!gate.verify(1, 1, "mi-clave-nueva").await.unwrap().is_authorized());
}

#[tokio::test]
async fn verificar_endpoint_reports_without_mutating() {
    let (app, _state, _dir) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/seguridad/verificar")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(format!(
                    r#"{{"clave_edicion":"{DEFAULT_CLAVE}"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["autorizado"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/seguridad/verificar")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"clave_edicion":"equivocada"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["autorizado"], false);
}

#[tokio::test]
async fn cambiar_clave_endpoint() {
    let (app, state, _dir) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/seguridad/clave")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(format!(
                    r#"{{"clave_actual":"{DEFAULT_CLAVE}","clave_nueva":"clave-fuerte","confirmacion":"clave-fuerte"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.gate().verify(1, 1, "clave-fuerte").await.unwrap().is_authorized());

    // Wrong current key surfaces as 401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/seguridad/clave")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"clave_actual":"equivocada","clave_nueva":"otra-clave","confirmacion":"otra-clave"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_endpoint_restores_default() {
    let (app, state, _dir) = spawn_app().await;

    state
        .gate()
        .change_clave(1, DEFAULT_CLAVE, "clave-olvidada", "clave-olvidada")
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/seguridad/reset")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.gate().verify(1, 1, DEFAULT_CLAVE).await.unwrap().is_authorized());
}
