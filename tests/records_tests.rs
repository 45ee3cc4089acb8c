use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use galponero::api::AppState;
use galponero::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "galponero_default_api_key_please_regenerate";
const DEFAULT_CLAVE: &str = "gallos2024";
const BOUNDARY: &str = "------------------------galponero-test";

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

/// Builds a multipart/form-data body by hand: text parts first, file parts
/// (sent as image/png) after.
fn multipart_body(texts: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, api_key: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn gallo_crud_roundtrip() {
    let (app, _state, _dir) = spawn_app().await;

    // Only the name is required
    let body = multipart_body(&[("nombre", "Colorado"), ("placa_gallo", "A-17")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["nombre"], "Colorado");
    assert_eq!(created["data"]["placa_gallo"], "A-17");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/gallos")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    // Edit requires the clave; blank fields keep stored values
    let body = multipart_body(
        &[("color_general", "giro"), ("clave_edicion", DEFAULT_CLAVE)],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/gallos/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_body(response).await;
    assert_eq!(updated["data"]["color_general"], "giro");
    assert_eq!(updated["data"]["nombre"], "Colorado");

    // Delete with the clave in a JSON body
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/gallos/{id}"))
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

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/gallos/{id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gallo_creation_requires_a_name() {
    let (app, _state, _dir) = spawn_app().await;

    let body = multipart_body(&[("color_general", "giro")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_tipo_brida_is_rejected() {
    let (app, _state, _dir) = spawn_app().await;

    let body = multipart_body(&[("nombre", "Moro"), ("tipo_brida", "anillo")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = multipart_body(&[("nombre", "Moro"), ("tipo_brida", "tairra")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn mutations_without_the_clave_are_rejected() {
    let (app, _state, _dir) = spawn_app().await;

    let body = multipart_body(&[("nombre", "Canelo")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // No clave at all
    let body = multipart_body(&[("nombre", "Otro")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/gallos/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong clave on delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/gallos/{id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"clave_edicion":"equivocada"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Record is untouched
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/gallos/{id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let fetched = json_body(response).await;
    assert_eq!(fetched["data"]["nombre"], "Canelo");
}

#[tokio::test]
async fn records_are_scoped_to_their_owner() {
    let (app, state, _dir) = spawn_app().await;

    let body = multipart_body(&[("nombre", "Privado")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let config = state.config().await;
    let other = state
        .store()
        .create_user("vecino", "segura12345", &config.security)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/gallos/{id}"))
                .header("X-Api-Key", &other.api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/gallos")
                .header("X-Api-Key", &other.api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn photo_upload_replace_and_delete() {
    let (app, _state, dir) = spawn_app().await;

    let body = multipart_body(
        &[("nombre", "Pinto")],
        &[("foto_gallo", "pinto.png", b"fake png bytes")],
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let url = created["data"]["foto_gallo"].as_str().unwrap().to_string();
    assert!(url.starts_with("/images/1/"));

    let on_disk = |url: &str| {
        dir.path()
            .join("images")
            .join(url.trim_start_matches("/images/"))
    };
    assert!(on_disk(&url).exists());

    // A text-only edit keeps the photo
    let body = multipart_body(
        &[("descripcion", "buen padre"), ("clave_edicion", DEFAULT_CLAVE)],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/gallos/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    let updated = json_body(response).await;
    assert_eq!(updated["data"]["foto_gallo"], url.as_str());

    // A new photo replaces the slot and the old blob is removed
    let body = multipart_body(
        &[("clave_edicion", DEFAULT_CLAVE)],
        &[("foto_gallo", "pinto2.png", b"newer png bytes")],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/gallos/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    let updated = json_body(response).await;
    let new_url = updated["data"]["foto_gallo"].as_str().unwrap().to_string();
    assert_ne!(new_url, url);
    assert!(on_disk(&new_url).exists());
    assert!(!on_disk(&url).exists());

    // Deleting the record removes its blobs
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/gallos/{id}"))
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
    assert!(!on_disk(&new_url).exists());
}

#[tokio::test]
async fn encaste_lifecycle_and_estado() {
    let (app, _state, _dir) = spawn_app().await;

    // Mating date and both plates are required
    let body = multipart_body(&[("placa_padrote", "P-1")], &[]);
    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/encastes",
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = multipart_body(
        &[
            ("fecha_encaste", "2026-03-01"),
            ("placa_padrote", "P-1"),
            ("placa_gallina", "G-2"),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/encastes",
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["estado"], "pendiente");
    assert_eq!(created["data"]["total_huevos"], 0);

    // Starting incubation moves the estado along
    let body = multipart_body(
        &[
            ("fecha_inicio_incubacion", "2026-03-10"),
            ("total_huevos", "8"),
            ("clave_edicion", DEFAULT_CLAVE),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/encastes/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    let updated = json_body(response).await;
    assert_eq!(updated["data"]["estado"], "incubando");
    assert_eq!(updated["data"]["total_huevos"], 8);

    // Hatched chicks complete it
    let body = multipart_body(
        &[
            ("cantidad_pollos_nacidos", "5"),
            ("fecha_nacimiento", "2026-03-31"),
            ("clave_edicion", DEFAULT_CLAVE),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/encastes/{id}"),
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    let updated = json_body(response).await;
    assert_eq!(updated["data"]["estado"], "completado");
}

#[tokio::test]
async fn negative_counts_are_rejected() {
    let (app, _state, _dir) = spawn_app().await;

    let body = multipart_body(
        &[
            ("fecha_encaste", "2026-03-01"),
            ("placa_padrote", "P-1"),
            ("placa_gallina", "G-2"),
            ("total_huevos", "-3"),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/encastes",
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_aggregates() {
    let (app, _state, _dir) = spawn_app().await;

    let body = multipart_body(&[("nombre", "Colorado")], &[]);
    app.clone()
        .oneshot(multipart_request("POST", "/api/gallos", DEFAULT_API_KEY, body))
        .await
        .unwrap();

    let body = multipart_body(
        &[
            ("fecha_encaste", "2026-03-01"),
            ("placa_padrote", "P-1"),
            ("placa_gallina", "G-2"),
            ("total_huevos", "8"),
            ("cantidad_pollos_nacidos", "5"),
        ],
        &[],
    );
    app.clone()
        .oneshot(multipart_request(
            "POST",
            "/api/encastes",
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();

    let body = multipart_body(
        &[
            ("fecha_encaste", "2026-04-01"),
            ("placa_padrote", "P-3"),
            ("placa_gallina", "G-4"),
            ("total_huevos", "6"),
        ],
        &[],
    );
    app.clone()
        .oneshot(multipart_request(
            "POST",
            "/api/encastes",
            DEFAULT_API_KEY,
            body,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = json_body(response).await;
    assert_eq!(dashboard["data"]["total_gallos"], 1);
    assert_eq!(dashboard["data"]["total_encastes"], 2);
    assert_eq!(dashboard["data"]["total_huevos"], 14);
    assert_eq!(dashboard["data"]["total_pollos"], 5);
    assert_eq!(dashboard["data"]["encastes_activos"], 2);
    assert_eq!(dashboard["data"]["encastes_completados"], 1);
    assert_eq!(dashboard["data"]["tasa_exito"], "50%");
    // Everything was created just now, inside the current trend window
    assert_eq!(dashboard["data"]["tendencia_gallos"], "+100%");
    assert_eq!(dashboard["data"]["tendencia_encastes"], "+100%");
}
