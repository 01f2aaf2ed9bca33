use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use super::render;
use super::state::ServeState;
use crate::errors::AppError;
use crate::input::{self, SubmitPayload};

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/submit", post(submit_form_handler))
        .route("/api/submit", post(submit_json_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn index_handler(State(state): State<ServeState>) -> impl IntoResponse {
    render::entry_form(state.has_credentials())
}

async fn health_handler(State(state): State<ServeState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "credentials_configured": state.has_credentials(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn submit_form_handler(
    State(state): State<ServeState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let outcome = async {
        state.credential()?;
        let Form(pairs) = form.map_err(|err| AppError::InvalidInput(err.body_text()))?;
        let request = input::from_form(pairs)?;
        state.submit(request).await
    }
    .await;

    match outcome {
        Ok(result) => render::html_result(&result),
        Err(err) => {
            warn!(error = %err, "form submission rejected");
            render::html_error(&err)
        }
    }
}

async fn submit_json_handler(
    State(state): State<ServeState>,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Response {
    let outcome = async {
        state.credential()?;
        let Json(payload) = payload.map_err(|err| AppError::InvalidInput(err.body_text()))?;
        let request = payload.into_request()?;
        state.submit(request).await
    }
    .await;

    match outcome {
        Ok(result) => render::json_result(&result),
        Err(err) => {
            warn!(error = %err, "api submission rejected");
            render::json_error(&err)
        }
    }
}
