//! Response bodies for the HTML and JSON surfaces.

use action_flow::{Subject, WorkflowResult};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use serde_json::{json, Value};

use crate::errors::{status_for_kind, AppError};
use crate::input::COMMENT_FIELD;

pub const SUCCESS_HEADLINE: &str = "学習記録の自動入力が完了しました！";
pub const ERROR_PREFIX: &str = "エラーが発生しました: ";

pub fn html_result(result: &WorkflowResult) -> Response {
    match result.confirmation_image() {
        Some(png) => Html(format!(
            "<h1>{SUCCESS_HEADLINE}</h1><img src=\"data:image/png;base64,{}\" alt=\"screenshot\" />",
            Base64.encode(png)
        ))
        .into_response(),
        None => {
            let status = result
                .error_kind()
                .map(status_for_kind)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut body = format!(
                "{ERROR_PREFIX}{}\n",
                result.error_message().unwrap_or("unknown failure")
            );
            for marker in result.log.markers() {
                body.push('\n');
                body.push_str(&marker.to_string());
            }
            (status, body).into_response()
        }
    }
}

pub fn html_error(err: &AppError) -> Response {
    (err.status(), format!("{ERROR_PREFIX}{err}")).into_response()
}

pub fn json_result(result: &WorkflowResult) -> Response {
    let log = log_value(result);
    match result.confirmation_image() {
        Some(png) => Json(json!({
            "success": true,
            "run_id": result.run_id,
            "message": SUCCESS_HEADLINE,
            "screenshot": Base64.encode(png),
            "log": log,
        }))
        .into_response(),
        None => {
            let status = result
                .error_kind()
                .map(status_for_kind)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = json!({
                "success": false,
                "run_id": result.run_id,
                "error": result.error_kind(),
                "message": result.error_message(),
                "log": log,
                "diagnostic_screenshot": result.diagnostic_image().map(|png| Base64.encode(png)),
            });
            (status, Json(body)).into_response()
        }
    }
}

pub fn json_error(err: &AppError) -> Response {
    let body = json!({
        "success": false,
        "error": { "kind": err.code() },
        "message": err.to_string(),
        "log": [],
        "diagnostic_screenshot": null,
    });
    (err.status(), Json(body)).into_response()
}

fn log_value(result: &WorkflowResult) -> Value {
    serde_json::to_value(&result.log).unwrap_or(Value::Null)
}

/// Entry form served at `/`.
pub fn entry_form(credentials_configured: bool) -> Html<String> {
    let mut rows = String::new();
    for subject in Subject::ALL {
        let label = subject.label();
        rows.push_str(&format!(
            "<label>{label} <select name=\"{label}\"><option value=\"\">--</option>"
        ));
        for hours in 0..=7 {
            rows.push_str(&format!("<option value=\"{hours}\">{hours:02}</option>"));
        }
        rows.push_str("</select></label><br />\n");
    }

    let notice = if credentials_configured {
        ""
    } else {
        "<p><strong>STUDYLOG_USERNAME / STUDYLOG_PASSWORD が未設定です</strong></p>"
    };

    Html(format!(
        "<!doctype html>\n<html lang=\"ja\"><head><meta charset=\"utf-8\" /><title>学習記録</title></head>\
<body><h1>学習記録の自動入力</h1>{notice}\
<form method=\"post\" action=\"/submit\">\n{rows}\
<label>コメント<br /><textarea name=\"{COMMENT_FIELD}\" rows=\"3\" cols=\"40\"></textarea></label><br />\
<button type=\"submit\">送信</button></form></body></html>"
    ))
}
