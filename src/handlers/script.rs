use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::AppState;
use crate::models::{ScriptRequest, ScriptResponse};
use crate::utils::ApiError;

/// Execute an arbitrary statement against the monitored database
///
/// Statements starting with SELECT return their rows; anything else is
/// committed and reports the affected row count. The statement is not
/// validated, so this route must sit behind access control.
#[utoipa::path(
    post,
    path = "/api/execute-script",
    request_body = ScriptRequest,
    responses(
        (status = 200, description = "Statement executed", body = ScriptResponse),
        (status = 400, description = "Body is not a JSON object with a `script` string"),
        (status = 500, description = "Connection or execution failure", body = ScriptResponse)
    ),
    tag = "Scripts"
)]
pub async fn execute_script(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScriptRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Rejected script request: {}", rejection.body_text());
            return ApiError::validation_error(format!("Invalid request: {}", rejection.body_text()))
                .into_response();
        },
    };

    let result = state.script_executor.execute(&request.script).await;

    let status =
        if result.is_success() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    (status, Json(ScriptResponse::from(result))).into_response()
}
