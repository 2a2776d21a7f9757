use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use prior_service::{
	Error as ServiceError, PaperResult, PaperSearchRequest, PatentResult, PatentSearchRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/search", post(search))
		.route("/search_patents", post(search_patents))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<PaperSearchRequest>,
) -> Result<Json<Vec<PaperResult>>, ApiError> {
	let deadline = state.deadline();
	let results = state.service.search_papers(payload, &deadline.cancel).await?;

	Ok(Json(results))
}

async fn search_patents(
	State(state): State<AppState>,
	Json(payload): Json<PatentSearchRequest>,
) -> Result<Json<Vec<PatentResult>>, ApiError> {
	let deadline = state.deadline();
	let results = state.service.search_patents(payload, &deadline.cancel).await?;

	Ok(Json(results))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } => {
				ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None)
			},
			ServiceError::SourceDisabled { .. } => {
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "SOURCE_DISABLED", message, None)
			},
			ServiceError::QueryFormulation { .. } => {
				tracing::error!(error = %message, "Query formulation failed.");

				ApiError::new(StatusCode::BAD_GATEWAY, "QUERY_FORMULATION_FAILED", message, None)
			},
			ServiceError::Cancelled => {
				ApiError::new(StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", message, None)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
