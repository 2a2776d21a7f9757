use std::{sync::Arc, time::Duration};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use prior_api::{routes, state::AppState};
use prior_config::Config;
use prior_domain::{CandidateRef, SurfaceKind};
use prior_service::{
	AdapterError, BoxFuture, CancelToken, PriorArtService, Providers, SearchAdapter,
};
use prior_testkit::{MapResolver, ScriptedGenerator, StaticAdapter, document};

const UNLOCK: &str = "A phone that unlocks when a slider is swiped across its touchscreen.";

/// Blocks until the run is cancelled.
struct StalledAdapter;

impl SearchAdapter for StalledAdapter {
	fn surface(&self) -> SurfaceKind {
		SurfaceKind::FreePatentsOnline
	}

	fn search<'a>(
		&'a self,
		_query: &'a str,
		_limit: Option<u32>,
		cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>> {
		Box::pin(async move {
			let _ = cancel.run(tokio::time::sleep(Duration::from_secs(30))).await;

			Err(AdapterError::Cancelled { surface: SurfaceKind::FreePatentsOnline })
		})
	}
}

fn config() -> Config {
	let mut cfg = prior_testkit::sample_config();

	cfg.pipeline.patents.summarize = false;

	cfg
}

fn app(cfg: Config, providers: Providers) -> Router {
	routes::router(AppState::with_service(PriorArtService::with_providers(cfg, providers)))
}

fn full_app() -> Router {
	let generator = ScriptedGenerator::new()
		.respond_when("search for prior art on arXiv", "ti:unlock AND abs:slider")
		.respond_when("Title: Slide to unlock", "{\"score\": 0.8, \"reasoning\": \"Same idea.\"}")
		.respond_when("Title: Unrelated", "0");
	let papers = MapResolver::new(vec![document(
		"arxiv:2001.00001",
		SurfaceKind::Arxiv,
		"Slide to unlock",
		"A slider gesture.",
	)]);
	let patents = MapResolver::new(vec![
		document("US7657849", SurfaceKind::FreePatentsOnline, "Slide to unlock", "Unlocking."),
		document("US1000001", SurfaceKind::FreePatentsOnline, "Unrelated", "Batteries."),
	]);
	let providers = Providers::new(Arc::new(generator))
		.with_academic(
			vec![Arc::new(StaticAdapter::with_ids(SurfaceKind::Arxiv, &["arxiv:2001.00001"]))],
			Arc::new(papers),
		)
		.with_patent(
			vec![Arc::new(StaticAdapter::with_ids(
				SurfaceKind::FreePatentsOnline,
				&["US1000001", "US7657849"],
			))],
			Arc::new(patents),
		);

	app(config(), providers)
}

async fn post(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri(uri)
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call the router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let response = full_app()
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_scored_papers() {
	let (status, json) =
		post(full_app(), "/search", serde_json::json!({ "description": UNLOCK, "max_papers": 5 }))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json[0]["title"], "Slide to unlock");
	assert_eq!(json[0]["paper_id"], "2001.00001");
	assert_eq!(json[0]["relevance_score"], 0.8);
	assert_eq!(json[0]["reasoning"], "Same idea.");
}

#[tokio::test]
async fn search_patents_returns_positive_results_only() {
	let (status, json) =
		post(full_app(), "/search_patents", serde_json::json!({ "description": UNLOCK })).await;
	let results = json.as_array().expect("Expected a JSON array.");

	assert_eq!(status, StatusCode::OK);
	assert_eq!(results.len(), 1);
	assert_eq!(results[0]["id"], "US7657849");
	assert_eq!(results[0].as_object().map(|obj| obj.len()), Some(4));
}

#[tokio::test]
async fn blank_description_is_a_bad_request() {
	let (status, json) =
		post(full_app(), "/search_patents", serde_json::json!({ "description": "  " })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn zero_cap_is_a_bad_request() {
	let (status, json) =
		post(full_app(), "/search", serde_json::json!({ "description": UNLOCK, "max_papers": 0 }))
			.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn disabled_source_is_unavailable() {
	let app = app(config(), Providers::new(Arc::new(ScriptedGenerator::new())));
	let (status, json) =
		post(app, "/search_patents", serde_json::json!({ "description": UNLOCK })).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "SOURCE_DISABLED");
}

#[tokio::test]
async fn formulation_failure_is_a_bad_gateway() {
	let generator = ScriptedGenerator::new().fail_when("search for prior art on arXiv", "Down.");
	let providers = Providers::new(Arc::new(generator)).with_academic(
		vec![Arc::new(StaticAdapter::with_ids(SurfaceKind::Arxiv, &["arxiv:2001.00001"]))],
		Arc::new(MapResolver::new(Vec::new())),
	);
	let (status, json) =
		post(app(config(), providers), "/search", serde_json::json!({ "description": UNLOCK }))
			.await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "QUERY_FORMULATION_FAILED");
}

#[tokio::test]
async fn slow_runs_hit_the_request_deadline() {
	let mut cfg = config();

	cfg.service.request_timeout_ms = 20;

	let providers = Providers::new(Arc::new(ScriptedGenerator::new().otherwise("0.5")))
		.with_patent(vec![Arc::new(StalledAdapter)], Arc::new(MapResolver::new(Vec::new())));
	let (status, json) =
		post(app(cfg, providers), "/search_patents", serde_json::json!({ "description": UNLOCK }))
			.await;

	assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
	assert_eq!(json["error_code"], "DEADLINE_EXCEEDED");
}
