use std::sync::{Arc, atomic::Ordering};

use prior_config::Config;
use prior_domain::{ResolvedDocument, SurfaceKind};
use prior_service::{
	CancelToken, Error, PaperSearchRequest, PatentSearchRequest, PriorArtService, Providers,
	RecordResolver, SearchAdapter,
};
use prior_testkit::{FailingAdapter, MapResolver, ScriptedGenerator, StaticAdapter, document};

const UNLOCK: &str = "A touchscreen phone that unlocks when the user swipes a slider across the \
	screen.";
const ARXIV_QUERY_NEEDLE: &str = "search for prior art on arXiv";
const SUMMARY_NEEDLE: &str = "Summarize this patent";

fn config() -> Config {
	let mut cfg = prior_testkit::sample_config();

	cfg.pipeline.multiplex.enabled = false;
	cfg.pipeline.prior_art.mode = "off".to_string();
	cfg.pipeline.patents.summarize = false;

	cfg
}

fn patent(id: &str, title: &str) -> ResolvedDocument {
	document(id, SurfaceKind::FreePatentsOnline, title, &format!("Abstract of {title}."))
}

fn patent_service(
	cfg: Config,
	generator: ScriptedGenerator,
	adapters: Vec<Arc<dyn SearchAdapter>>,
	resolver: Arc<dyn RecordResolver>,
) -> PriorArtService {
	PriorArtService::with_providers(cfg, Providers::new(Arc::new(generator)).with_patent(adapters, resolver))
}

fn patent_request(max_results: Option<u32>) -> PatentSearchRequest {
	PatentSearchRequest { description: UNLOCK.to_string(), max_results }
}

#[tokio::test]
async fn papers_come_back_best_first() {
	let generator = ScriptedGenerator::new()
		.respond_when(ARXIV_QUERY_NEEDLE, "ti:unlock AND abs:touchscreen")
		.respond_when(
			"Title: Slide gestures for touchscreen unlock",
			"{\"score\": 0.9, \"reasoning\": \"Same gesture.\"}",
		)
		.respond_when("Title: Lithium battery aging", "0.1");
	let adapter = StaticAdapter::with_ids(SurfaceKind::Arxiv, &["arxiv:2001.00002", "arxiv:2001.00001"]);
	let resolver = MapResolver::new(vec![
		document(
			"arxiv:2001.00001",
			SurfaceKind::Arxiv,
			"Slide gestures for touchscreen unlock",
			"We study slide-to-unlock gestures.",
		),
		document("arxiv:2001.00002", SurfaceKind::Arxiv, "Lithium battery aging", "Cells degrade."),
	]);
	let providers = Providers::new(Arc::new(generator.clone()))
		.with_academic(vec![Arc::new(adapter)], Arc::new(resolver));
	let service = PriorArtService::with_providers(config(), providers);
	let results = service
		.search_papers(
			PaperSearchRequest { description: UNLOCK.to_string(), max_papers: None },
			&CancelToken::new(),
		)
		.await
		.expect("Paper search failed.");
	let titles: Vec<_> = results.iter().map(|paper| paper.title.as_str()).collect();

	assert_eq!(titles, vec!["Slide gestures for touchscreen unlock", "Lithium battery aging"]);
	assert_eq!(results[0].relevance_score, 0.9);
	assert_eq!(results[0].reasoning.as_deref(), Some("Same gesture."));
	assert_eq!(results[0].paper_id, "2001.00001");
	assert_eq!(results[1].relevance_score, 0.1);
	// One formulation call plus one scoring call per paper.
	assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn zero_scored_patents_are_dropped_and_the_rest_ranked() {
	let generator = ScriptedGenerator::new()
		.respond_when("Title: Alpha", "0")
		.respond_when("Title: Bravo", "0.4")
		.respond_when("Title: Charlie", "0")
		.respond_when("Title: Delta", "0.7")
		.respond_when("Title: Echo", "0.2");
	let ids = ["US1000001", "US1000002", "US1000003", "US1000004", "US1000005"];
	let titles = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
	let resolver = MapResolver::new(ids.iter().zip(titles).map(|(id, title)| patent(id, title)).collect());
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &ids);
	let service =
		patent_service(config(), generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let ranked: Vec<_> =
		results.iter().map(|result| (result.title.as_str(), result.relevance_score)).collect();

	assert_eq!(ranked, vec![("Delta", 0.7), ("Bravo", 0.4), ("Echo", 0.2)]);
}

#[tokio::test]
async fn one_failing_surface_does_not_sink_the_run() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let ids = ["US1000001", "US1000002", "US1000003"];
	let resolver = MapResolver::new(ids.iter().map(|id| patent(id, id)).collect());
	let adapters: Vec<Arc<dyn SearchAdapter>> = vec![
		Arc::new(FailingAdapter::new(SurfaceKind::FreePatentsOnline)),
		Arc::new(StaticAdapter::with_ids(SurfaceKind::GooglePatents, &ids)),
	];
	let service = patent_service(config(), generator, adapters, Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");

	assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn every_surface_failing_yields_an_empty_list() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let adapters: Vec<Arc<dyn SearchAdapter>> = vec![
		Arc::new(FailingAdapter::new(SurfaceKind::FreePatentsOnline)),
		Arc::new(FailingAdapter::new(SurfaceKind::GooglePatents)),
	];
	let service =
		patent_service(config(), generator, adapters, Arc::new(MapResolver::new(Vec::new())));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn duplicates_across_surfaces_and_variants_resolve_once() {
	let mut cfg = config();

	cfg.pipeline.multiplex.enabled = true;
	cfg.pipeline.multiplex.count = 2;

	let generator = ScriptedGenerator::new()
		.respond_when("Rephrase their idea", "A phone unlocked by sliding a finger.")
		.otherwise("0.5");
	let fpo = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001", "US1000002"]);
	let google = StaticAdapter::with_ids(SurfaceKind::GooglePatents, &["US1000002", "US1000003"]);
	let fpo_calls = fpo.calls();
	let resolver = MapResolver::new(
		["US1000001", "US1000002", "US1000003"].iter().map(|id| patent(id, id)).collect(),
	);
	let resolver_calls = resolver.calls();
	let service =
		patent_service(cfg, generator, vec![Arc::new(fpo), Arc::new(google)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let mut ids: Vec<_> = results.iter().map(|result| result.id.as_str()).collect();

	ids.sort_unstable();

	assert_eq!(ids, vec!["US1000001", "US1000002", "US1000003"]);
	// The original description plus one distinct rephrasing; the repeat is dropped.
	assert_eq!(fpo_calls.load(Ordering::SeqCst), 2);
	assert_eq!(resolver_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_rephrasings_leave_the_original_query() {
	let mut cfg = config();

	cfg.pipeline.multiplex.enabled = true;
	cfg.pipeline.multiplex.count = 3;

	let generator = ScriptedGenerator::new()
		.fail_when("Rephrase their idea", "Upstream overloaded.")
		.otherwise("0.5");
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001"]);
	let calls = adapter.calls();
	let resolver = MapResolver::new(vec![patent("US1000001", "Alpha")]);
	let service = patent_service(cfg, generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");

	assert_eq!(results.len(), 1);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_runs_return_the_same_ranking() {
	let generator = ScriptedGenerator::new()
		.respond_when("Title: Alpha", "0.3")
		.respond_when("Title: Bravo", "0.8");
	let resolver =
		MapResolver::new(vec![patent("US1000001", "Alpha"), patent("US1000002", "Bravo")]);
	let adapter =
		StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001", "US1000002"]);
	let service =
		patent_service(config(), generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let first = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("First search failed.");
	let second = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Second search failed.");

	assert_eq!(first, second);
	assert_eq!(first[0].title, "Bravo");
}

#[tokio::test]
async fn equal_scores_keep_discovery_order() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let ids = ["US1000003", "US1000001", "US1000002"];
	let resolver = MapResolver::new(ids.iter().map(|id| patent(id, id)).collect());
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &ids);
	let service =
		patent_service(config(), generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let ranked: Vec<_> = results.iter().map(|result| result.id.as_str()).collect();

	assert_eq!(ranked, ids);
}

#[tokio::test]
async fn caller_cap_truncates_after_ranking() {
	let generator = ScriptedGenerator::new()
		.respond_when("Title: Alpha", "0.2")
		.respond_when("Title: Bravo", "0.9")
		.respond_when("Title: Charlie", "0.6");
	let ids = ["US1000001", "US1000002", "US1000003"];
	let resolver = MapResolver::new(
		ids.iter().zip(["Alpha", "Bravo", "Charlie"]).map(|(id, title)| patent(id, title)).collect(),
	);
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &ids);
	let service =
		patent_service(config(), generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(Some(2)), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let titles: Vec<_> = results.iter().map(|result| result.title.as_str()).collect();

	assert_eq!(titles, vec!["Bravo", "Charlie"]);
}

#[tokio::test]
async fn unusable_score_replies_become_zero_for_papers() {
	let generator = ScriptedGenerator::new()
		.respond_when(ARXIV_QUERY_NEEDLE, "all:unlock")
		.respond_when("Title: Alpha", "This paper is quite relevant.")
		.fail_when("Title: Bravo", "Rate limited.");
	let adapter =
		StaticAdapter::with_ids(SurfaceKind::Arxiv, &["arxiv:2001.00001", "arxiv:2001.00002"]);
	let resolver = MapResolver::new(vec![
		document("arxiv:2001.00001", SurfaceKind::Arxiv, "Alpha", "First."),
		document("arxiv:2001.00002", SurfaceKind::Arxiv, "Bravo", "Second."),
	]);
	let providers = Providers::new(Arc::new(generator))
		.with_academic(vec![Arc::new(adapter)], Arc::new(resolver));
	let service = PriorArtService::with_providers(config(), providers);
	let results = service
		.search_papers(
			PaperSearchRequest { description: UNLOCK.to_string(), max_papers: None },
			&CancelToken::new(),
		)
		.await
		.expect("Paper search failed.");

	assert_eq!(results.len(), 2);
	assert!(results.iter().all(|paper| paper.relevance_score == 0.0));
	assert!(results.iter().all(|paper| paper.reasoning.is_some()));
}

#[tokio::test]
async fn failed_academic_formulation_fails_the_run() {
	let generator = ScriptedGenerator::new().fail_when(ARXIV_QUERY_NEEDLE, "Upstream down.");
	let adapter = StaticAdapter::with_ids(SurfaceKind::Arxiv, &["arxiv:2001.00001"]);
	let calls = adapter.calls();
	let providers = Providers::new(Arc::new(generator))
		.with_academic(vec![Arc::new(adapter)], Arc::new(MapResolver::new(Vec::new())));
	let service = PriorArtService::with_providers(config(), providers);
	let outcome = service
		.search_papers(
			PaperSearchRequest { description: UNLOCK.to_string(), max_papers: None },
			&CancelToken::new(),
		)
		.await;

	assert!(matches!(outcome, Err(Error::QueryFormulation { .. })), "Unexpected outcome: {outcome:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolvable_candidates_are_dropped() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let resolver = MapResolver::new(vec![patent("US1000001", "Alpha"), patent("US1000002", "Bravo")])
		.with_untitled("US1000002");
	let adapter = StaticAdapter::with_ids(
		SurfaceKind::FreePatentsOnline,
		&["US1000001", "US1000002", "US1000009"],
	);
	let service =
		patent_service(config(), generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let ids: Vec<_> = results.iter().map(|result| result.id.as_str()).collect();

	assert_eq!(ids, vec!["US1000001"]);
}

#[tokio::test]
async fn prior_art_gate_drops_explicit_rejections_only() {
	let mut cfg = config();

	cfg.pipeline.prior_art.mode = "llm".to_string();

	let generator = ScriptedGenerator::new()
		.respond_when("DOCUMENT: Alpha", "true")
		.respond_when("DOCUMENT: Bravo", "false")
		.fail_when("DOCUMENT: Charlie", "Timed out.")
		.otherwise("0.5");
	let ids = ["US1000001", "US1000002", "US1000003"];
	let resolver = MapResolver::new(
		ids.iter().zip(["Alpha", "Bravo", "Charlie"]).map(|(id, title)| patent(id, title)).collect(),
	);
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &ids);
	let service = patent_service(cfg, generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");
	let titles: Vec<_> = results.iter().map(|result| result.title.as_str()).collect();

	assert_eq!(titles, vec!["Alpha", "Charlie"]);
}

#[tokio::test]
async fn summaries_replace_abstracts_when_enabled() {
	let mut cfg = config();

	cfg.pipeline.patents.summarize = true;

	let generator = ScriptedGenerator::new()
		.respond_when(SUMMARY_NEEDLE, "A slider unlocks the phone.")
		.otherwise("0.5");
	let resolver = MapResolver::new(vec![patent("US1000001", "Alpha")]);
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001"]);
	let service = patent_service(cfg, generator, vec![Arc::new(adapter)], Arc::new(resolver));
	let results = service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");

	assert_eq!(results[0].summary, "A slider unlocks the phone.");
}

#[tokio::test]
async fn scoring_attaches_the_full_document_when_configured() {
	let mut cfg = config();

	cfg.pipeline.scoring.attach_documents = true;

	let generator = ScriptedGenerator::new().otherwise("0.5");
	let mut record = patent("US1000001", "Alpha");

	record.document_url = Some("https://records.example/US1000001.pdf".to_string());

	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001"]);
	let service = patent_service(
		cfg,
		generator.clone(),
		vec![Arc::new(adapter)],
		Arc::new(MapResolver::new(vec![record])),
	);

	service
		.search_patents(patent_request(None), &CancelToken::new())
		.await
		.expect("Patent search failed.");

	let attachments: Vec<_> =
		generator.requests().into_iter().filter_map(|request| request.attachment_url).collect();

	assert_eq!(attachments, vec!["https://records.example/US1000001.pdf".to_string()]);
}

#[tokio::test]
async fn cancelled_runs_report_cancellation() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let adapter = StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001"]);
	let service = patent_service(
		config(),
		generator,
		vec![Arc::new(adapter)],
		Arc::new(MapResolver::new(vec![patent("US1000001", "Alpha")])),
	);
	let cancel = CancelToken::new();

	cancel.cancel();

	let outcome = service.search_patents(patent_request(None), &cancel).await;

	assert!(matches!(outcome, Err(Error::Cancelled)), "Unexpected outcome: {outcome:?}");
}

#[tokio::test]
async fn disabled_families_are_reported() {
	let service = PriorArtService::with_providers(
		config(),
		Providers::new(Arc::new(ScriptedGenerator::new())),
	);
	let outcome = service.search_patents(patent_request(None), &CancelToken::new()).await;

	assert!(matches!(outcome, Err(Error::SourceDisabled { family: "patent" })));
}

#[tokio::test]
async fn blank_descriptions_are_rejected() {
	let generator = ScriptedGenerator::new().otherwise("0.5");
	let service = patent_service(
		config(),
		generator,
		vec![Arc::new(StaticAdapter::with_ids(SurfaceKind::FreePatentsOnline, &["US1000001"]))],
		Arc::new(MapResolver::new(Vec::new())),
	);
	let outcome = service
		.search_patents(
			PatentSearchRequest { description: "   ".to_string(), max_results: None },
			&CancelToken::new(),
		)
		.await;

	assert!(matches!(outcome, Err(Error::InvalidRequest { .. })));
}
