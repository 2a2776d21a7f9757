//! Deterministic collaborators for pipeline, service, and API tests. Nothing here touches the
//! network.

pub mod browser;

pub use browser::{BrowserStats, FakeBrowser, FakeFeed, FakeLauncher, FakeNode};

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use prior_config::{Config, LlmProviderConfig};
use prior_domain::{CandidateRef, ResolvedDocument, SurfaceKind};
use prior_service::{
	AdapterError, BoxFuture, CancelToken, CompletionRequest, RecordResolver, ResolutionError,
	SearchAdapter, TextGenerator,
};

const SAMPLE_CONFIG: &str = include_str!("../../../prior.example.toml");

/// The shipped example configuration, parsed without validation side effects.
pub fn sample_config() -> Config {
	match toml::from_str(SAMPLE_CONFIG) {
		Ok(cfg) => cfg,
		Err(err) => panic!("prior.example.toml must parse: {err}"),
	}
}

/// A resolved document with only the fields tests usually care about.
pub fn document(
	canonical_id: &str,
	surface: SurfaceKind,
	title: &str,
	summary: &str,
) -> ResolvedDocument {
	ResolvedDocument {
		canonical_id: canonical_id.to_string(),
		source_surface: surface,
		title: title.to_string(),
		authors: Vec::new(),
		summary: summary.to_string(),
		claims: String::new(),
		published_date: None,
		source_url: format!("https://records.example/{canonical_id}"),
		document_url: None,
		doi: None,
	}
}

#[derive(Clone)]
enum Reply {
	Text(String),
	Fail(String),
}

/// Answers each request with the first rule whose needle occurs in the system or user prompt.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
	rules: Vec<(String, Reply)>,
	fallback: Option<Reply>,
	calls: Arc<AtomicUsize>,
	requests: Arc<Mutex<Vec<CompletionRequest>>>,
}
impl ScriptedGenerator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn respond_when(mut self, needle: &str, reply: &str) -> Self {
		self.rules.push((needle.to_string(), Reply::Text(reply.to_string())));

		self
	}

	pub fn fail_when(mut self, needle: &str, message: &str) -> Self {
		self.rules.push((needle.to_string(), Reply::Fail(message.to_string())));

		self
	}

	pub fn otherwise(mut self, reply: &str) -> Self {
		self.fallback = Some(Reply::Text(reply.to_string()));

		self
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<CompletionRequest> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn reply_for(&self, request: &CompletionRequest) -> Option<Reply> {
		let system = request.system.as_deref().unwrap_or_default();

		self.rules
			.iter()
			.find(|(needle, _)| request.prompt.contains(needle) || system.contains(needle))
			.map(|(_, reply)| reply.clone())
			.or_else(|| self.fallback.clone())
	}
}

impl TextGenerator for ScriptedGenerator {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, prior_providers::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

		let reply = self.reply_for(request);

		Box::pin(async move {
			match reply {
				Some(Reply::Text(text)) => Ok(text),
				Some(Reply::Fail(message)) => Err(prior_providers::Error::InvalidResponse { message }),
				None => Err(prior_providers::Error::InvalidResponse {
					message: "No scripted reply matches this request.".to_string(),
				}),
			}
		})
	}
}

/// Returns a fixed candidate list, honoring the caller's limit.
pub struct StaticAdapter {
	surface: SurfaceKind,
	candidates: Vec<CandidateRef>,
	calls: Arc<AtomicUsize>,
}
impl StaticAdapter {
	pub fn new(surface: SurfaceKind, candidates: Vec<CandidateRef>) -> Self {
		Self { surface, candidates, calls: Arc::new(AtomicUsize::new(0)) }
	}

	/// Candidates whose raw locator is the canonical id.
	pub fn with_ids(surface: SurfaceKind, ids: &[&str]) -> Self {
		Self::new(surface, ids.iter().map(|id| CandidateRef::new(*id, surface, *id)).collect())
	}

	pub fn calls(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}

impl SearchAdapter for StaticAdapter {
	fn surface(&self) -> SurfaceKind {
		self.surface
	}

	fn search<'a>(
		&'a self,
		_query: &'a str,
		limit: Option<u32>,
		_cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let take = limit.map_or(self.candidates.len(), |limit| limit as usize);
		let candidates = self.candidates.iter().take(take).cloned().collect();

		Box::pin(async move { Ok(candidates) })
	}
}

/// Always reports its surface as unavailable.
pub struct FailingAdapter {
	surface: SurfaceKind,
}
impl FailingAdapter {
	pub fn new(surface: SurfaceKind) -> Self {
		Self { surface }
	}
}

impl SearchAdapter for FailingAdapter {
	fn surface(&self) -> SurfaceKind {
		self.surface
	}

	fn search<'a>(
		&'a self,
		_query: &'a str,
		_limit: Option<u32>,
		_cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>> {
		let surface = self.surface;

		Box::pin(async move {
			Err(AdapterError::Unavailable { surface, message: "Search box never appeared.".to_string() })
		})
	}
}

/// Resolves from an in-memory record table. Unknown ids are not found.
#[derive(Default)]
pub struct MapResolver {
	documents: HashMap<String, ResolvedDocument>,
	untitled: Vec<String>,
	calls: Arc<AtomicUsize>,
}
impl MapResolver {
	pub fn new(documents: Vec<ResolvedDocument>) -> Self {
		Self {
			documents: documents
				.into_iter()
				.map(|document| (document.canonical_id.clone(), document))
				.collect(),
			..Default::default()
		}
	}

	/// Marks `canonical_id` as a record whose title is missing.
	pub fn with_untitled(mut self, canonical_id: &str) -> Self {
		self.untitled.push(canonical_id.to_string());

		self
	}

	pub fn calls(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}

impl RecordResolver for MapResolver {
	fn resolve<'a>(
		&'a self,
		candidate: &'a CandidateRef,
	) -> BoxFuture<'a, Result<ResolvedDocument, ResolutionError>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let canonical_id = candidate.canonical_id.clone();
		let outcome = if self.untitled.contains(&canonical_id) {
			Err(ResolutionError::MissingTitle { canonical_id })
		} else {
			self.documents
				.get(&canonical_id)
				.cloned()
				.ok_or(ResolutionError::NotFound { canonical_id })
		};

		Box::pin(async move { outcome })
	}
}
