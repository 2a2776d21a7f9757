pub mod adapters;
pub mod browser;
pub mod cancel;
pub mod formulate;
pub mod harvest;
pub mod merge;
pub mod multiplex;
pub mod pipeline;
pub mod prior_art;
pub mod resolve;
pub mod score;
pub mod search;
pub mod summarize;

mod error;

pub use cancel::CancelToken;
pub use error::{AdapterError, Error, ExtractionError, ResolutionError, Result};
pub use pipeline::{Pipeline, PipelineSettings, RunPolicy};
pub use prior_providers::{
	llm::CompletionRequest,
	webdriver::{ElementId, Locator},
};
pub use search::{PaperResult, PaperSearchRequest, PatentResult, PatentSearchRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use prior_config::{Config, LlmProviderConfig};
use prior_domain::{CandidateRef, ResolvedDocument, SurfaceFamily, SurfaceKind};
use prior_providers::llm;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The text-generation collaborator: one prompt in, free text out.
pub trait TextGenerator
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, prior_providers::Result<String>>;
}

/// One external search surface.
pub trait SearchAdapter
where
	Self: Send + Sync,
{
	fn surface(&self) -> SurfaceKind;

	/// Candidates in the surface's own relevance order. `limit` caps the count when set.
	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: Option<u32>,
		cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>>;
}

/// Fetches a candidate's full record from its authoritative source.
pub trait RecordResolver
where
	Self: Send + Sync,
{
	fn resolve<'a>(
		&'a self,
		candidate: &'a CandidateRef,
	) -> BoxFuture<'a, Result<ResolvedDocument, ResolutionError>>;
}

/// A single-owner browser automation session.
pub trait BrowserSession
where
	Self: Send + Sync,
{
	fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, prior_providers::Result<()>>;

	fn find_all<'a>(
		&'a self,
		locator: &'a Locator,
	) -> BoxFuture<'a, prior_providers::Result<Vec<ElementId>>>;

	fn attribute<'a>(
		&'a self,
		element: &'a ElementId,
		name: &'a str,
	) -> BoxFuture<'a, prior_providers::Result<Option<String>>>;

	fn text<'a>(&'a self, element: &'a ElementId) -> BoxFuture<'a, prior_providers::Result<String>>;

	fn send_keys<'a>(
		&'a self,
		element: &'a ElementId,
		text: &'a str,
		submit: bool,
	) -> BoxFuture<'a, prior_providers::Result<()>>;

	fn scroll_to_bottom(&self) -> BoxFuture<'_, prior_providers::Result<()>>;

	fn close(self: Box<Self>) -> BoxFuture<'static, prior_providers::Result<()>>;
}

pub trait BrowserLauncher
where
	Self: Send + Sync,
{
	fn open(&self) -> BoxFuture<'_, prior_providers::Result<Box<dyn BrowserSession>>>;
}

/// Text-generation handle bound to its provider config.
#[derive(Clone)]
pub struct Llm {
	pub cfg: LlmProviderConfig,
	pub generator: Arc<dyn TextGenerator>,
}
impl Llm {
	pub fn new(cfg: LlmProviderConfig, generator: Arc<dyn TextGenerator>) -> Self {
		Self { cfg, generator }
	}

	pub async fn ask(&self, request: &CompletionRequest) -> prior_providers::Result<String> {
		self.generator.complete(&self.cfg, request).await
	}
}

/// Collaborators for both pipelines. Missing adapters or resolvers disable that family.
#[derive(Clone)]
pub struct Providers {
	pub generator: Arc<dyn TextGenerator>,
	pub academic_adapters: Vec<Arc<dyn SearchAdapter>>,
	pub academic_resolver: Option<Arc<dyn RecordResolver>>,
	pub patent_adapters: Vec<Arc<dyn SearchAdapter>>,
	pub patent_resolver: Option<Arc<dyn RecordResolver>>,
}
impl Providers {
	pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
		Self {
			generator,
			academic_adapters: Vec::new(),
			academic_resolver: None,
			patent_adapters: Vec::new(),
			patent_resolver: None,
		}
	}

	pub fn with_academic(
		mut self,
		adapters: Vec<Arc<dyn SearchAdapter>>,
		resolver: Arc<dyn RecordResolver>,
	) -> Self {
		self.academic_adapters = adapters;
		self.academic_resolver = Some(resolver);

		self
	}

	pub fn with_patent(
		mut self,
		adapters: Vec<Arc<dyn SearchAdapter>>,
		resolver: Arc<dyn RecordResolver>,
	) -> Self {
		self.patent_adapters = adapters;
		self.patent_resolver = Some(resolver);

		self
	}

	/// Live collaborators for every enabled source in `cfg`.
	pub fn from_config(cfg: &Config) -> Self {
		let mut providers = Self::new(Arc::new(DefaultProviders { client: Client::new() }));

		if cfg.sources.academic.enabled {
			providers = providers.with_academic(
				vec![Arc::new(adapters::ArxivAdapter::new(cfg.sources.academic.clone()))],
				Arc::new(resolve::ArxivResolver::new(cfg.sources.academic.clone())),
			);
		}
		if cfg.sources.patent.enabled {
			let launcher: Arc<dyn BrowserLauncher> =
				Arc::new(browser::WebDriverLauncher::new(cfg.browser.clone()));
			let pool = browser::SessionPool::new(launcher, cfg.browser.max_sessions);

			providers = providers.with_patent(
				adapters::scraped_adapters(&cfg.sources.patent, &cfg.browser, &pool),
				Arc::new(resolve::PatentResolver::new(cfg.sources.patent.clone())),
			);
		}

		providers
	}
}

pub struct PriorArtService {
	pub cfg: Config,
	papers: Option<Pipeline>,
	patents: Option<Pipeline>,
}
impl PriorArtService {
	pub fn new(cfg: Config) -> Self {
		let providers = Providers::from_config(&cfg);

		Self::with_providers(cfg, providers)
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let llm = Llm::new(cfg.providers.llm.clone(), providers.generator.clone());
		let settings = PipelineSettings::from_config(&cfg);
		let papers = providers.academic_resolver.map(|resolver| {
			Pipeline::new(
				SurfaceFamily::Academic,
				llm.clone(),
				providers.academic_adapters,
				resolver,
				settings.clone(),
			)
		});
		let patents = providers.patent_resolver.map(|resolver| {
			Pipeline::new(SurfaceFamily::Patent, llm, providers.patent_adapters, resolver, settings)
		});

		Self { cfg, papers, patents }
	}
}

struct DefaultProviders {
	client: Client,
}
impl TextGenerator for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, prior_providers::Result<String>> {
		Box::pin(llm::complete(&self.client, cfg, request))
	}
}
