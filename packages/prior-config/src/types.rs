use serde::Deserialize;
use serde_json::{Map, Value};

pub const PATENT_SURFACES: [&str; 3] = ["fpo", "google", "web"];
pub const RECORD_SOURCES: [&str; 2] = ["fpo", "google"];
pub const PRIOR_ART_MODES: [&str; 2] = ["off", "llm"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub sources: Sources,
	pub browser: Browser,
	pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_output_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
	pub academic: AcademicSource,
	pub patent: PatentSource,
}

/// arXiv-compatible Atom query API.
#[derive(Debug, Clone, Deserialize)]
pub struct AcademicSource {
	pub enabled: bool,
	pub api_base: String,
	pub path: String,
	pub page_size: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatentSource {
	pub enabled: bool,
	/// Scraped search surfaces, any of "fpo", "google", "web".
	pub surfaces: Vec<String>,
	/// Authoritative record page used for resolution, "fpo" or "google".
	pub record_source: String,
	pub fpo_base: String,
	pub google_base: String,
	pub web_search_base: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Browser {
	pub webdriver_url: String,
	pub headless: bool,
	pub max_sessions: u32,
	pub ready_timeout_ms: u64,
	pub poll_interval_ms: u64,
	pub scroll_settle_ms: u64,
	pub max_iterations: u32,
	/// Per-harvest cap on processed result nodes. Zero disables the cap.
	pub max_elements: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
	pub query: QueryFormulation,
	pub multiplex: Multiplex,
	pub concurrency: Concurrency,
	pub prior_art: PriorArt,
	#[serde(default)]
	pub scoring: Scoring,
	pub papers: RunPolicy,
	pub patents: RunPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryFormulation {
	pub compress_word_threshold: u32,
	pub compress_target_words: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Multiplex {
	pub enabled: bool,
	pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Concurrency {
	pub search_workers: u32,
	pub resolve_workers: u32,
	pub score_workers: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorArt {
	pub mode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scoring {
	/// Forward the document's hosted file (e.g. a PDF) alongside the scoring prompt.
	#[serde(default)]
	pub attach_documents: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunPolicy {
	pub positive_scores_only: bool,
	pub summarize: bool,
	pub default_max_results: Option<u32>,
}

fn default_request_timeout_ms() -> u64 {
	120_000
}

fn default_max_retries() -> u32 {
	2
}

fn default_retry_backoff_ms() -> u64 {
	500
}
