//! Browser-driven patent surfaces.
//!
//! Each surface only knows its markup: where the query box is, what marks the first result, and
//! how one result node carries a patent number. Driving the session is the harvester's job.

use std::sync::Arc;

use tracing::warn;

use prior_config::Browser;
use prior_domain::{CandidateRef, SurfaceKind, canonical_patent_id};

use crate::{
	AdapterError, BoxFuture, BrowserSession, CancelToken, ElementId, ExtractionError, Locator,
	SearchAdapter,
	browser::SessionPool,
	harvest::{self, HarvestEnd, HarvestLimits, HarvestRecipe, ScrapedSurface},
};

pub struct ScrapedAdapter {
	surface: Arc<dyn ScrapedSurface>,
	pool: SessionPool,
	limits: HarvestLimits,
}
impl ScrapedAdapter {
	pub fn new(surface: Arc<dyn ScrapedSurface>, pool: SessionPool, browser: &Browser) -> Self {
		Self { surface, pool, limits: HarvestLimits::from_config(browser) }
	}

	pub fn with_limits(surface: Arc<dyn ScrapedSurface>, pool: SessionPool, limits: HarvestLimits) -> Self {
		Self { surface, pool, limits }
	}

	async fn run(
		&self,
		query: &str,
		limit: Option<u32>,
		cancel: &CancelToken,
	) -> Result<Vec<CandidateRef>, AdapterError> {
		let surface = self.surface.kind();
		let pooled = match cancel.run(self.pool.acquire()).await {
			Ok(Ok(pooled)) => pooled,
			Ok(Err(err)) => {
				return Err(AdapterError::Unavailable { surface, message: err.to_string() });
			},
			Err(_) => return Err(AdapterError::Cancelled { surface }),
		};
		let Some(session) = pooled.session() else {
			return Err(AdapterError::Unavailable {
				surface,
				message: "Browser session was already released.".to_string(),
			});
		};
		let limits = self.limits.capped_to(limit);
		let outcome = harvest::harvest(session, self.surface.as_ref(), query, &limits, cancel).await;

		pooled.release().await;

		match outcome.end {
			HarvestEnd::Cancelled => Err(AdapterError::Cancelled { surface }),
			HarvestEnd::Aborted { reason } if outcome.candidates.is_empty() => {
				Err(AdapterError::Unavailable { surface, message: reason })
			},
			HarvestEnd::Aborted { reason } => {
				warn!(
					surface = %surface,
					kept = outcome.candidates.len(),
					reason = %reason,
					"Harvest aborted; keeping partial results."
				);

				Ok(outcome.candidates)
			},
			HarvestEnd::Done | HarvestEnd::Capped => Ok(outcome.candidates),
		}
	}
}

impl SearchAdapter for ScrapedAdapter {
	fn surface(&self) -> SurfaceKind {
		self.surface.kind()
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: Option<u32>,
		cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>> {
		Box::pin(self.run(query, limit, cancel))
	}
}

/// FreePatentsOnline full-text search. Result rows list bare US numbers.
pub struct FpoSurface {
	base: String,
}
impl FpoSurface {
	pub fn new(base: &str) -> Self {
		Self { base: base.to_string() }
	}
}

impl ScrapedSurface for FpoSurface {
	fn kind(&self) -> SurfaceKind {
		SurfaceKind::FreePatentsOnline
	}

	fn recipe(&self, query: &str) -> HarvestRecipe {
		HarvestRecipe {
			start_url: format!("{}/", self.base),
			search_input: Locator::Name("query_txt".to_string()),
			query_text: query.to_string(),
			first_result: Locator::Css(".listing_table".to_string()),
			result_items: Locator::XPath("//td[contains(@width, '15%')]".to_string()),
		}
	}

	fn extract<'a>(
		&'a self,
		session: &'a dyn BrowserSession,
		element: &'a ElementId,
	) -> BoxFuture<'a, Result<Option<CandidateRef>, ExtractionError>> {
		Box::pin(async move {
			let raw = session.text(element).await?.trim().to_uppercase();

			if !raw.chars().any(|ch| ch.is_ascii_digit()) {
				return Ok(None);
			}

			let number = if raw.starts_with("US") { raw } else { format!("US{raw}") };
			let canonical_id = canonical_patent_id(&number)
				.ok_or_else(|| ExtractionError::UnrecognizedId { raw: number.clone() })?;

			Ok(Some(CandidateRef::new(canonical_id, self.kind(), number)))
		})
	}
}

/// Google Patents search. Result nodes carry `data-result="patent/<id>/<lang>"`.
pub struct GooglePatentsSurface {
	base: String,
}
impl GooglePatentsSurface {
	pub fn new(base: &str) -> Self {
		Self { base: base.to_string() }
	}
}

impl ScrapedSurface for GooglePatentsSurface {
	fn kind(&self) -> SurfaceKind {
		SurfaceKind::GooglePatents
	}

	fn recipe(&self, query: &str) -> HarvestRecipe {
		HarvestRecipe {
			start_url: format!("{}/", self.base),
			search_input: Locator::Name("q".to_string()),
			query_text: query.to_string(),
			first_result: Locator::XPath(
				"//article[contains(@class, 'search-result-item')]".to_string(),
			),
			result_items: Locator::XPath(
				"//state-modifier[contains(@class, 'search-result-item')]".to_string(),
			),
		}
	}

	fn extract<'a>(
		&'a self,
		session: &'a dyn BrowserSession,
		element: &'a ElementId,
	) -> BoxFuture<'a, Result<Option<CandidateRef>, ExtractionError>> {
		Box::pin(async move {
			let data = session
				.attribute(element, "data-result")
				.await?
				.ok_or(ExtractionError::MissingField { field: "data-result" })?;
			let raw = data
				.split('/')
				.nth(1)
				.filter(|id| !id.is_empty())
				.ok_or_else(|| ExtractionError::UnrecognizedId { raw: data.clone() })?;
			let canonical_id = canonical_patent_id(raw)
				.ok_or_else(|| ExtractionError::UnrecognizedId { raw: raw.to_string() })?;

			Ok(Some(CandidateRef::new(canonical_id, self.kind(), raw)))
		})
	}
}

/// General web search restricted to Google Patents pages.
pub struct PatentWebSurface {
	base: String,
	patent_base: String,
}
impl PatentWebSurface {
	pub fn new(base: &str, patent_base: &str) -> Self {
		Self { base: base.to_string(), patent_base: patent_base.to_string() }
	}

	fn site(&self) -> &str {
		let host = self.patent_base.split_once("://").map_or(self.patent_base.as_str(), |(_, rest)| rest);

		host.trim_end_matches('/')
	}
}

impl ScrapedSurface for PatentWebSurface {
	fn kind(&self) -> SurfaceKind {
		SurfaceKind::PatentWeb
	}

	fn recipe(&self, query: &str) -> HarvestRecipe {
		HarvestRecipe {
			start_url: format!("{}/", self.base),
			search_input: Locator::Name("q".to_string()),
			query_text: format!("{query} site:{}", self.site()),
			first_result: Locator::XPath("//article[@data-nrn='result']".to_string()),
			result_items: Locator::XPath("//article[@data-nrn='result']//a".to_string()),
		}
	}

	fn extract<'a>(
		&'a self,
		session: &'a dyn BrowserSession,
		element: &'a ElementId,
	) -> BoxFuture<'a, Result<Option<CandidateRef>, ExtractionError>> {
		Box::pin(async move {
			let Some(href) = session.attribute(element, "href").await? else {
				return Ok(None);
			};

			if !href.starts_with(&self.patent_base) {
				return Ok(None);
			}

			let Some(raw) = patent_id_from_link(&href) else {
				return Ok(None);
			};
			let canonical_id = canonical_patent_id(raw)
				.ok_or_else(|| ExtractionError::UnrecognizedId { raw: raw.to_string() })?;

			Ok(Some(CandidateRef::new(canonical_id, self.kind(), raw)))
		})
	}
}

/// `https://patents.google.com/patent/US7657849B2/en` -> `US7657849B2`.
fn patent_id_from_link(href: &str) -> Option<&str> {
	let (_, tail) = href.split_once("/patent/")?;
	let id = tail.split(['/', '?', '#']).next()?;

	(!id.is_empty()).then_some(id)
}
