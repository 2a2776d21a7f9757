//! Incremental harvesting of a lazily rendered result feed.
//!
//! A harvest walks `Start -> Submit -> Harvesting -> {Done, Aborted, Capped, Cancelled}`. The
//! feed has no total-count signal, so the loop ends when a pass renders no new result nodes.
//! The iteration and element caps bound the loop when the feed never stagnates.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use prior_domain::{CandidateRef, SurfaceKind};

use crate::{BoxFuture, BrowserSession, CancelToken, ElementId, ExtractionError, Locator};

/// Everything a surface needs to say about its markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRecipe {
	pub start_url: String,
	/// Present once the page can accept a query.
	pub search_input: Locator,
	pub query_text: String,
	/// Present once the first results have rendered.
	pub first_result: Locator,
	/// One match per result node, in result order.
	pub result_items: Locator,
}

/// A scraped surface: its markup recipe plus per-node extraction.
pub trait ScrapedSurface
where
	Self: Send + Sync,
{
	fn kind(&self) -> SurfaceKind;

	fn recipe(&self, query: &str) -> HarvestRecipe;

	/// `Ok(None)` marks a node that is not a document link and is skipped silently.
	fn extract<'a>(
		&'a self,
		session: &'a dyn BrowserSession,
		element: &'a ElementId,
	) -> BoxFuture<'a, Result<Option<CandidateRef>, ExtractionError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestLimits {
	pub ready_timeout: Duration,
	pub poll_interval: Duration,
	pub scroll_settle: Duration,
	pub max_iterations: u32,
	/// Runaway guard on processed result nodes. Zero disables the cap.
	pub max_elements: u32,
	/// Stops the harvest once this many candidates were accepted. Zero disables the cap.
	pub max_candidates: u32,
}
impl HarvestLimits {
	pub fn from_config(cfg: &prior_config::Browser) -> Self {
		Self {
			ready_timeout: Duration::from_millis(cfg.ready_timeout_ms),
			poll_interval: Duration::from_millis(cfg.poll_interval_ms),
			scroll_settle: Duration::from_millis(cfg.scroll_settle_ms),
			max_iterations: cfg.max_iterations,
			max_elements: cfg.max_elements,
			max_candidates: 0,
		}
	}

	/// Stops after `limit` accepted candidates. The element cap is left alone since skipped
	/// nodes do not count toward the caller's limit.
	pub fn capped_to(mut self, limit: Option<u32>) -> Self {
		self.max_candidates = limit.unwrap_or(0);

		self
	}

	fn candidates_full(&self, accepted: usize) -> bool {
		self.max_candidates > 0 && accepted >= self.max_candidates as usize
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEnd {
	/// A pass rendered no new nodes.
	Done,
	/// The session never became ready, or the browser failed. Partial results are kept.
	Aborted { reason: String },
	/// The iteration, element, or candidate cap was reached.
	Capped,
	Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
	pub candidates: Vec<CandidateRef>,
	pub end: HarvestEnd,
	pub iterations: u32,
}

#[derive(Debug)]
enum WaitError {
	Timeout,
	Cancelled,
	Browser(prior_providers::Error),
}

pub async fn harvest(
	session: &dyn BrowserSession,
	surface: &dyn ScrapedSurface,
	query: &str,
	limits: &HarvestLimits,
	cancel: &CancelToken,
) -> HarvestOutcome {
	let recipe = surface.recipe(query);
	let mut outcome =
		HarvestOutcome { candidates: Vec::new(), end: HarvestEnd::Done, iterations: 0 };

	if let Err(err) = session.navigate(&recipe.start_url).await {
		outcome.end = HarvestEnd::Aborted { reason: format!("Navigation failed: {err}") };

		return outcome;
	}

	let input = match wait_for(session, &recipe.search_input, limits, cancel).await {
		Ok(found) => found,
		Err(err) => {
			outcome.end = wait_end(err, "search input");

			return outcome;
		},
	};

	if let Err(err) = session.send_keys(&input[0], &recipe.query_text, true).await {
		outcome.end = HarvestEnd::Aborted { reason: format!("Query submission failed: {err}") };

		return outcome;
	}
	if let Err(err) = wait_for(session, &recipe.first_result, limits, cancel).await {
		outcome.end = wait_end(err, "first result");

		return outcome;
	}

	let mut previous = 0_usize;

	loop {
		if cancel.is_cancelled() {
			outcome.end = HarvestEnd::Cancelled;

			break;
		}
		if outcome.iterations >= limits.max_iterations {
			outcome.end = HarvestEnd::Capped;

			break;
		}

		outcome.iterations += 1;

		let rendered = match session.find_all(&recipe.result_items).await {
			Ok(rendered) => rendered,
			Err(err) => {
				outcome.end = HarvestEnd::Aborted { reason: format!("Result lookup failed: {err}") };

				break;
			},
		};
		let visible = match limits.max_elements {
			0 => rendered.len(),
			cap => rendered.len().min(cap as usize),
		};

		if visible <= previous {
			outcome.end = HarvestEnd::Done;

			break;
		}

		for element in &rendered[previous..visible] {
			match surface.extract(session, element).await {
				Ok(Some(candidate)) => outcome.candidates.push(candidate),
				Ok(None) => {},
				Err(err) => {
					warn!(surface = %surface.kind(), error = %err, "Skipping malformed result node.");
				},
			}

			if limits.candidates_full(outcome.candidates.len()) {
				break;
			}
		}

		previous = visible;

		if limits.candidates_full(outcome.candidates.len())
			|| (limits.max_elements > 0 && visible >= limits.max_elements as usize)
		{
			outcome.end = HarvestEnd::Capped;

			break;
		}
		if let Err(err) = session.scroll_to_bottom().await {
			outcome.end = HarvestEnd::Aborted { reason: format!("Scrolling failed: {err}") };

			break;
		}

		tokio::select! {
			_ = cancel.cancelled() => {},
			_ = tokio::time::sleep(limits.scroll_settle) => {},
		}
	}

	debug!(
		surface = %surface.kind(),
		candidates = outcome.candidates.len(),
		iterations = outcome.iterations,
		end = ?outcome.end,
		"Harvest finished."
	);

	outcome
}

/// Polls `locator` until it matches at least one element.
async fn wait_for(
	session: &dyn BrowserSession,
	locator: &Locator,
	limits: &HarvestLimits,
	cancel: &CancelToken,
) -> Result<Vec<ElementId>, WaitError> {
	let deadline = Instant::now() + limits.ready_timeout;

	loop {
		if cancel.is_cancelled() {
			return Err(WaitError::Cancelled);
		}

		let found = session.find_all(locator).await.map_err(WaitError::Browser)?;

		if !found.is_empty() {
			return Ok(found);
		}
		if Instant::now() >= deadline {
			return Err(WaitError::Timeout);
		}

		tokio::select! {
			_ = cancel.cancelled() => return Err(WaitError::Cancelled),
			_ = tokio::time::sleep(limits.poll_interval) => {},
		}
	}
}

fn wait_end(err: WaitError, what: &str) -> HarvestEnd {
	match err {
		WaitError::Timeout => HarvestEnd::Aborted { reason: format!("Timed out waiting for the {what}.") },
		WaitError::Cancelled => HarvestEnd::Cancelled,
		WaitError::Browser(err) => {
			HarvestEnd::Aborted { reason: format!("Browser failed while waiting for the {what}: {err}") }
		},
	}
}
