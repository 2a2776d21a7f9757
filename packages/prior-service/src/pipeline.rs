//! The ranking pipeline.
//!
//! `run` composes every stage: formulate, multiplex, search each variant on each adapter, merge,
//! resolve, gate, summarize, score, filter, sort, truncate. Only query formulation of the
//! original description and cancellation can fail a run; every other failure is contained in the
//! branch or item that produced it.

use std::sync::Arc;

use futures::{StreamExt, future, stream};
use tracing::{debug, info, warn};

use prior_config::{Config, QueryFormulation};
use prior_domain::{ResolvedDocument, ScoredResult, SurfaceFamily};

use crate::{
	CancelToken, Llm, RecordResolver, Result, SearchAdapter, formulate::formulate, merge::merge,
	multiplex, prior_art::{self, PriorArtMode}, score::score, summarize::summarize,
};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
	pub query: QueryFormulation,
	/// Number of rephrasings per run; `None` disables multiplexing.
	pub multiplex_count: Option<u32>,
	pub search_workers: usize,
	pub resolve_workers: usize,
	pub score_workers: usize,
	pub prior_art: PriorArtMode,
	pub attach_documents: bool,
}
impl PipelineSettings {
	pub fn from_config(cfg: &Config) -> Self {
		let pipeline = &cfg.pipeline;

		Self {
			query: pipeline.query.clone(),
			multiplex_count: pipeline.multiplex.enabled.then_some(pipeline.multiplex.count),
			search_workers: pipeline.concurrency.search_workers.max(1) as usize,
			resolve_workers: pipeline.concurrency.resolve_workers.max(1) as usize,
			score_workers: pipeline.concurrency.score_workers.max(1) as usize,
			prior_art: PriorArtMode::from_config(&pipeline.prior_art.mode),
			attach_documents: pipeline.scoring.attach_documents,
		}
	}
}

/// Caller-selectable output policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPolicy {
	/// Drop results scoring exactly zero before sorting.
	pub positive_scores_only: bool,
	/// Replace each summary with a short generated one before scoring.
	pub summarize: bool,
}
impl RunPolicy {
	pub fn from_config(cfg: &prior_config::RunPolicy) -> Self {
		Self { positive_scores_only: cfg.positive_scores_only, summarize: cfg.summarize }
	}
}

pub struct Pipeline {
	family: SurfaceFamily,
	llm: Llm,
	adapters: Vec<Arc<dyn SearchAdapter>>,
	resolver: Arc<dyn RecordResolver>,
	settings: PipelineSettings,
}
impl Pipeline {
	pub fn new(
		family: SurfaceFamily,
		llm: Llm,
		adapters: Vec<Arc<dyn SearchAdapter>>,
		resolver: Arc<dyn RecordResolver>,
		settings: PipelineSettings,
	) -> Self {
		Self { family, llm, adapters, resolver, settings }
	}

	pub fn family(&self) -> SurfaceFamily {
		self.family
	}

	pub async fn run(
		&self,
		description: &str,
		policy: &RunPolicy,
		max_results: Option<u32>,
		cancel: &CancelToken,
	) -> Result<Vec<ScoredResult>> {
		cancel.check()?;

		let query =
			cancel.run(formulate(&self.llm, &self.settings.query, description, self.family)).await??;

		debug!(family = self.family.as_str(), query = %query, "Formulated query.");

		let queries = self.variant_queries(description, query, cancel).await?;
		let candidate_lists = self.search_all(&queries, max_results, cancel).await;

		cancel.check()?;

		let candidates = merge(candidate_lists);
		let resolved = cancel
			.run(
				stream::iter(candidates.iter().cloned())
					.map(|candidate| async move {
						match self.resolver.resolve(&candidate).await {
							Ok(document) => Some(document),
							Err(err) => {
								warn!(error = %err, "Dropping unresolved candidate.");

								None
							},
						}
					})
					.buffered(self.settings.resolve_workers)
					.filter_map(future::ready)
					.collect::<Vec<ResolvedDocument>>(),
			)
			.await?;
		let resolved_count = resolved.len();
		let kept = self.gate(description, resolved, cancel).await?;
		let documents = if policy.summarize {
			cancel
				.run(
					stream::iter(kept)
						.map(|document| summarize(&self.llm, document))
						.buffered(self.settings.score_workers)
						.collect::<Vec<ResolvedDocument>>(),
				)
				.await?
		} else {
			kept
		};
		let mut scored = cancel
			.run(
				stream::iter(documents)
					.map(|document| {
						score(&self.llm, description, document, self.settings.attach_documents)
					})
					.buffered(self.settings.score_workers)
					.collect::<Vec<ScoredResult>>(),
			)
			.await?;
		let scored_count = scored.len();

		if policy.positive_scores_only {
			scored.retain(|result| result.relevance_score > 0.0);
		}

		// Stable, so equal scores keep discovery order.
		scored.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

		if let Some(cap) = max_results {
			scored.truncate(cap as usize);
		}

		info!(
			family = self.family.as_str(),
			variants = queries.len(),
			candidates = candidates.len(),
			resolved = resolved_count,
			scored = scored_count,
			returned = scored.len(),
			"Pipeline run finished."
		);

		Ok(scored)
	}

	/// The formulated query first, then one query per surviving rephrasing.
	async fn variant_queries(
		&self,
		description: &str,
		query: String,
		cancel: &CancelToken,
	) -> Result<Vec<String>> {
		let mut queries = vec![query];
		let Some(count) = self.settings.multiplex_count else {
			return Ok(queries);
		};
		let variants = cancel.run(multiplex::expand(&self.llm, description, count)).await?;
		let formulated = cancel
			.run(
				stream::iter(variants.into_iter().skip(1))
					.map(|variant| async move {
						formulate(&self.llm, &self.settings.query, &variant, self.family).await
					})
					.buffered(count.max(1) as usize)
					.collect::<Vec<_>>(),
			)
			.await?;

		for outcome in formulated {
			match outcome {
				Ok(query) if !queries.contains(&query) => queries.push(query),
				Ok(_) => {},
				Err(err) => warn!(error = %err, "Dropping variant without a usable query."),
			}
		}

		Ok(queries)
	}

	/// Every (query, adapter) pair, in submission order. A failed branch contributes nothing.
	async fn search_all(
		&self,
		queries: &[String],
		limit: Option<u32>,
		cancel: &CancelToken,
	) -> Vec<Vec<prior_domain::CandidateRef>> {
		let jobs: Vec<(String, Arc<dyn SearchAdapter>)> = queries
			.iter()
			.flat_map(|query| self.adapters.iter().map(move |adapter| (query.clone(), adapter.clone())))
			.collect();

		stream::iter(jobs)
			.map(|(query, adapter)| async move {
				match adapter.search(&query, limit, cancel).await {
					Ok(candidates) => {
						debug!(
							surface = %adapter.surface(),
							found = candidates.len(),
							"Search branch finished."
						);

						candidates
					},
					Err(err) => {
						warn!(surface = %adapter.surface(), error = %err, "Search branch failed.");

						Vec::new()
					},
				}
			})
			.boxed()
			.buffered(self.settings.search_workers)
			.collect()
			.await
	}

	async fn gate(
		&self,
		description: &str,
		documents: Vec<ResolvedDocument>,
		cancel: &CancelToken,
	) -> Result<Vec<ResolvedDocument>> {
		if self.settings.prior_art == PriorArtMode::Off {
			return Ok(documents);
		}

		cancel
			.run(
				stream::iter(documents)
					.map(|document| async move {
						let keep = prior_art::is_prior_art(
							&self.llm,
							self.settings.prior_art,
							description,
							&document,
						)
						.await;

						keep.then_some(document)
					})
					.buffered(self.settings.score_workers)
					.filter_map(future::ready)
					.collect::<Vec<ResolvedDocument>>(),
			)
			.await
	}
}
