use reqwest::Client;

use prior_config::AcademicSource;
use prior_domain::{CandidateRef, SurfaceKind, canonical_arxiv_id};
use prior_providers::arxiv;

use crate::{AdapterError, BoxFuture, CancelToken, SearchAdapter};

/// Structured-API surface: one paginated Atom query.
pub struct ArxivAdapter {
	cfg: AcademicSource,
	client: Client,
}
impl ArxivAdapter {
	pub fn new(cfg: AcademicSource) -> Self {
		Self { cfg, client: Client::new() }
	}

	async fn run(&self, query: &str, limit: Option<u32>) -> Result<Vec<CandidateRef>, AdapterError> {
		let max_results = limit.filter(|limit| *limit > 0).unwrap_or(self.cfg.page_size);
		let entries = arxiv::search(&self.client, &self.cfg, query, max_results).await.map_err(|err| {
			AdapterError::Unavailable { surface: SurfaceKind::Arxiv, message: err.to_string() }
		})?;

		Ok(entries
			.into_iter()
			.filter_map(|entry| {
				let canonical_id = canonical_arxiv_id(&entry.entry_id)?;

				Some(CandidateRef::new(canonical_id, SurfaceKind::Arxiv, entry.entry_id))
			})
			.collect())
	}
}

impl SearchAdapter for ArxivAdapter {
	fn surface(&self) -> SurfaceKind {
		SurfaceKind::Arxiv
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: Option<u32>,
		cancel: &'a CancelToken,
	) -> BoxFuture<'a, Result<Vec<CandidateRef>, AdapterError>> {
		Box::pin(async move {
			cancel
				.run(self.run(query, limit))
				.await
				.unwrap_or(Err(AdapterError::Cancelled { surface: SurfaceKind::Arxiv }))
		})
	}
}
