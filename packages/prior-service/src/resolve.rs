//! Candidate resolution against each family's authoritative record source.

use reqwest::Client;

use prior_config::{AcademicSource, PatentSource};
use prior_domain::{CandidateRef, ResolvedDocument, SurfaceFamily, canonical::patent_number};
use prior_providers::{
	arxiv,
	patent_record::{self, PatentRecord},
};

use crate::{BoxFuture, RecordResolver, ResolutionError};

/// Re-reads preprints through the arXiv `id_list` query.
pub struct ArxivResolver {
	cfg: AcademicSource,
	client: Client,
}
impl ArxivResolver {
	pub fn new(cfg: AcademicSource) -> Self {
		Self { cfg, client: Client::new() }
	}

	async fn run(&self, candidate: &CandidateRef) -> Result<ResolvedDocument, ResolutionError> {
		let canonical_id = candidate.canonical_id.as_str();

		if candidate.source_surface.family() != SurfaceFamily::Academic {
			return Err(ResolutionError::Unsupported {
				canonical_id: canonical_id.to_string(),
				surface: candidate.source_surface,
			});
		}

		let id = canonical_id.strip_prefix("arxiv:").unwrap_or(canonical_id);
		let entry = arxiv::fetch(&self.client, &self.cfg, id)
			.await
			.map_err(|err| ResolutionError::from_provider(canonical_id, err))?;

		if entry.title.is_empty() {
			return Err(ResolutionError::MissingTitle { canonical_id: canonical_id.to_string() });
		}

		Ok(ResolvedDocument {
			canonical_id: canonical_id.to_string(),
			source_surface: candidate.source_surface,
			title: entry.title,
			authors: entry.authors,
			summary: entry.summary,
			claims: String::new(),
			published_date: entry.published,
			source_url: entry.entry_id,
			document_url: entry.pdf_url,
			doi: entry.doi,
		})
	}
}

impl RecordResolver for ArxivResolver {
	fn resolve<'a>(
		&'a self,
		candidate: &'a CandidateRef,
	) -> BoxFuture<'a, Result<ResolvedDocument, ResolutionError>> {
		Box::pin(self.run(candidate))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordSource {
	FreePatentsOnline,
	GooglePatents,
}

/// Reads patents from the configured record page, whichever surface found them.
pub struct PatentResolver {
	cfg: PatentSource,
	client: Client,
	source: RecordSource,
}
impl PatentResolver {
	pub fn new(cfg: PatentSource) -> Self {
		let source = match cfg.record_source.as_str() {
			"google" => RecordSource::GooglePatents,
			_ => RecordSource::FreePatentsOnline,
		};

		Self { cfg, client: Client::new(), source }
	}

	async fn run(&self, candidate: &CandidateRef) -> Result<ResolvedDocument, ResolutionError> {
		let canonical_id = candidate.canonical_id.as_str();

		if candidate.source_surface.family() != SurfaceFamily::Patent {
			return Err(ResolutionError::Unsupported {
				canonical_id: canonical_id.to_string(),
				surface: candidate.source_surface,
			});
		}

		let fetched = match self.source {
			RecordSource::FreePatentsOnline => {
				patent_record::fetch_fpo(&self.client, &self.cfg, fpo_path(canonical_id)).await
			},
			RecordSource::GooglePatents => {
				patent_record::fetch_google(&self.client, &self.cfg, canonical_id).await
			},
		};
		let record = fetched.map_err(|err| ResolutionError::from_provider(canonical_id, err))?;

		document_from_record(candidate, record)
	}
}

impl RecordResolver for PatentResolver {
	fn resolve<'a>(
		&'a self,
		candidate: &'a CandidateRef,
	) -> BoxFuture<'a, Result<ResolvedDocument, ResolutionError>> {
		Box::pin(self.run(candidate))
	}
}

/// FreePatentsOnline addresses US publications by bare number and the rest by full id.
fn fpo_path(canonical_id: &str) -> &str {
	if canonical_id.starts_with("US") { patent_number(canonical_id) } else { canonical_id }
}

fn document_from_record(
	candidate: &CandidateRef,
	record: PatentRecord,
) -> Result<ResolvedDocument, ResolutionError> {
	let title = record
		.title
		.ok_or_else(|| ResolutionError::MissingTitle { canonical_id: candidate.canonical_id.clone() })?;

	Ok(ResolvedDocument {
		canonical_id: candidate.canonical_id.clone(),
		source_surface: candidate.source_surface,
		title,
		authors: Vec::new(),
		summary: record.abstract_text,
		claims: record.claims,
		published_date: None,
		source_url: record.url,
		document_url: record.pdf_url,
		doi: None,
	})
}
