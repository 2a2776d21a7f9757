use serde::{Deserialize, Serialize};

use prior_domain::{ScoredResult, SurfaceFamily};

use crate::{CancelToken, Error, Pipeline, PriorArtService, Result, RunPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct PaperSearchRequest {
	pub description: String,
	pub max_papers: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatentSearchRequest {
	pub description: String,
	pub max_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperResult {
	pub title: String,
	pub authors: Vec<String>,
	pub summary: String,
	pub pdf_url: String,
	/// `YYYY-MM-DD`, empty when the record has no date.
	pub published: String,
	pub paper_url: String,
	pub paper_id: String,
	pub doi: Option<String>,
	pub relevance_score: f32,
	pub reasoning: Option<String>,
}
impl From<ScoredResult> for PaperResult {
	fn from(result: ScoredResult) -> Self {
		let document = result.document;
		let paper_id = document
			.canonical_id
			.strip_prefix("arxiv:")
			.unwrap_or(&document.canonical_id)
			.to_string();

		Self {
			title: document.title,
			authors: document.authors,
			summary: document.summary,
			pdf_url: document.document_url.unwrap_or_default(),
			published: document.published_date.unwrap_or_default(),
			paper_url: document.source_url,
			paper_id,
			doi: document.doi,
			relevance_score: result.relevance_score,
			reasoning: result.reasoning,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentResult {
	pub id: String,
	pub title: String,
	pub summary: String,
	pub relevance_score: f32,
}
impl From<ScoredResult> for PatentResult {
	fn from(result: ScoredResult) -> Self {
		Self {
			id: result.document.canonical_id,
			title: result.document.title,
			summary: result.document.summary,
			relevance_score: result.relevance_score,
		}
	}
}

impl PriorArtService {
	pub async fn search_papers(
		&self,
		req: PaperSearchRequest,
		cancel: &CancelToken,
	) -> Result<Vec<PaperResult>> {
		let pipeline = self.pipeline(SurfaceFamily::Academic)?;
		let policy = &self.cfg.pipeline.papers;
		let max_results = effective_cap(req.max_papers, policy.default_max_results)?;

		require_description(&req.description)?;

		let results = pipeline
			.run(&req.description, &RunPolicy::from_config(policy), max_results, cancel)
			.await?;

		Ok(results.into_iter().map(PaperResult::from).collect())
	}

	pub async fn search_patents(
		&self,
		req: PatentSearchRequest,
		cancel: &CancelToken,
	) -> Result<Vec<PatentResult>> {
		let pipeline = self.pipeline(SurfaceFamily::Patent)?;
		let policy = &self.cfg.pipeline.patents;
		let max_results = effective_cap(req.max_results, policy.default_max_results)?;

		require_description(&req.description)?;

		let results = pipeline
			.run(&req.description, &RunPolicy::from_config(policy), max_results, cancel)
			.await?;

		Ok(results.into_iter().map(PatentResult::from).collect())
	}

	fn pipeline(&self, family: SurfaceFamily) -> Result<&Pipeline> {
		let pipeline = match family {
			SurfaceFamily::Academic => self.papers.as_ref(),
			SurfaceFamily::Patent => self.patents.as_ref(),
		};

		pipeline.ok_or(Error::SourceDisabled { family: family.as_str() })
	}
}

fn require_description(description: &str) -> Result<()> {
	if description.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "description must be non-empty.".to_string() });
	}

	Ok(())
}

fn effective_cap(requested: Option<u32>, default: Option<u32>) -> Result<Option<u32>> {
	if requested == Some(0) {
		return Err(Error::InvalidRequest { message: "The result cap must be positive.".to_string() });
	}

	Ok(requested.or(default))
}

#[cfg(test)]
mod tests {
	use prior_domain::{ResolvedDocument, SurfaceKind};

	use super::*;

	fn scored(canonical_id: &str, surface: SurfaceKind) -> ScoredResult {
		ScoredResult {
			document: ResolvedDocument {
				canonical_id: canonical_id.to_string(),
				source_surface: surface,
				title: "Title".to_string(),
				authors: vec!["A. Author".to_string()],
				summary: "Summary.".to_string(),
				claims: String::new(),
				published_date: Some("2017-06-12".to_string()),
				source_url: "http://arxiv.org/abs/1706.03762v7".to_string(),
				document_url: Some("http://arxiv.org/pdf/1706.03762v7".to_string()),
				doi: None,
			},
			relevance_score: 0.5,
			reasoning: Some("Overlaps.".to_string()),
		}
	}

	#[test]
	fn paper_results_expose_the_bare_arxiv_id() {
		let paper = PaperResult::from(scored("arxiv:1706.03762", SurfaceKind::Arxiv));

		assert_eq!(paper.paper_id, "1706.03762");
		assert_eq!(paper.paper_url, "http://arxiv.org/abs/1706.03762v7");
		assert_eq!(paper.pdf_url, "http://arxiv.org/pdf/1706.03762v7");
		assert_eq!(paper.published, "2017-06-12");
	}

	#[test]
	fn patent_results_serialize_four_fields() {
		let patent = PatentResult::from(scored("US7657849", SurfaceKind::FreePatentsOnline));
		let json = serde_json::to_value(&patent).expect("Failed to serialize.");
		let keys: Vec<_> = json.as_object().map(|obj| obj.keys().cloned().collect()).unwrap_or_default();

		assert_eq!(keys.len(), 4);
		assert_eq!(json["id"], "US7657849");
	}

	#[test]
	fn zero_caps_are_rejected() {
		assert!(matches!(effective_cap(Some(0), None), Err(Error::InvalidRequest { .. })));
		assert_eq!(effective_cap(None, Some(10)).ok(), Some(Some(10)));
		assert_eq!(effective_cap(Some(3), Some(10)).ok(), Some(Some(3)));
	}
}
