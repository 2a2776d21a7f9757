use serde::{Deserialize, Serialize};

use crate::surface::SurfaceKind;

/// Handle to a not-yet-resolved search hit.
///
/// `canonical_id` is derived from the surface's stable identifier scheme so the same document
/// found on two surfaces, or for two query variants, collapses to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRef {
	pub canonical_id: String,
	pub source_surface: SurfaceKind,
	/// The identifier as the surface rendered it, used to address the record source.
	pub raw_locator: String,
}
impl CandidateRef {
	pub fn new(
		canonical_id: impl Into<String>,
		source_surface: SurfaceKind,
		raw_locator: impl Into<String>,
	) -> Self {
		Self {
			canonical_id: canonical_id.into(),
			source_surface,
			raw_locator: raw_locator.into(),
		}
	}
}

/// Full record fetched from a surface's authoritative source.
///
/// Optional text fields resolve to an empty string when the record omits them; `authors` is
/// empty for patents and `claims` is empty for preprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDocument {
	pub canonical_id: String,
	pub source_surface: SurfaceKind,
	pub title: String,
	pub authors: Vec<String>,
	pub summary: String,
	pub claims: String,
	/// `YYYY-MM-DD` when known.
	pub published_date: Option<String>,
	pub source_url: String,
	/// Hosted full text (for example a PDF), used for multimodal scoring.
	pub document_url: Option<String>,
	pub doi: Option<String>,
}
impl ResolvedDocument {
	/// Text handed to the scorer: the summary, followed by claims when present.
	pub fn scoring_text(&self) -> String {
		if self.claims.trim().is_empty() {
			return self.summary.clone();
		}

		format!("{}\n\nClaims:\n{}", self.summary, self.claims)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
	pub document: ResolvedDocument,
	/// Always within `[0, 1]`.
	pub relevance_score: f32,
	pub reasoning: Option<String>,
}
