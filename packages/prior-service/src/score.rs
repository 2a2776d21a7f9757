//! Relevance scoring. Every resolved document leaves this stage with a score in `[0, 1]`.

use tracing::warn;

use prior_domain::{ResolvedDocument, ScoreVerdict, ScoredResult};

use crate::{CompletionRequest, Llm};

const SCORING_SYSTEM: &str = "You evaluate prior art for a patent/invention description. Judge \
	conceptual similarity, technical overlap, potential applicability, and implementation methods.";

pub async fn score(
	llm: &Llm,
	description: &str,
	document: ResolvedDocument,
	attach_document: bool,
) -> ScoredResult {
	let attachment = if attach_document { document.document_url.clone() } else { None };
	let request = CompletionRequest::new(scoring_prompt(description, &document))
		.with_system(SCORING_SYSTEM)
		.with_attachment(attachment);
	let verdict = match llm.ask(&request).await {
		Ok(raw) => ScoreVerdict::from_response(&raw),
		Err(err) => {
			warn!(canonical_id = %document.canonical_id, error = %err, "Scoring call failed.");

			ScoreVerdict { score: 0.0, reasoning: Some(format!("Scoring failed: {err}")) }
		},
	};

	ScoredResult { document, relevance_score: verdict.score, reasoning: verdict.reasoning }
}

fn scoring_prompt(description: &str, document: &ResolvedDocument) -> String {
	format!(
		"Rate how relevant the document is to the invention on a scale from 0 to 1, where 0 means \
		 irrelevant and 1 means the invention would infringe it or directly overlaps it.\n\n\
		 Invention description:\n\"\"\"{description}\"\"\"\n\n\
		 Document to evaluate:\nTitle: {}\n{}\n\n\
		 Respond with a single JSON object and nothing else: \
		 {{\"score\": <number between 0 and 1>, \"reasoning\": \"<one or two sentences>\"}}",
		document.title,
		document.scoring_text()
	)
}

#[cfg(test)]
mod tests {
	use prior_domain::SurfaceKind;

	use super::*;

	#[test]
	fn prompt_states_the_scale_and_includes_claims() {
		let document = ResolvedDocument {
			canonical_id: "US7657849".to_string(),
			source_surface: SurfaceKind::FreePatentsOnline,
			title: "Unlocking a device".to_string(),
			authors: Vec::new(),
			summary: "A device with a touch-sensitive display.".to_string(),
			claims: "1. A method of unlocking.".to_string(),
			published_date: None,
			source_url: "https://www.freepatentsonline.com/7657849.html".to_string(),
			document_url: None,
			doi: None,
		};
		let prompt = scoring_prompt("swipe to unlock", &document);

		assert!(prompt.contains("0 means irrelevant"));
		assert!(prompt.contains("directly overlaps"));
		assert!(prompt.contains("Claims:\n1. A method of unlocking."));
		assert!(prompt.contains("{\"score\""));
	}
}
