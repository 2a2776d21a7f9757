use tracing::warn;

use prior_domain::ResolvedDocument;

use crate::{CompletionRequest, Llm};

const SUMMARY_WORD_LIMIT: u32 = 100;

/// Replaces the summary with a short generated one. The abstract stays when generation fails
/// or comes back empty.
pub async fn summarize(llm: &Llm, mut document: ResolvedDocument) -> ResolvedDocument {
	let request = CompletionRequest::new(format!(
		"Summarize this patent into {SUMMARY_WORD_LIMIT} English words or fewer. Output only the \
		 summary.\nTitle: {}\nAbstract: {}\nClaims: {}",
		document.title, document.summary, document.claims
	));

	match llm.ask(&request).await {
		Ok(text) => {
			let text = prior_providers::collapse_whitespace(&text);

			if text.is_empty() {
				warn!(canonical_id = %document.canonical_id, "Empty summary; keeping the abstract.");
			} else {
				document.summary = text;
			}
		},
		Err(err) => {
			warn!(
				canonical_id = %document.canonical_id,
				error = %err,
				"Summarization failed; keeping the abstract."
			);
		},
	}

	document
}
