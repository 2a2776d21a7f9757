//! The prior-art gate: a cheap yes/no judgment run before the expensive summarize and score
//! calls.

use tracing::{debug, warn};

use prior_domain::ResolvedDocument;

use crate::{CompletionRequest, Llm};

const GATE_SYSTEM: &str = "You are an assistant for a patent law firm helping a client do prior \
	art discovery for an idea they are interested in pursuing. Given their proposed idea and a \
	document someone in the firm found during discovery, determine whether the document is related \
	at all to the idea. Return either true or false only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorArtMode {
	/// Every resolved candidate is kept.
	Off,
	/// The text generator judges each candidate.
	Llm,
}
impl PriorArtMode {
	pub fn from_config(mode: &str) -> Self {
		match mode {
			"llm" => Self::Llm,
			_ => Self::Off,
		}
	}
}

/// Whether `document` should stay in the run. Only an explicit `false` drops it; a failed or
/// malformed judgment keeps the candidate.
pub async fn is_prior_art(
	llm: &Llm,
	mode: PriorArtMode,
	description: &str,
	document: &ResolvedDocument,
) -> bool {
	if mode == PriorArtMode::Off {
		return true;
	}

	let request = CompletionRequest::new(format!(
		"IDEA: {description}\nDOCUMENT: {}\n{}",
		document.title,
		document.scoring_text()
	))
	.with_system(GATE_SYSTEM)
	.with_max_output_tokens(8);

	match llm.ask(&request).await {
		Ok(answer) => {
			let keep = parse_judgment(&answer);

			if !keep {
				debug!(canonical_id = %document.canonical_id, "Prior-art gate dropped candidate.");
			}

			keep
		},
		Err(err) => {
			warn!(
				canonical_id = %document.canonical_id,
				error = %err,
				"Prior-art judgment failed; keeping candidate."
			);

			true
		},
	}
}

fn parse_judgment(answer: &str) -> bool {
	let normalized = answer.trim().trim_matches(|ch: char| !ch.is_ascii_alphabetic());

	!normalized.eq_ignore_ascii_case("false")
}
