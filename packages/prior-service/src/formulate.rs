//! Query formulation.
//!
//! The academic index takes a keyword query with boolean grouping and field prefixes, written by
//! the text generator. The patent surfaces take natural language, so the description passes
//! through as-is unless it is long enough to need compressing first.

use tracing::debug;

use prior_config::QueryFormulation;
use prior_domain::SurfaceFamily;

use crate::{CompletionRequest, Error, Llm, Result};

pub async fn formulate(
	llm: &Llm,
	cfg: &QueryFormulation,
	description: &str,
	family: SurfaceFamily,
) -> Result<String> {
	let description = description.trim();

	if description.is_empty() {
		return Err(Error::QueryFormulation { message: "The description is empty.".to_string() });
	}

	let query = match family {
		SurfaceFamily::Academic => ask(llm, academic_request(description)).await?,
		SurfaceFamily::Patent => {
			let words = description.split_whitespace().count();

			if words > cfg.compress_word_threshold as usize {
				debug!(words, target = cfg.compress_target_words, "Compressing patent query.");

				ask(llm, compression_request(description, cfg.compress_target_words)).await?
			} else {
				description.to_string()
			}
		},
	};

	Ok(query)
}

async fn ask(llm: &Llm, request: CompletionRequest) -> Result<String> {
	let raw = llm
		.ask(&request)
		.await
		.map_err(|err| Error::QueryFormulation { message: err.to_string() })?;
	let query = clean_query(&raw);

	if query.is_empty() {
		return Err(Error::QueryFormulation {
			message: "The text generator returned an empty query.".to_string(),
		});
	}

	Ok(query)
}

fn academic_request(description: &str) -> CompletionRequest {
	let prompt = format!(
		"You are helping search for prior art on arXiv.\n\
		 Given the following invention description, write one concise search query built from \
		 the important keywords and their synonyms, combined with AND/OR and grouped with \
		 parentheses. Use arXiv field prefixes: ti: for title terms, abs: for abstract terms, \
		 all: for anything else. Quote multi-word phrases. Avoid full sentences.\n\n\
		 Description:\n\"\"\"{description}\"\"\"\n\n\
		 Output only the query string, no explanations."
	);

	CompletionRequest::new(prompt)
}

fn compression_request(description: &str, target_words: u32) -> CompletionRequest {
	CompletionRequest::new(format!(
		"Summarize the following text in {target_words} words as accurately as possible. \
		 Do not introduce anything that is not in the text. Output only the summary.\n\
		 TEXT: {description}"
	))
}

/// Drops wrapping code fences, quotes, and a leading `Query:` label.
pub(crate) fn clean_query(raw: &str) -> String {
	let mut text = raw.trim();

	if let Some(rest) = text.strip_prefix("```") {
		let rest = rest.trim_start_matches(|ch: char| ch.is_ascii_alphabetic());

		text = rest.strip_suffix("```").unwrap_or(rest).trim();
	}
	for label in ["Query:", "query:", "QUERY:"] {
		if let Some(rest) = text.strip_prefix(label) {
			text = rest.trim();
		}
	}

	let text = text.trim_matches('`');
	let quoted = text.len() >= 2 && text.starts_with('"') && text.ends_with('"');
	let unquoted =
		if quoted && text.matches('"').count() == 2 { &text[1..text.len() - 1] } else { text };

	prior_providers::collapse_whitespace(unquoted)
}
