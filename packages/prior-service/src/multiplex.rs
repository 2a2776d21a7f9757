//! Recall widening: one description becomes the original plus up to `count` rephrasings.

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{CompletionRequest, Llm};

const REPHRASE_SYSTEM: &str = "You are an assistant for a patent law firm helping a client do \
	prior art discovery for an idea they are interested in pursuing. Rephrase their idea to be as \
	clear and brief as possible so that researchers make no mistakes while searching. State only \
	the idea and no other commentary.";
/// Rephrasings need sampling diversity even when the provider default is greedy.
const REPHRASE_TEMPERATURE: f32 = 1.0;

/// Returns the original description first, followed by every rephrasing that succeeded.
///
/// Rephrase calls run concurrently, at most `count` in flight. A failed or empty rephrasing is
/// dropped, as is one that repeats an earlier variant.
pub async fn expand(llm: &Llm, description: &str, count: u32) -> Vec<String> {
	let mut variants = vec![description.to_string()];

	if count == 0 {
		return variants;
	}

	let request = CompletionRequest {
		system: Some(REPHRASE_SYSTEM.to_string()),
		prompt: format!("IDEA: {description}"),
		temperature: Some(REPHRASE_TEMPERATURE),
		..Default::default()
	};
	let outcomes: Vec<_> = stream::iter(0..count)
		.map(|_| llm.ask(&request))
		.buffered(count as usize)
		.collect()
		.await;

	for (index, outcome) in outcomes.into_iter().enumerate() {
		match outcome {
			Ok(text) => {
				let text = prior_providers::collapse_whitespace(&text);

				if text.is_empty() || variants.contains(&text) {
					debug!(index, "Dropping empty or repeated rephrasing.");

					continue;
				}

				variants.push(text);
			},
			Err(err) => warn!(index, error = %err, "Rephrase failed; dropping variant."),
		}
	}

	variants
}
