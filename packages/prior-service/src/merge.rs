use std::collections::HashSet;

use prior_domain::CandidateRef;

/// Unions candidate lists keyed by `canonical_id`. The first occurrence wins, so the result
/// keeps discovery order.
pub fn merge<I>(lists: I) -> Vec<CandidateRef>
where
	I: IntoIterator<Item = Vec<CandidateRef>>,
{
	let mut seen = HashSet::new();
	let mut merged = Vec::new();

	for candidate in lists.into_iter().flatten() {
		if seen.insert(candidate.canonical_id.clone()) {
			merged.push(candidate);
		}
	}

	merged
}
