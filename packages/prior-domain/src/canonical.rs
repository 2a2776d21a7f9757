//! Canonical identifiers.
//!
//! Two surfaces rarely render a document's identifier the same way: FreePatentsOnline lists
//! `7657849`, Google Patents links `US7657849B2`, arXiv entries carry a versioned URL. The
//! functions here reduce each rendering to one stable key.

const ARXIV_PREFIX: &str = "arxiv:";

/// Normalizes a patent number to `<country><number>`, dropping separators and the kind code.
///
/// Bare numbers are assumed to be US publications. Returns `None` when no digits remain.
pub fn canonical_patent_id(raw: &str) -> Option<String> {
	let compact: String = raw
		.trim()
		.chars()
		.filter(|ch| !ch.is_whitespace() && !matches!(ch, ',' | '-' | '/' | '.'))
		.flat_map(char::to_uppercase)
		.collect();
	let (country, body) = split_country(&compact);
	let body = strip_kind_code(body);

	if !body.chars().any(|ch| ch.is_ascii_digit()) {
		return None;
	}
	if !body.chars().all(|ch| ch.is_ascii_alphanumeric()) {
		return None;
	}

	Some(format!("{country}{body}"))
}

/// Normalizes an arXiv identifier or abstract URL to `arxiv:<id>` without its version suffix.
///
/// Accepts both new-style (`2101.00001v2`) and old-style (`hep-th/9901001v1`) identifiers.
pub fn canonical_arxiv_id(raw: &str) -> Option<String> {
	let trimmed = raw.trim().trim_end_matches('/');
	let id = ["/abs/", "/pdf/"]
		.iter()
		.find_map(|marker| trimmed.split_once(marker).map(|(_, tail)| tail))
		.unwrap_or(trimmed);
	let id = id.strip_prefix(ARXIV_PREFIX).unwrap_or(id);
	let id = id.trim_end_matches(".pdf");
	let id = strip_version(id);

	if id.is_empty() || !id.chars().any(|ch| ch.is_ascii_digit()) {
		return None;
	}

	Some(format!("{ARXIV_PREFIX}{}", id.to_ascii_lowercase()))
}

/// The number part of a canonical patent id, as record pages address it.
pub fn patent_number(canonical_id: &str) -> &str {
	let (_, body) = split_country(canonical_id);

	body
}

fn split_country(compact: &str) -> (&str, &str) {
	let bytes = compact.as_bytes();

	if bytes.len() > 2
		&& bytes[0].is_ascii_alphabetic()
		&& bytes[1].is_ascii_alphabetic()
		&& bytes[2].is_ascii_digit()
	{
		return compact.split_at(2);
	}

	("US", compact)
}

fn strip_kind_code(body: &str) -> &str {
	let bytes = body.as_bytes();
	let len = bytes.len();

	// Kind codes are a letter optionally followed by one digit, directly after the number.
	if len >= 3
		&& bytes[len - 1].is_ascii_digit()
		&& bytes[len - 2].is_ascii_alphabetic()
		&& bytes[len - 3].is_ascii_digit()
	{
		return &body[..len - 2];
	}
	if len >= 2 && bytes[len - 1].is_ascii_alphabetic() && bytes[len - 2].is_ascii_digit() {
		return &body[..len - 1];
	}

	body
}

fn strip_version(id: &str) -> &str {
	if let Some(pos) = id.rfind('v') {
		let (head, tail) = id.split_at(pos);
		let digits = &tail[1..];

		if !head.is_empty() && !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
			return head;
		}
	}

	id
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_code_and_separators_are_dropped() {
		assert_eq!(canonical_patent_id("US 7,657,849 B2").as_deref(), Some("US7657849"));
		assert_eq!(canonical_patent_id("us20100123456a1").as_deref(), Some("US20100123456"));
	}

	#[test]
	fn bare_numbers_default_to_us() {
		assert_eq!(canonical_patent_id("7657849").as_deref(), Some("US7657849"));
		assert_eq!(canonical_patent_id("D612,345").as_deref(), Some("USD612345"));
	}

	#[test]
	fn arxiv_versions_are_dropped() {
		assert_eq!(
			canonical_arxiv_id("http://arxiv.org/abs/2101.00001v2").as_deref(),
			Some("arxiv:2101.00001")
		);
		assert_eq!(canonical_arxiv_id("hep-th/9901001v1").as_deref(), Some("arxiv:hep-th/9901001"));
	}

	#[test]
	fn patent_number_strips_country() {
		assert_eq!(patent_number("US7657849"), "7657849");
	}
}
