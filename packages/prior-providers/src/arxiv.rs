//! arXiv Atom query API client.
//!
//! `search` pages through `search_query` results in relevance order; `fetch` re-reads a single
//! entry through `id_list`, which is the authoritative record for a preprint.

use std::time::Duration;

use quick_xml::{Reader, events::Event};
use reqwest::Client;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use tracing::debug;

use crate::{Error, Result};

const ERROR_ID_MARKER: &str = "/api/errors";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArxivEntry {
	/// Abstract page URL, for example `http://arxiv.org/abs/1706.03762v7`.
	pub entry_id: String,
	pub title: String,
	pub authors: Vec<String>,
	pub summary: String,
	/// `YYYY-MM-DD`.
	pub published: Option<String>,
	pub pdf_url: Option<String>,
	pub doi: Option<String>,
}

pub async fn search(
	client: &Client,
	cfg: &prior_config::AcademicSource,
	query: &str,
	max_results: u32,
) -> Result<Vec<ArxivEntry>> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut entries = Vec::new();

	while (entries.len() as u32) < max_results {
		let start = entries.len() as u32;
		let page_size = cfg.page_size.min(max_results - start);
		let res = client
			.get(&url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.query(&[
				("search_query", query.to_string()),
				("start", start.to_string()),
				("max_results", page_size.to_string()),
				("sortBy", "relevance".to_string()),
				("sortOrder", "descending".to_string()),
			])
			.send()
			.await?;
		let body = crate::check_status(res)?.text().await?;
		let page = parse_feed(&body)?;
		let fetched = page.len();

		debug!(start, fetched, "Fetched arXiv result page.");

		entries.extend(page);

		if fetched < page_size as usize {
			break;
		}
	}

	entries.truncate(max_results as usize);

	Ok(entries)
}

/// Reads one entry by identifier. `id` may carry a version suffix.
pub async fn fetch(
	client: &Client,
	cfg: &prior_config::AcademicSource,
	id: &str,
) -> Result<ArxivEntry> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(&url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.query(&[("id_list", id), ("max_results", "1")])
		.send()
		.await?;
	let body = crate::check_status(res)?.text().await?;

	parse_feed(&body)?.into_iter().next().ok_or(Error::NotFound { url: format!("{url}?id_list={id}") })
}

pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>> {
	#[derive(Clone, Copy, PartialEq)]
	enum Field {
		Id,
		Title,
		Summary,
		Published,
		AuthorName,
		Doi,
	}

	let mut reader = Reader::from_str(xml);
	let mut entries = Vec::new();
	let mut entry: Option<ArxivEntry> = None;
	let mut in_author = false;
	let mut field: Option<Field> = None;
	let mut text = String::new();

	loop {
		match reader.read_event().map_err(|err| Error::Xml { message: err.to_string() })? {
			Event::Start(ref e) => {
				let local_name = e.local_name();

				match local_name.as_ref() {
					b"entry" => entry = Some(ArxivEntry::default()),
					b"author" if entry.is_some() => in_author = true,
					name if entry.is_some() => {
						field = match name {
							b"id" => Some(Field::Id),
							b"title" => Some(Field::Title),
							b"summary" => Some(Field::Summary),
							b"published" => Some(Field::Published),
							b"name" if in_author => Some(Field::AuthorName),
							b"doi" => Some(Field::Doi),
							_ => None,
						};

						text.clear();
					},
					_ => {},
				}
			},
			Event::Empty(ref e) if e.local_name().as_ref() == b"link" => {
				let Some(current) = entry.as_mut() else {
					continue;
				};
				let mut href = None;
				let mut is_pdf = false;

				for attr in e.attributes().flatten() {
					let value = String::from_utf8_lossy(&attr.value).to_string();

					match attr.key.local_name().as_ref() {
						b"href" => href = Some(value),
						b"title" if value == "pdf" => is_pdf = true,
						b"type" if value == "application/pdf" => is_pdf = true,
						_ => {},
					}
				}

				if is_pdf && current.pdf_url.is_none() {
					current.pdf_url = href;
				}
			},
			Event::Text(ref e) if field.is_some() => {
				let unescaped = e.unescape().map_err(|err| Error::Xml { message: err.to_string() })?;

				text.push_str(&unescaped);
			},
			Event::CData(e) if field.is_some() => {
				text.push_str(&String::from_utf8_lossy(&e.into_inner()));
			},
			Event::End(ref e) => {
				let local_name = e.local_name();

				match local_name.as_ref() {
					b"entry" => {
						if let Some(done) = entry.take() {
							if done.entry_id.contains(ERROR_ID_MARKER) {
								return Err(Error::InvalidResponse {
									message: format!("arXiv rejected the query: {}", done.summary),
								});
							}

							entries.push(done);
						}
					},
					b"author" => in_author = false,
					_ => {
						if let (Some(current), Some(done)) = (entry.as_mut(), field.take()) {
							let value = crate::collapse_whitespace(&text);

							match done {
								Field::Id => current.entry_id = value,
								Field::Title => current.title = value,
								Field::Summary => current.summary = value,
								Field::Published => current.published = published_date(&value),
								Field::AuthorName if !value.is_empty() => current.authors.push(value),
								Field::AuthorName => {},
								Field::Doi if !value.is_empty() => current.doi = Some(value),
								Field::Doi => {},
							}
						}
					},
				}
			},
			Event::Eof => break,
			_ => {},
		}
	}

	Ok(entries)
}

fn published_date(raw: &str) -> Option<String> {
	let parsed = OffsetDateTime::parse(raw, &Rfc3339).ok()?;

	parsed.format(format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models &amp; more.  </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <arxiv:doi>10.48550/arXiv.1706.03762</arxiv:doi>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;

	#[test]
	fn parses_entry_fields() {
		let entries = parse_feed(FEED).expect("parse failed");

		assert_eq!(entries.len(), 1);

		let entry = &entries[0];

		assert_eq!(entry.entry_id, "http://arxiv.org/abs/1706.03762v7");
		assert_eq!(entry.title, "Attention Is All You Need");
		assert_eq!(entry.summary, "The dominant sequence transduction models & more.");
		assert_eq!(entry.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
		assert_eq!(entry.published.as_deref(), Some("2017-06-12"));
		assert_eq!(entry.pdf_url.as_deref(), Some("http://arxiv.org/pdf/1706.03762v7"));
		assert_eq!(entry.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
	}

	#[test]
	fn feed_title_is_not_an_entry_title() {
		let entries = parse_feed(FEED).expect("parse failed");

		assert_ne!(entries[0].title, "ArXiv Query");
	}

	#[test]
	fn error_entries_are_rejected() {
		let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
			<id>http://arxiv.org/api/errors#incorrect_id_format_for_abc</id>
			<title>Error</title>
			<summary>incorrect id format for abc</summary>
		</entry></feed>"#;

		assert!(matches!(parse_feed(xml), Err(Error::InvalidResponse { .. })));
	}
}
