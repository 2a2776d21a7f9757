//! Authoritative patent record pages.
//!
//! Search result listings truncate titles and abstracts, so a candidate is always re-read from
//! its full record page. Optional sections that are missing come back empty; only the title is
//! left as `None` for the caller to treat as fatal.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatentRecord {
	pub title: Option<String>,
	pub abstract_text: String,
	pub claims: String,
	pub url: String,
	pub pdf_url: Option<String>,
}

/// Fetches `{fpo_base}/{path}.html`. FreePatentsOnline addresses US grants by bare number and
/// every other publication by its full identifier.
pub async fn fetch_fpo(
	client: &Client,
	cfg: &prior_config::PatentSource,
	path: &str,
) -> Result<PatentRecord> {
	let url = format!("{}/{path}.html", cfg.fpo_base);
	let body = fetch_page(client, cfg, &url).await?;

	parse_fpo(&body, &url)
}

pub async fn fetch_google(
	client: &Client,
	cfg: &prior_config::PatentSource,
	id: &str,
) -> Result<PatentRecord> {
	let url = format!("{}/patent/{id}/en", cfg.google_base);
	let body = fetch_page(client, cfg, &url).await?;

	parse_google(&body, &url)
}

pub fn parse_fpo(html: &str, url: &str) -> Result<PatentRecord> {
	let doc = Html::parse_document(html);
	let divs = selector("div")?;
	let labelled = |label: &str| {
		doc.select(&divs)
			.find(|div| div.text().collect::<String>().trim() == label)
			.and_then(next_element_sibling)
			.map(|value| crate::collapse_whitespace(&value.text().collect::<String>()))
	};

	Ok(PatentRecord {
		title: labelled("Title:").filter(|title| !title.is_empty()),
		abstract_text: labelled("Abstract:").unwrap_or_default(),
		claims: labelled("Claims:").unwrap_or_default(),
		url: url.to_string(),
		pdf_url: None,
	})
}

pub fn parse_google(html: &str, url: &str) -> Result<PatentRecord> {
	let doc = Html::parse_document(html);
	let heading = selector("h1#title")?;
	let meta_title = selector(r#"meta[name="DC.title"]"#)?;
	let abstract_block = selector("div.abstract")?;
	let claim_text = selector(".claim-text")?;
	let pdf_link = selector(r#"meta[name="citation_pdf_url"]"#)?;
	let title = doc
		.select(&heading)
		.next()
		.map(|h1| crate::collapse_whitespace(&h1.text().collect::<String>()))
		.filter(|title| !title.is_empty())
		.or_else(|| {
			doc.select(&meta_title)
				.next()
				.and_then(|meta| meta.value().attr("content"))
				.map(crate::collapse_whitespace)
				.filter(|title| !title.is_empty())
		});
	let abstract_text = doc
		.select(&abstract_block)
		.next()
		.map(|div| crate::collapse_whitespace(&div.text().collect::<String>()))
		.unwrap_or_default();
	let claims = doc
		.select(&claim_text)
		.map(|claim| crate::collapse_whitespace(&claim.text().collect::<String>()))
		.filter(|claim| !claim.is_empty())
		.collect::<Vec<_>>()
		.join("\n");
	let pdf_url = doc
		.select(&pdf_link)
		.next()
		.and_then(|meta| meta.value().attr("content"))
		.map(str::to_string);

	Ok(PatentRecord { title, abstract_text, claims, url: url.to_string(), pdf_url })
}

async fn fetch_page(client: &Client, cfg: &prior_config::PatentSource, url: &str) -> Result<String> {
	let res = client.get(url).timeout(Duration::from_millis(cfg.timeout_ms)).send().await?;

	Ok(crate::check_status(res)?.text().await?)
}

fn selector(css: &str) -> Result<Selector> {
	Selector::parse(css).map_err(|_| Error::Selector { css: css.to_string() })
}

fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
	element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fpo_sections_follow_their_labels() {
		let html = r#"<html><body>
			<div class="disp_doc2">
				<div class="disp_elm_title">Title:</div>
				<div class="disp_elm_text">Unlocking a device by performing
					gestures on an unlock image</div>
			</div>
			<div class="disp_doc2">
				<div class="disp_elm_title">Abstract:</div>
				<div class="disp_elm_text">A device with a touch-sensitive display.</div>
			</div>
		</body></html>"#;
		let record = parse_fpo(html, "https://www.freepatentsonline.com/7657849.html")
			.expect("parse failed");

		assert_eq!(
			record.title.as_deref(),
			Some("Unlocking a device by performing gestures on an unlock image")
		);
		assert_eq!(record.abstract_text, "A device with a touch-sensitive display.");
		assert_eq!(record.claims, "");
	}

	#[test]
	fn google_title_falls_back_to_meta() {
		let html = r#"<html><head>
			<meta name="DC.title" content="Unlocking a device">
			<meta name="citation_pdf_url" content="https://patentimages.example/US7657849.pdf">
		</head><body>
			<div class="abstract">A device with a touch-sensitive display.</div>
			<div class="claim-text">1. A method of unlocking.</div>
			<div class="claim-text">2. The method of claim 1.</div>
		</body></html>"#;
		let record = parse_google(html, "https://patents.google.com/patent/US7657849B2/en")
			.expect("parse failed");

		assert_eq!(record.title.as_deref(), Some("Unlocking a device"));
		assert_eq!(record.claims, "1. A method of unlocking.\n2. The method of claim 1.");
		assert_eq!(record.pdf_url.as_deref(), Some("https://patentimages.example/US7657849.pdf"));
	}

	#[test]
	fn missing_title_is_none() {
		let record = parse_fpo("<html><body></body></html>", "u").expect("parse failed");

		assert_eq!(record.title, None);
	}
}
