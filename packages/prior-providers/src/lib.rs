//! Outbound clients for every external collaborator the pipeline talks to.

pub mod arxiv;
pub mod llm;
pub mod patent_record;
pub mod webdriver;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Maps a non-success status onto `Error::NotFound` or `Error::Status`.
pub(crate) fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let url = res.url().to_string();

	if status == reqwest::StatusCode::NOT_FOUND {
		return Err(Error::NotFound { url });
	}

	Err(Error::Status { status: status.as_u16(), url })
}

/// Collapses runs of whitespace, as upstream records wrap titles and abstracts arbitrarily.
pub fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}
