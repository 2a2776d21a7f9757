pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Upstream returned HTTP {status} for {url}.")]
	Status { status: u16, url: String },
	#[error("No record found at {url}.")]
	NotFound { url: String },
	#[error("Malformed XML: {message}")]
	Xml { message: String },
	#[error("Invalid CSS selector {css:?}.")]
	Selector { css: String },
	#[error("WebDriver command failed ({error}): {message}")]
	WebDriver { error: String, message: String },
}
impl Error {
	/// Transient failures worth another attempt: timeouts, connection errors, throttling and
	/// server-side errors.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Reqwest(err) => err.is_timeout() || err.is_connect(),
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}
}
