use prior_domain::SurfaceKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures that reach the caller. Every other stage error is contained where it happens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query formulation failed: {message}")]
	QueryFormulation { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("The {family} source is disabled.")]
	SourceDisabled { family: &'static str },
	#[error("The request was cancelled.")]
	Cancelled,
}

/// A search surface could not produce results. The orchestrator degrades it to zero candidates.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
	#[error("{surface} is unavailable: {message}")]
	Unavailable { surface: SurfaceKind, message: String },
	#[error("{surface} search was cancelled.")]
	Cancelled { surface: SurfaceKind },
}

/// One result node could not be turned into a candidate. The harvester skips the node.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
	#[error("Result node has no {field}.")]
	MissingField { field: &'static str },
	#[error("Unrecognized document identifier {raw:?}.")]
	UnrecognizedId { raw: String },
	#[error(transparent)]
	Browser(#[from] prior_providers::Error),
}

/// A candidate could not be resolved. The orchestrator drops the candidate.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
	#[error("Record for {canonical_id} has no title.")]
	MissingTitle { canonical_id: String },
	#[error("No record exists for {canonical_id}.")]
	NotFound { canonical_id: String },
	#[error("Failed to fetch the record for {canonical_id}: {message}")]
	Fetch { canonical_id: String, message: String },
	#[error("{surface} candidates cannot be resolved here ({canonical_id}).")]
	Unsupported { canonical_id: String, surface: SurfaceKind },
}
impl ResolutionError {
	pub(crate) fn from_provider(canonical_id: &str, err: prior_providers::Error) -> Self {
		match err {
			prior_providers::Error::NotFound { .. } => {
				Self::NotFound { canonical_id: canonical_id.to_string() }
			},
			other => Self::Fetch { canonical_id: canonical_id.to_string(), message: other.to_string() },
		}
	}
}
