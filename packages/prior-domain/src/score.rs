use regex::Regex;
use serde_json::Value;

const SCORE_KEYS: [&str; 3] = ["score", "relevance_score", "relevance"];
const REASONING_KEYS: [&str; 3] = ["reasoning", "rationale", "explanation"];

/// A score ready to be stored on a `ScoredResult`: clamped, with an optional rationale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVerdict {
	pub score: f32,
	pub reasoning: Option<String>,
}
impl ScoreVerdict {
	/// Parses a scorer response and never fails: a malformed response yields `0.0` with the
	/// parse failure recorded as the rationale.
	pub fn from_response(raw: &str) -> Self {
		match parse_score(raw) {
			Ok(verdict) => verdict,
			Err(err) => Self { score: 0.0, reasoning: Some(format!("Scoring failed: {err}")) },
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreParseError {
	Empty,
	MissingScore,
	NotFinite,
	Unparseable { excerpt: String },
}

impl std::fmt::Display for ScoreParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty => write!(f, "the scorer returned an empty response."),
			Self::MissingScore => write!(f, "the scorer response has no numeric score field."),
			Self::NotFinite => write!(f, "the scorer returned a non-finite score."),
			Self::Unparseable { excerpt } => {
				write!(f, "the scorer response is not a score: {excerpt:?}.")
			},
		}
	}
}

impl std::error::Error for ScoreParseError {}

/// Parses either a structured `{"score": .., "reasoning": ..}` payload or a bare numeric
/// literal. Out-of-range scores are clamped and the clamp is noted in the rationale.
pub fn parse_score(raw: &str) -> Result<ScoreVerdict, ScoreParseError> {
	let trimmed = strip_code_fence(raw.trim());

	if trimmed.is_empty() {
		return Err(ScoreParseError::Empty);
	}

	let (score, reasoning) = if let Some(value) = embedded_json(trimmed) {
		parse_structured(&value)?
	} else {
		(parse_bare(trimmed)?, None)
	};

	if !score.is_finite() {
		return Err(ScoreParseError::NotFinite);
	}

	// Clamp in f64: narrowing first turns values past `f32::MAX` into infinity.
	let clamped = score.clamp(0.0, 1.0);
	let reasoning = if clamped != score {
		let note = format!("Score {score} was outside [0, 1] and was clamped to {clamped}.");

		Some(match reasoning {
			Some(text) => format!("{text} {note}"),
			None => note,
		})
	} else {
		reasoning
	};

	Ok(ScoreVerdict { score: clamped as f32, reasoning })
}

/// Clamps into `[0, 1]`; non-finite input maps to `0.0`.
pub fn clamp_score(score: f32) -> f32 {
	if !score.is_finite() {
		return 0.0;
	}

	score.clamp(0.0, 1.0)
}

fn parse_structured(value: &Value) -> Result<(f64, Option<String>), ScoreParseError> {
	let score = SCORE_KEYS
		.iter()
		.find_map(|key| value.get(*key))
		.and_then(|raw| match raw {
			Value::Number(number) => number.as_f64(),
			Value::String(text) => text.trim().parse::<f64>().ok(),
			_ => None,
		})
		.ok_or(ScoreParseError::MissingScore)?;
	let reasoning = REASONING_KEYS
		.iter()
		.find_map(|key| value.get(*key))
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(str::to_string);

	Ok((score, reasoning))
}

fn parse_bare(text: &str) -> Result<f64, ScoreParseError> {
	if let Ok(score) = text.parse::<f64>() {
		return Ok(score);
	}

	// Tolerates a lone labelled number such as "Score: 0.7".
	let captured = Regex::new(r"(?i)^(?:relevance\s+)?(?:score)?\s*[:=]?\s*(-?\d+(?:\.\d+)?)\s*\.?$")
		.ok()
		.and_then(|re| re.captures(text))
		.and_then(|caps| caps.get(1))
		.and_then(|found| found.as_str().parse::<f64>().ok());

	captured.ok_or_else(|| ScoreParseError::Unparseable { excerpt: excerpt(text) })
}

fn embedded_json(text: &str) -> Option<Value> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	if end <= start {
		return None;
	}

	serde_json::from_str::<Value>(&text[start..=end]).ok().filter(Value::is_object)
}

fn strip_code_fence(text: &str) -> &str {
	let Some(rest) = text.strip_prefix("```") else {
		return text;
	};
	let rest = rest.trim_start_matches(|ch: char| ch.is_ascii_alphabetic());

	rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn excerpt(text: &str) -> String {
	text.chars().take(80).collect()
}
