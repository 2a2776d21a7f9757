//! OpenAI-compatible chat completion client used for every text-generation call.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::{Error, Result};

/// One text-generation request. Model and sampling defaults come from the provider config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
	pub system: Option<String>,
	pub prompt: String,
	/// Hosted document (for example a PDF) sent alongside the prompt.
	pub attachment_url: Option<String>,
	pub temperature: Option<f32>,
	pub max_output_tokens: Option<u32>,
}
impl CompletionRequest {
	pub fn new(prompt: impl Into<String>) -> Self {
		Self { prompt: prompt.into(), ..Default::default() }
	}

	pub fn with_system(mut self, system: impl Into<String>) -> Self {
		self.system = Some(system.into());

		self
	}

	pub fn with_attachment(mut self, url: Option<String>) -> Self {
		self.attachment_url = url;

		self
	}

	pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
		self.max_output_tokens = Some(max_output_tokens);

		self
	}
}

/// `client` is shared across calls; the provider timeout is applied per request.
pub async fn complete(
	client: &Client,
	cfg: &prior_config::LlmProviderConfig,
	request: &CompletionRequest,
) -> Result<String> {
	let timeout = Duration::from_millis(cfg.timeout_ms);
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_body(cfg, request);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let mut attempt = 0;

	loop {
		let outcome: Result<String> = async {
			let res = client
				.post(&url)
				.timeout(timeout)
				.headers(headers.clone())
				.json(&body)
				.send()
				.await?;
			let json: Value = crate::check_status(res)?.json().await?;

			parse_completion(&json)
		}
		.await;

		match outcome {
			Err(err) if err.is_retryable() && attempt < cfg.max_retries => {
				let backoff = cfg.retry_backoff_ms.saturating_mul(1_u64 << attempt.min(10));

				warn!(
					error = %err,
					attempt = attempt + 1,
					backoff_ms = backoff,
					provider_id = %cfg.provider_id,
					"Completion request failed; retrying."
				);
				tokio::time::sleep(Duration::from_millis(backoff)).await;

				attempt += 1;
			},
			other => return other,
		}
	}
}

fn build_body(cfg: &prior_config::LlmProviderConfig, request: &CompletionRequest) -> Value {
	let mut messages = Vec::with_capacity(2);

	if let Some(system) = request.system.as_deref() {
		messages.push(serde_json::json!({ "role": "system", "content": system }));
	}

	let user_content = match request.attachment_url.as_deref() {
		Some(url) => serde_json::json!([
			{ "type": "document", "source": { "type": "url", "url": url } },
			{ "type": "text", "text": request.prompt },
		]),
		None => Value::String(request.prompt.clone()),
	};

	messages.push(serde_json::json!({ "role": "user", "content": user_content }));

	serde_json::json!({
		"model": cfg.model,
		"temperature": request.temperature.unwrap_or(cfg.temperature),
		"max_tokens": request.max_output_tokens.unwrap_or(cfg.max_output_tokens),
		"messages": messages,
	})
}

fn parse_completion(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing choices[0].message.content.".to_string(),
		})?;

	match content {
		Value::String(text) => Ok(text.clone()),
		Value::Array(parts) => Ok(parts
			.iter()
			.filter_map(|part| part.get("text").and_then(Value::as_str))
			.collect::<Vec<_>>()
			.join("")),
		Value::Null => Ok(String::new()),
		_ => Err(Error::InvalidResponse {
			message: "Completion content is neither text nor a list of parts.".to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_string_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "ti:touchscreen AND abs:unlock" } }]
		});

		assert_eq!(parse_completion(&json).expect("parse failed"), "ti:touchscreen AND abs:unlock");
	}

	#[test]
	fn joins_text_parts() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": [
				{ "type": "text", "text": "0." },
				{ "type": "text", "text": "8" }
			] } }]
		});

		assert_eq!(parse_completion(&json).expect("parse failed"), "0.8");
	}

	#[test]
	fn missing_choices_is_invalid() {
		let json = serde_json::json!({ "error": "overloaded" });

		assert!(matches!(parse_completion(&json), Err(Error::InvalidResponse { .. })));
	}
}
