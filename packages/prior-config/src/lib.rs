mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AcademicSource, Browser, Concurrency, Config, LlmProviderConfig, Multiplex, PATENT_SURFACES,
	PRIOR_ART_MODES, PatentSource, Pipeline, PriorArt, Providers, QueryFormulation,
	RECORD_SOURCES, RunPolicy, Scoring, Service, Sources,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(validation("service.http_bind must be non-empty."));
	}
	if cfg.service.request_timeout_ms == 0 {
		return Err(validation("service.request_timeout_ms must be greater than zero."));
	}

	let llm = &cfg.providers.llm;

	for (label, value) in [
		("providers.llm.api_base", &llm.api_base),
		("providers.llm.api_key", &llm.api_key),
		("providers.llm.model", &llm.model),
	] {
		if value.trim().is_empty() {
			return Err(validation(format!("{label} must be non-empty.")));
		}
	}

	if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
		return Err(validation("providers.llm.temperature must be in the range 0.0-2.0."));
	}
	if llm.max_output_tokens == 0 {
		return Err(validation("providers.llm.max_output_tokens must be greater than zero."));
	}
	if llm.timeout_ms == 0 {
		return Err(validation("providers.llm.timeout_ms must be greater than zero."));
	}

	for (label, value) in llm.default_headers.iter() {
		if !value.is_string() {
			return Err(validation(format!(
				"providers.llm.default_headers.{label} must be a string."
			)));
		}
	}

	let academic = &cfg.sources.academic;
	let patent = &cfg.sources.patent;

	if !academic.enabled && !patent.enabled {
		return Err(validation("At least one of sources.academic or sources.patent must be enabled."));
	}
	if academic.enabled {
		if academic.api_base.trim().is_empty() {
			return Err(validation("sources.academic.api_base must be non-empty."));
		}
		if academic.page_size == 0 {
			return Err(validation("sources.academic.page_size must be greater than zero."));
		}
	}
	if patent.enabled {
		if patent.surfaces.is_empty() {
			return Err(validation(
				"sources.patent.surfaces must be non-empty when the patent source is enabled.",
			));
		}

		for surface in &patent.surfaces {
			expect_one_of("sources.patent.surfaces", surface, &PATENT_SURFACES)?;
		}

		expect_one_of("sources.patent.record_source", &patent.record_source, &RECORD_SOURCES)?;

		if cfg.browser.webdriver_url.trim().is_empty() {
			return Err(validation("browser.webdriver_url must be non-empty."));
		}
	}

	let browser = &cfg.browser;

	if browser.max_sessions == 0 {
		return Err(validation("browser.max_sessions must be greater than zero."));
	}
	if browser.max_iterations == 0 {
		return Err(validation("browser.max_iterations must be greater than zero."));
	}
	if browser.ready_timeout_ms == 0 {
		return Err(validation("browser.ready_timeout_ms must be greater than zero."));
	}
	if browser.poll_interval_ms == 0 {
		return Err(validation("browser.poll_interval_ms must be greater than zero."));
	}

	let pipeline = &cfg.pipeline;

	if pipeline.query.compress_target_words == 0 {
		return Err(validation("pipeline.query.compress_target_words must be greater than zero."));
	}
	if pipeline.multiplex.enabled && pipeline.multiplex.count == 0 {
		return Err(validation(
			"pipeline.multiplex.count must be greater than zero when multiplexing is enabled.",
		));
	}

	for (label, workers) in [
		("pipeline.concurrency.search_workers", pipeline.concurrency.search_workers),
		("pipeline.concurrency.resolve_workers", pipeline.concurrency.resolve_workers),
		("pipeline.concurrency.score_workers", pipeline.concurrency.score_workers),
	] {
		if workers == 0 {
			return Err(validation(format!("{label} must be greater than zero.")));
		}
	}

	expect_one_of("pipeline.prior_art.mode", &pipeline.prior_art.mode, &PRIOR_ART_MODES)?;

	for (label, policy) in [("pipeline.papers", &pipeline.papers), ("pipeline.patents", &pipeline.patents)]
	{
		if policy.default_max_results == Some(0) {
			return Err(validation(format!(
				"{label}.default_max_results must be greater than zero when set."
			)));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for base in [
		&mut cfg.providers.llm.api_base,
		&mut cfg.sources.academic.api_base,
		&mut cfg.sources.patent.fpo_base,
		&mut cfg.sources.patent.google_base,
		&mut cfg.sources.patent.web_search_base,
		&mut cfg.browser.webdriver_url,
	] {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}

	for surface in cfg.sources.patent.surfaces.iter_mut() {
		*surface = surface.trim().to_ascii_lowercase();
	}

	let mut seen = Vec::new();

	cfg.sources.patent.surfaces.retain(|surface| {
		if seen.contains(surface) {
			return false;
		}

		seen.push(surface.clone());

		true
	});
	cfg.sources.patent.record_source = cfg.sources.patent.record_source.trim().to_ascii_lowercase();
	cfg.pipeline.prior_art.mode = cfg.pipeline.prior_art.mode.trim().to_ascii_lowercase();
}

fn expect_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
	if allowed.contains(&value) {
		return Ok(());
	}

	Err(Error::UnknownOption {
		field: field.to_string(),
		value: value.to_string(),
		allowed: allowed.join(", "),
	})
}

fn validation(message: impl Into<String>) -> Error {
	Error::Validation { message: message.into() }
}
