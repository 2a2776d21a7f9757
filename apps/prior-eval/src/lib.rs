use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use prior_domain::{canonical_arxiv_id, canonical_patent_id};
use prior_service::{CancelToken, PaperSearchRequest, PatentSearchRequest, PriorArtService};

#[derive(Debug, Parser)]
#[command(
	version = prior_cli::VERSION,
	rename_all = "kebab",
	styles = prior_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// Only run cases flagged as demo cases.
	#[arg(long)]
	pub demo_only: bool,
	/// Caps each case's result list; the configured default applies otherwise.
	#[arg(long, value_name = "N")]
	pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EvalDataset {
	pub name: Option<String>,
	pub cases: Vec<EvalCase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
	Patent,
	Paper,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvalCase {
	pub id: String,
	pub title: String,
	pub kind: CaseKind,
	#[serde(default)]
	pub demo: bool,
	pub input: String,
	pub ground_truth: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EvalOutput {
	pub dataset: EvalDatasetInfo,
	pub summary: EvalSummary,
	pub cases: Vec<CaseReport>,
}

#[derive(Debug, Serialize)]
pub struct EvalDatasetInfo {
	pub name: String,
	pub case_count: usize,
	pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct EvalSummary {
	pub passed_count: usize,
	/// Percentage of cases whose output contained every ground-truth id.
	pub pass_rate: f64,
	pub avg_recall: f64,
	pub mean_rr: f64,
	pub latency_ms_p50: f64,
	pub latency_ms_p95: f64,
	pub failed_case_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CaseReport {
	pub id: String,
	pub title: String,
	pub kind: CaseKind,
	pub passed: bool,
	pub recall: f64,
	pub rr: f64,
	pub latency_ms: f64,
	pub expected_ids: Vec<String>,
	pub retrieved_ids: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

struct Metrics {
	passed: bool,
	recall: f64,
	rr: f64,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = prior_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let mut dataset = load_dataset(&args.dataset)?;

	if args.demo_only {
		dataset.cases.retain(|case| case.demo);
	}

	let service = PriorArtService::new(config);
	let output = evaluate(&service, &dataset, args.max_results).await;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

pub fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	if dataset.cases.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one case."));
	}

	Ok(dataset)
}

/// Runs every case in order. A case whose search fails is reported as failed, not skipped.
pub async fn evaluate(
	service: &PriorArtService,
	dataset: &EvalDataset,
	max_results: Option<u32>,
) -> EvalOutput {
	let mut reports = Vec::with_capacity(dataset.cases.len());

	for case in &dataset.cases {
		let expected_ids = unique_ids(
			case.ground_truth.iter().filter_map(|id| canonical_id(case.kind, id)),
		);
		let started = Instant::now();
		let outcome = search_case(service, case, max_results).await;
		let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
		let (retrieved_ids, error) = match outcome {
			Ok(ids) => (ids, None),
			Err(err) => {
				tracing::warn!(case_id = %case.id, error = %err, "Evaluation case failed to run.");

				(Vec::new(), Some(err.to_string()))
			},
		};
		let metrics = compute_metrics(&retrieved_ids, &expected_ids);

		tracing::info!(case_id = %case.id, passed = metrics.passed, latency_ms, "Case finished.");

		reports.push(CaseReport {
			id: case.id.clone(),
			title: case.title.clone(),
			kind: case.kind,
			passed: metrics.passed && error.is_none(),
			recall: metrics.recall,
			rr: metrics.rr,
			latency_ms,
			expected_ids,
			retrieved_ids,
			error,
		});
	}

	let latencies: Vec<f64> = reports.iter().map(|report| report.latency_ms).collect();
	let summary = summarize(&reports, &latencies);
	let generated_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

	EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "unnamed".to_string()),
			case_count: reports.len(),
			generated_at,
		},
		summary,
		cases: reports,
	}
}

async fn search_case(
	service: &PriorArtService,
	case: &EvalCase,
	max_results: Option<u32>,
) -> prior_service::Result<Vec<String>> {
	let cancel = CancelToken::new();
	let ids = match case.kind {
		CaseKind::Patent => service
			.search_patents(
				PatentSearchRequest { description: case.input.clone(), max_results },
				&cancel,
			)
			.await?
			.into_iter()
			.map(|result| result.id)
			.collect::<Vec<_>>(),
		CaseKind::Paper => service
			.search_papers(
				PaperSearchRequest { description: case.input.clone(), max_papers: max_results },
				&cancel,
			)
			.await?
			.into_iter()
			.filter_map(|paper| canonical_arxiv_id(&paper.paper_id))
			.collect(),
	};

	Ok(unique_ids(ids.into_iter()))
}

fn canonical_id(kind: CaseKind, raw: &str) -> Option<String> {
	match kind {
		CaseKind::Patent => canonical_patent_id(raw),
		CaseKind::Paper => canonical_arxiv_id(raw),
	}
}

fn unique_ids<I>(iter: I) -> Vec<String>
where
	I: Iterator<Item = String>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for id in iter {
		if seen.insert(id.clone()) {
			out.push(id);
		}
	}

	out
}

fn compute_metrics(retrieved: &[String], expected: &[String]) -> Metrics {
	let expected: HashSet<&str> = expected.iter().map(String::as_str).collect();
	let hits = retrieved.iter().filter(|id| expected.contains(id.as_str())).count();
	let first_hit = retrieved.iter().position(|id| expected.contains(id.as_str()));
	let rr = first_hit.map_or(0.0, |idx| 1.0 / (idx + 1) as f64);
	let recall = if expected.is_empty() { 0.0 } else { hits as f64 / expected.len() as f64 };

	Metrics { passed: !expected.is_empty() && hits == expected.len(), recall, rr }
}

fn summarize(reports: &[CaseReport], latencies_ms: &[f64]) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let passed_count = reports.iter().filter(|report| report.passed).count();
	let avg_recall = reports.iter().map(|report| report.recall).sum::<f64>() / count;
	let mean_rr = reports.iter().map(|report| report.rr).sum::<f64>() / count;
	let failed_case_ids =
		reports.iter().filter(|report| !report.passed).map(|report| report.id.clone()).collect();
	let mut sorted = latencies_ms.to_vec();

	sorted.sort_by(f64::total_cmp);

	EvalSummary {
		passed_count,
		pass_rate: passed_count as f64 / count * 100.0,
		avg_recall,
		mean_rr,
		latency_ms_p50: percentile(&sorted, 0.50),
		latency_ms_p95: percentile(&sorted, 0.95),
		failed_case_ids,
	}
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}
