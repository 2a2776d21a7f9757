use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use prior_service::{CancelToken, PriorArtService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PriorArtService>,
	request_timeout: Duration,
}
impl AppState {
	pub fn new(config: prior_config::Config) -> Self {
		Self::with_service(PriorArtService::new(config))
	}

	pub fn with_service(service: PriorArtService) -> Self {
		let request_timeout = Duration::from_millis(service.cfg.service.request_timeout_ms);

		Self { service: Arc::new(service), request_timeout }
	}

	/// A cancellation token that fires once the request timeout elapses.
	pub fn deadline(&self) -> RequestDeadline {
		let cancel = CancelToken::new();
		let timer_cancel = cancel.clone();
		let timeout = self.request_timeout;
		let timer = tokio::spawn(async move {
			tokio::time::sleep(timeout).await;

			tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Request deadline reached.");

			timer_cancel.cancel();
		});

		RequestDeadline { cancel, timer }
	}
}

/// Owns the deadline timer; dropping it stops the timer.
pub struct RequestDeadline {
	pub cancel: CancelToken,
	timer: JoinHandle<()>,
}

impl Drop for RequestDeadline {
	fn drop(&mut self) {
		self.timer.abort();
	}
}
