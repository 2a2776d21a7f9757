//! Browser sessions for scraped surfaces.
//!
//! A session is never shared: each harvest opens its own through the [`SessionPool`], which caps
//! how many run at once, and closes it when the harvest ends.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use prior_config::Browser;
use prior_providers::webdriver::WebDriverSession;

use crate::{BoxFuture, BrowserLauncher, BrowserSession, ElementId, Locator};

pub struct WebDriverLauncher {
	cfg: Browser,
}
impl WebDriverLauncher {
	pub fn new(cfg: Browser) -> Self {
		Self { cfg }
	}
}

impl BrowserLauncher for WebDriverLauncher {
	fn open(&self) -> BoxFuture<'_, prior_providers::Result<Box<dyn BrowserSession>>> {
		Box::pin(async move {
			let session = WebDriverSession::start(&self.cfg).await?;

			Ok(Box::new(WebDriverBrowser { session }) as Box<dyn BrowserSession>)
		})
	}
}

struct WebDriverBrowser {
	session: WebDriverSession,
}

impl BrowserSession for WebDriverBrowser {
	fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, prior_providers::Result<()>> {
		Box::pin(self.session.navigate(url))
	}

	fn find_all<'a>(
		&'a self,
		locator: &'a Locator,
	) -> BoxFuture<'a, prior_providers::Result<Vec<ElementId>>> {
		Box::pin(self.session.find_all(locator))
	}

	fn attribute<'a>(
		&'a self,
		element: &'a ElementId,
		name: &'a str,
	) -> BoxFuture<'a, prior_providers::Result<Option<String>>> {
		Box::pin(self.session.attribute(element, name))
	}

	fn text<'a>(&'a self, element: &'a ElementId) -> BoxFuture<'a, prior_providers::Result<String>> {
		Box::pin(self.session.text(element))
	}

	fn send_keys<'a>(
		&'a self,
		element: &'a ElementId,
		text: &'a str,
		submit: bool,
	) -> BoxFuture<'a, prior_providers::Result<()>> {
		Box::pin(self.session.send_keys(element, text, submit))
	}

	fn scroll_to_bottom(&self) -> BoxFuture<'_, prior_providers::Result<()>> {
		Box::pin(self.session.scroll_to_bottom())
	}

	fn close(self: Box<Self>) -> BoxFuture<'static, prior_providers::Result<()>> {
		Box::pin(self.session.quit())
	}
}

/// Bounds concurrent browser sessions across every scraped adapter.
#[derive(Clone)]
pub struct SessionPool {
	launcher: Arc<dyn BrowserLauncher>,
	permits: Arc<Semaphore>,
}
impl SessionPool {
	pub fn new(launcher: Arc<dyn BrowserLauncher>, max_sessions: u32) -> Self {
		Self { launcher, permits: Arc::new(Semaphore::new(max_sessions.max(1) as usize)) }
	}

	/// Waits for a free slot, then opens a fresh session in it.
	pub async fn acquire(&self) -> prior_providers::Result<PooledSession> {
		let permit = self.permits.clone().acquire_owned().await.map_err(|_| {
			prior_providers::Error::InvalidConfig { message: "Browser pool is closed.".to_string() }
		})?;
		let session = self.launcher.open().await?;

		Ok(PooledSession { session: Some(session), permit: Some(permit) })
	}

	pub fn available(&self) -> usize {
		self.permits.available_permits()
	}
}

/// A session holding one pool slot until it is released.
///
/// Dropping it without `release` still closes the session on a spawned task, which keeps the
/// slot until the close finishes.
pub struct PooledSession {
	session: Option<Box<dyn BrowserSession>>,
	permit: Option<OwnedSemaphorePermit>,
}
impl PooledSession {
	/// `None` only once the session was handed back.
	pub fn session(&self) -> Option<&dyn BrowserSession> {
		self.session.as_deref()
	}

	/// Closes the session, then frees the slot.
	pub async fn release(mut self) {
		if let Some(session) = self.session.take() {
			log_close(session.close().await);
		}
	}
}

impl Drop for PooledSession {
	fn drop(&mut self) {
		let Some(session) = self.session.take() else {
			return;
		};
		let permit = self.permit.take();
		let closing = session.close();

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(async move {
					log_close(closing.await);
					drop(permit);
				});
			},
			Err(_) => warn!("Browser session dropped outside a runtime; its close was not awaited."),
		}
	}
}

fn log_close(result: prior_providers::Result<()>) {
	if let Err(err) = result {
		warn!(error = %err, "Failed to close browser session.");
	}
}
