//! A scripted, in-memory result feed standing in for a WebDriver session.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use prior_service::{BoxFuture, BrowserLauncher, BrowserSession, ElementId, Locator, harvest::HarvestRecipe};

const INPUT_ID: &str = "search-input";
const FIRST_RESULT_ID: &str = "first-result";
const NODE_PREFIX: &str = "node-";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeNode {
	pub text: String,
	pub attributes: HashMap<String, String>,
}
impl FakeNode {
	pub fn text(text: &str) -> Self {
		Self { text: text.to_string(), attributes: HashMap::new() }
	}

	pub fn attr(name: &str, value: &str) -> Self {
		Self::default().with_attr(name, value)
	}

	pub fn with_attr(mut self, name: &str, value: &str) -> Self {
		self.attributes.insert(name.to_string(), value.to_string());

		self
	}
}

/// What the page renders: `initial` result nodes after submission and `per_scroll` more after
/// each scroll, up to the scripted nodes. An endless feed keeps growing with synthetic nodes.
#[derive(Debug, Clone)]
pub struct FakeFeed {
	recipe: HarvestRecipe,
	nodes: Vec<FakeNode>,
	initial: usize,
	per_scroll: usize,
	endless: bool,
	search_ready: bool,
	results_ready: bool,
}
impl FakeFeed {
	pub fn new(recipe: HarvestRecipe, nodes: Vec<FakeNode>) -> Self {
		Self {
			recipe,
			nodes,
			initial: 1,
			per_scroll: 1,
			endless: false,
			search_ready: true,
			results_ready: true,
		}
	}

	pub fn paged(mut self, initial: usize, per_scroll: usize) -> Self {
		self.initial = initial;
		self.per_scroll = per_scroll;

		self
	}

	pub fn endless(mut self) -> Self {
		self.endless = true;

		self
	}

	pub fn search_never_ready(mut self) -> Self {
		self.search_ready = false;

		self
	}

	pub fn results_never_render(mut self) -> Self {
		self.results_ready = false;

		self
	}

	fn rendered(&self, scrolls: usize) -> usize {
		let grown = self.initial + scrolls * self.per_scroll;

		if self.endless { grown } else { grown.min(self.nodes.len()) }
	}

	fn node(&self, index: usize) -> FakeNode {
		self.nodes
			.get(index)
			.cloned()
			.unwrap_or_else(|| FakeNode::text(&format!("{}", 9_000_000 + index)))
	}
}

/// Open/close counters shared by every session a launcher opens.
#[derive(Debug, Default)]
pub struct BrowserStats {
	pub opened: AtomicUsize,
	pub closed: AtomicUsize,
	pub open_now: AtomicUsize,
	pub peak_open: AtomicUsize,
	pub scrolls: AtomicUsize,
}
impl BrowserStats {
	fn on_open(&self) {
		self.opened.fetch_add(1, Ordering::SeqCst);

		let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;

		self.peak_open.fetch_max(now, Ordering::SeqCst);
	}

	fn on_close(&self) {
		self.closed.fetch_add(1, Ordering::SeqCst);
		self.open_now.fetch_sub(1, Ordering::SeqCst);
	}
}

pub struct FakeBrowser {
	feed: FakeFeed,
	stats: Arc<BrowserStats>,
	submitted: Mutex<Option<String>>,
	scrolls: AtomicUsize,
}
impl FakeBrowser {
	pub fn new(feed: FakeFeed) -> Self {
		Self::with_stats(feed, Arc::new(BrowserStats::default()))
	}

	fn with_stats(feed: FakeFeed, stats: Arc<BrowserStats>) -> Self {
		stats.on_open();

		Self { feed, stats, submitted: Mutex::new(None), scrolls: AtomicUsize::new(0) }
	}

	pub fn stats(&self) -> Arc<BrowserStats> {
		self.stats.clone()
	}

	/// The text typed into the search input, once submitted.
	pub fn submitted(&self) -> Option<String> {
		self.submitted.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn matches(&self, locator: &Locator) -> Vec<ElementId> {
		let submitted = self.submitted().is_some();

		if *locator == self.feed.recipe.search_input {
			return if self.feed.search_ready {
				vec![ElementId(INPUT_ID.to_string())]
			} else {
				Vec::new()
			};
		}
		if *locator == self.feed.recipe.result_items {
			if !submitted || !self.feed.results_ready {
				return Vec::new();
			}

			let count = self.feed.rendered(self.scrolls.load(Ordering::SeqCst));

			return (0..count).map(|index| ElementId(format!("{NODE_PREFIX}{index}"))).collect();
		}
		if *locator == self.feed.recipe.first_result && submitted && self.feed.results_ready {
			return vec![ElementId(FIRST_RESULT_ID.to_string())];
		}

		Vec::new()
	}

	fn node(&self, element: &ElementId) -> prior_providers::Result<FakeNode> {
		element
			.0
			.strip_prefix(NODE_PREFIX)
			.and_then(|index| index.parse::<usize>().ok())
			.map(|index| self.feed.node(index))
			.ok_or_else(|| prior_providers::Error::WebDriver {
				error: "stale element reference".to_string(),
				message: format!("Unknown element {}.", element.0),
			})
	}
}

impl BrowserSession for FakeBrowser {
	fn navigate<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, prior_providers::Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn find_all<'a>(
		&'a self,
		locator: &'a Locator,
	) -> BoxFuture<'a, prior_providers::Result<Vec<ElementId>>> {
		let found = self.matches(locator);

		Box::pin(async move { Ok(found) })
	}

	fn attribute<'a>(
		&'a self,
		element: &'a ElementId,
		name: &'a str,
	) -> BoxFuture<'a, prior_providers::Result<Option<String>>> {
		let value = self.node(element).map(|node| node.attributes.get(name).cloned());

		Box::pin(async move { value })
	}

	fn text<'a>(&'a self, element: &'a ElementId) -> BoxFuture<'a, prior_providers::Result<String>> {
		let text = self.node(element).map(|node| node.text);

		Box::pin(async move { text })
	}

	fn send_keys<'a>(
		&'a self,
		_element: &'a ElementId,
		text: &'a str,
		_submit: bool,
	) -> BoxFuture<'a, prior_providers::Result<()>> {
		*self.submitted.lock().unwrap_or_else(|err| err.into_inner()) = Some(text.to_string());

		Box::pin(async { Ok(()) })
	}

	fn scroll_to_bottom(&self) -> BoxFuture<'_, prior_providers::Result<()>> {
		self.scrolls.fetch_add(1, Ordering::SeqCst);
		self.stats.scrolls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(()) })
	}

	fn close(self: Box<Self>) -> BoxFuture<'static, prior_providers::Result<()>> {
		self.stats.on_close();

		Box::pin(async { Ok(()) })
	}
}

/// Opens a fresh [`FakeBrowser`] over the same feed on every call.
pub struct FakeLauncher {
	feed: FakeFeed,
	stats: Arc<BrowserStats>,
	open_delay: Duration,
}
impl FakeLauncher {
	pub fn new(feed: FakeFeed) -> Self {
		Self { feed, stats: Arc::new(BrowserStats::default()), open_delay: Duration::ZERO }
	}

	/// Holds each session open a little longer so overlapping harvests are observable.
	pub fn with_open_delay(mut self, delay: Duration) -> Self {
		self.open_delay = delay;

		self
	}

	pub fn stats(&self) -> Arc<BrowserStats> {
		self.stats.clone()
	}
}

impl BrowserLauncher for FakeLauncher {
	fn open(&self) -> BoxFuture<'_, prior_providers::Result<Box<dyn BrowserSession>>> {
		Box::pin(async move {
			let session = FakeBrowser::with_stats(self.feed.clone(), self.stats.clone());

			tokio::time::sleep(self.open_delay).await;

			Ok(Box::new(session) as Box<dyn BrowserSession>)
		})
	}
}
