//! Minimal W3C WebDriver client.
//!
//! Only the commands the harvester needs are exposed. A session is owned by exactly one caller;
//! `quit` consumes it.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ENTER_KEY: char = '\u{E007}';
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
	Css(String),
	XPath(String),
	/// Form controls addressed by their `name` attribute.
	Name(String),
}
impl Locator {
	fn strategy(&self) -> (&'static str, String) {
		match self {
			Self::Css(css) => ("css selector", css.clone()),
			Self::XPath(xpath) => ("xpath", xpath.clone()),
			Self::Name(name) => ("css selector", format!(r#"[name="{name}"]"#)),
		}
	}
}

/// Opaque element reference, valid only within the session that returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

pub struct WebDriverSession {
	client: Client,
	base: String,
	session_id: String,
}
impl WebDriverSession {
	pub async fn start(cfg: &prior_config::Browser) -> Result<Self> {
		let client = Client::builder().timeout(COMMAND_TIMEOUT).build()?;
		let base = cfg.webdriver_url.clone();
		let mut args = vec!["--window-size=1280,2000"];

		if cfg.headless {
			args.push("--headless=new");
		}

		let body = serde_json::json!({
			"capabilities": {
				"alwaysMatch": {
					"browserName": "chrome",
					"goog:chromeOptions": { "args": args },
				}
			}
		});
		let value = send(&client, Method::POST, &format!("{base}/session"), Some(body)).await?;
		let session_id = value
			.get("sessionId")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::InvalidResponse {
				message: "New session response is missing sessionId.".to_string(),
			})?
			.to_string();

		debug!(session_id = %session_id, "Started WebDriver session.");

		Ok(Self { client, base, session_id })
	}

	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	pub async fn navigate(&self, url: &str) -> Result<()> {
		self.command(Method::POST, "url", Some(serde_json::json!({ "url": url }))).await?;

		Ok(())
	}

	/// Every element currently matching `locator`, in document order. No match is an empty list.
	pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementId>> {
		let (using, value) = locator.strategy();
		let found = self
			.command(
				Method::POST,
				"elements",
				Some(serde_json::json!({ "using": using, "value": value })),
			)
			.await?;
		let Some(items) = found.as_array() else {
			return Err(Error::InvalidResponse {
				message: "Find elements response is not an array.".to_string(),
			});
		};

		Ok(items
			.iter()
			.filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
			.map(|id| ElementId(id.to_string()))
			.collect())
	}

	pub async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
		let value = self
			.command(Method::GET, &format!("element/{}/attribute/{name}", element.0), None)
			.await?;

		Ok(value.as_str().map(str::to_string))
	}

	pub async fn text(&self, element: &ElementId) -> Result<String> {
		let value = self.command(Method::GET, &format!("element/{}/text", element.0), None).await?;

		Ok(value.as_str().unwrap_or_default().to_string())
	}

	/// Types `text` into the element, optionally followed by Enter.
	pub async fn send_keys(&self, element: &ElementId, text: &str, submit: bool) -> Result<()> {
		let mut keys = text.to_string();

		if submit {
			keys.push(ENTER_KEY);
		}

		self.command(
			Method::POST,
			&format!("element/{}/value", element.0),
			Some(serde_json::json!({ "text": keys })),
		)
		.await?;

		Ok(())
	}

	pub async fn scroll_to_bottom(&self) -> Result<()> {
		self.command(
			Method::POST,
			"execute/sync",
			Some(serde_json::json!({
				"script": "window.scrollTo(0, document.body.scrollHeight);",
				"args": [],
			})),
		)
		.await?;

		Ok(())
	}

	pub async fn quit(self) -> Result<()> {
		let url = format!("{}/session/{}", self.base, self.session_id);

		send(&self.client, Method::DELETE, &url, None).await?;

		debug!(session_id = %self.session_id, "Closed WebDriver session.");

		Ok(())
	}

	async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
		let url = format!("{}/session/{}/{path}", self.base, self.session_id);

		send(&self.client, method, &url, body).await
	}
}

/// Sends one command and unwraps the `value` member of the reply.
async fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
	let mut req = client.request(method, url);

	if let Some(body) = body {
		req = req.json(&body);
	}

	let res = req.send().await?;
	let status = res.status();
	let json: Value = res.json().await?;
	let value = json.get("value").cloned().unwrap_or(Value::Null);

	if let Some(error) = value.get("error").and_then(Value::as_str) {
		let message = value.get("message").and_then(Value::as_str).unwrap_or_default();

		return Err(Error::WebDriver { error: error.to_string(), message: message.to_string() });
	}
	if !status.is_success() {
		return Err(Error::Status { status: status.as_u16(), url: url.to_string() });
	}

	Ok(value)
}
