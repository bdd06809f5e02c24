use reqwest::Method;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::driver::element::{ElementPredicate, ElementType, ScreenElement, TextMatch};
use crate::driver::error::DriverError;
use crate::driver::query::{ClickOutcome, ElementQuery};

/// W3C WebDriver key under which element references are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver error codes that mean "the element cannot take the tap right now".
const NOT_INTERACTABLE_ERRORS: [&str; 4] = [
    "element not interactable",
    "element click intercepted",
    "stale element reference",
    "no such element",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
}

/// Connection settings for an Appium server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub platform: Platform,

    /// Attach to an already running session instead of creating one
    #[serde(default)]
    pub session_id: Option<String>,

    /// Capabilities sent when creating a session
    #[serde(default)]
    pub capabilities: Map<String, Value>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            platform: Platform::default(),
            session_id: None,
            capabilities: Map::new(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:4723".to_string()
}

/// Element lookup strategy and expression, as sent to `/elements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub using: &'static str,
    pub value: String,
}

/// Request bodies sent to the Appium server.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WireRequest {
    NewSession { capabilities: Value },
    FindElements { using: &'static str, value: String },
    Execute { script: String, args: Vec<Value> },
    Empty {},
}

impl WireRequest {
    pub fn new_session(platform: Platform, capabilities: &Map<String, Value>) -> Self {
        let mut always_match = capabilities.clone();
        always_match
            .entry("platformName")
            .or_insert_with(|| json!(platform_name(platform)));
        always_match
            .entry("appium:automationName")
            .or_insert_with(|| json!(automation_name(platform)));

        WireRequest::NewSession {
            capabilities: json!({ "alwaysMatch": always_match }),
        }
    }

    pub fn find(locator: &Locator) -> Self {
        WireRequest::FindElements {
            using: locator.using,
            value: locator.value.clone(),
        }
    }

    pub fn execute(script: &str, args: Value) -> Self {
        WireRequest::Execute {
            script: script.to_string(),
            args: vec![args],
        }
    }
}

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub value: Value,
}

impl WireResponse {
    /// The WebDriver error code, if the payload is an error object.
    pub fn error(&self) -> Option<&str> {
        self.value.get("error").and_then(Value::as_str)
    }

    pub fn message(&self) -> &str {
        self.value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct WireRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn platform_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "iOS",
        Platform::Android => "Android",
    }
}

fn automation_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "XCUITest",
        Platform::Android => "UiAutomator2",
    }
}

fn class_name(platform: Platform, element_type: ElementType) -> Option<&'static str> {
    match (platform, element_type) {
        (Platform::Ios, ElementType::StaticText) => Some("XCUIElementTypeStaticText"),
        (Platform::Ios, ElementType::Button) => Some("XCUIElementTypeButton"),
        (Platform::Ios, ElementType::TextField) => Some("XCUIElementTypeTextField"),
        (Platform::Android, ElementType::StaticText) => Some("android.widget.TextView"),
        (Platform::Android, ElementType::Button) => Some("android.widget.Button"),
        (Platform::Android, ElementType::TextField) => Some("android.widget.EditText"),
        (_, ElementType::Other) => None,
    }
}

/// Map a platform class name back to an element type.
pub fn element_type_for(platform: Platform, name: &str) -> ElementType {
    [ElementType::StaticText, ElementType::Button, ElementType::TextField]
        .into_iter()
        .find(|t| class_name(platform, *t) == Some(name))
        .unwrap_or(ElementType::Other)
}

fn ios_quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// XPath 1.0 string literal for `text`. Text holding both quote kinds has
/// no literal form and becomes a `concat(...)` of single-quoted runs.
pub fn xpath_quote(text: &str) -> String {
    match (text.contains('\''), text.contains('"')) {
        (false, _) => format!("'{}'", text),
        (true, false) => format!("\"{}\"", text),
        (true, true) => {
            let mut parts = Vec::new();
            for (i, run) in text.split('\'').enumerate() {
                if i > 0 {
                    parts.push("\"'\"".to_string());
                }
                if !run.is_empty() {
                    parts.push(format!("'{}'", run));
                }
            }
            format!("concat({})", parts.join(","))
        }
    }
}

fn ios_text_clause(text: &TextMatch) -> String {
    match text {
        TextMatch::Exact(t) => format!("label == {}", ios_quote(t)),
        TextMatch::Contains(t) => format!("label CONTAINS {}", ios_quote(t)),
    }
}

/// Translate a predicate into a native locator for `platform`.
pub fn locator_for(platform: Platform, predicate: &ElementPredicate) -> Locator {
    match platform {
        Platform::Ios => {
            let mut clauses = Vec::new();
            if let Some(name) = predicate.element_type.and_then(|t| class_name(platform, t)) {
                clauses.push(format!("type == '{}'", name));
            }
            if let Some(text) = &predicate.text {
                clauses.push(ios_text_clause(text));
            }
            if predicate.visible_only {
                clauses.push("visible == 1".to_string());
            }

            let value = if clauses.is_empty() {
                "TRUEPREDICATE".to_string()
            } else {
                clauses.join(" AND ")
            };

            Locator {
                using: "-ios predicate string",
                value,
            }
        }
        Platform::Android => {
            let node = predicate
                .element_type
                .and_then(|t| class_name(platform, t))
                .unwrap_or("*");
            let mut value = format!("//{}", node);
            match &predicate.text {
                Some(TextMatch::Exact(t)) => value.push_str(&format!("[@text={}]", xpath_quote(t))),
                Some(TextMatch::Contains(t)) => {
                    value.push_str(&format!("[contains(@text,{})]", xpath_quote(t)))
                }
                None => {}
            }
            if predicate.visible_only {
                value.push_str("[@displayed='true']");
            }

            Locator {
                using: "xpath",
                value,
            }
        }
    }
}

/// Command that scrolls the element matching `text` into view.
///
/// iOS uses `mobile: scroll` with a predicate; Android resolves a
/// `UiScrollable` locator, whose lookup performs the scroll.
pub fn scroll_request_for(platform: Platform, text: &TextMatch) -> (String, WireRequest) {
    match platform {
        Platform::Ios => (
            "execute/sync".to_string(),
            WireRequest::execute(
                "mobile: scroll",
                json!({ "predicateString": ios_text_clause(text), "toVisible": true }),
            ),
        ),
        Platform::Android => {
            let selector = match text {
                TextMatch::Exact(t) => format!("text(\"{}\")", t.replace('"', "\\\"")),
                TextMatch::Contains(t) => format!("textContains(\"{}\")", t.replace('"', "\\\"")),
            };
            let locator = Locator {
                using: "-android uiautomator",
                value: format!(
                    "new UiScrollable(new UiSelector().scrollable(true)).scrollIntoView(new UiSelector().{})",
                    selector
                ),
            };
            ("elements".to_string(), WireRequest::find(&locator))
        }
    }
}

/// A live Appium/WebDriver session driving one device.
pub struct AppiumSession {
    client: Client,
    endpoint: String,
    platform: Platform,
    session_id: Option<String>,
    owns_session: bool,
}

impl AppiumSession {
    /// Create a new session, or attach to `config.session_id` when set.
    pub fn launch(config: &DriverConfig) -> Result<Self, DriverError> {
        let mut session = AppiumSession {
            client: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            platform: config.platform,
            session_id: config.session_id.clone(),
            owns_session: false,
        };

        if session.session_id.is_none() {
            let request = WireRequest::new_session(config.platform, &config.capabilities);
            let value = session.send_ok(Method::POST, "/session", Some(&request), "new session")?;
            let id = value
                .get("sessionId")
                .and_then(Value::as_str)
                .ok_or_else(|| DriverError::Protocol {
                    command: "new session".into(),
                    error: "No sessionId in response".into(),
                })?;
            debug!(session = id, "appium session created");
            session.session_id = Some(id.to_string());
            session.owns_session = true;
        }

        Ok(session)
    }

    fn session_path(&self, path: &str) -> Result<String, DriverError> {
        let id = self
            .session_id
            .as_deref()
            .ok_or_else(|| DriverError::Session("session already closed".into()))?;
        Ok(format!("/session/{}/{}", id, path))
    }

    /// Send a request and decode the response envelope.
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&WireRequest>,
    ) -> Result<WireResponse, DriverError> {
        let url = format!("{}{}", self.endpoint, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| DriverError::Http {
            endpoint: url.clone(),
            source: e,
        })?;
        let text = response.text().map_err(|e| DriverError::Http {
            endpoint: url.clone(),
            source: e,
        })?;

        serde_json::from_str(&text).map_err(|e| DriverError::JsonParse {
            context: format!("response from {}", path),
            source: e,
        })
    }

    /// Send a request and turn a WebDriver error payload into an error.
    fn send_ok(
        &self,
        method: Method,
        path: &str,
        body: Option<&WireRequest>,
        command_name: &str,
    ) -> Result<Value, DriverError> {
        let response = self.send(method, path, body)?;
        if let Some(error) = response.error() {
            return Err(DriverError::Protocol {
                command: command_name.into(),
                error: format!("{}: {}", error, response.message()),
            });
        }
        Ok(response.value)
    }

    fn find_ids(&self, path: &str, request: &WireRequest) -> Result<Vec<String>, DriverError> {
        let response = self.send(Method::POST, &self.session_path(path)?, Some(request))?;
        match response.error() {
            None => {}
            Some("no such element") => return Ok(Vec::new()),
            Some(error) => {
                return Err(DriverError::Protocol {
                    command: "find elements".into(),
                    error: format!("{}: {}", error, response.message()),
                });
            }
        }

        Ok(response
            .value
            .as_array()
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get(ELEMENT_KEY).or_else(|| r.get("ELEMENT")))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Read one element attribute; `None` when the element went stale.
    fn element_value(&self, id: &str, attribute: &str) -> Result<Option<Value>, DriverError> {
        let path = self.session_path(&format!("element/{}/{}", id, attribute))?;
        let response = self.send(Method::GET, &path, None)?;
        match response.error() {
            None => Ok(Some(response.value)),
            Some("stale element reference") | Some("no such element") => Ok(None),
            Some(error) => Err(DriverError::Protocol {
                command: format!("get {}", attribute),
                error: format!("{}: {}", error, response.message()),
            }),
        }
    }

    fn fetch(
        &self,
        id: &str,
        type_hint: Option<ElementType>,
    ) -> Result<Option<ScreenElement>, DriverError> {
        let Some(rect) = self.element_value(id, "rect")? else {
            return Ok(None);
        };
        let rect: WireRect = serde_json::from_value(rect).map_err(|e| DriverError::JsonParse {
            context: "element rect".into(),
            source: e,
        })?;

        let text = self
            .element_value(id, "text")?
            .and_then(|v| v.as_str().map(str::to_string));
        let visible = self
            .element_value(id, "displayed")?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let enabled = self
            .element_value(id, "enabled")?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let element_type = match type_hint {
            Some(t) => t,
            None => self
                .element_value(id, "name")?
                .and_then(|v| v.as_str().map(|n| element_type_for(self.platform, n)))
                .unwrap_or_default(),
        };

        Ok(Some(ScreenElement {
            id: Some(id.to_string()),
            element_type,
            text,
            x: rect.x.round() as i32,
            y: rect.y.round() as i32,
            width: rect.width.round() as i32,
            height: rect.height.round() as i32,
            visible,
            enabled,
        }))
    }

    /// Delete the session if this process created it.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        if let Some(id) = self.session_id.take() {
            if self.owns_session {
                self.send_ok(Method::DELETE, &format!("/session/{}", id), None, "delete session")?;
            }
        }
        Ok(())
    }
}

impl ElementQuery for AppiumSession {
    fn query(&mut self, predicate: &ElementPredicate) -> Result<Vec<ScreenElement>, DriverError> {
        let locator = locator_for(self.platform, predicate);
        debug!(using = locator.using, value = %locator.value, "query");

        let ids = self.find_ids("elements", &WireRequest::find(&locator))?;
        let mut elements = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(el) = self.fetch(&id, predicate.element_type)? {
                if predicate.matches(&el) {
                    elements.push(el);
                }
            }
        }
        Ok(elements)
    }

    fn click(&mut self, element: &ScreenElement) -> Result<ClickOutcome, DriverError> {
        let id = element.id.as_deref().ok_or_else(|| DriverError::Protocol {
            command: "click".into(),
            error: "element has no driver handle".into(),
        })?;

        let path = self.session_path(&format!("element/{}/click", id))?;
        let response = self.send(Method::POST, &path, Some(&WireRequest::Empty {}))?;
        match response.error() {
            None => Ok(ClickOutcome::Clicked),
            Some(error) if NOT_INTERACTABLE_ERRORS.contains(&error) => {
                debug!(error, text = ?element.text, "click rejected");
                Ok(ClickOutcome::NotInteractable)
            }
            Some(error) => Err(DriverError::Protocol {
                command: "click".into(),
                error: format!("{}: {}", error, response.message()),
            }),
        }
    }

    fn scroll_into_view(
        &mut self,
        predicate: &ElementPredicate,
    ) -> Result<Option<ScreenElement>, DriverError> {
        let Some(text) = &predicate.text else {
            return Ok(None);
        };

        let (path, request) = scroll_request_for(self.platform, text);
        let response = self.send(Method::POST, &self.session_path(&path)?, Some(&request))?;
        if let Some(error) = response.error() {
            // A failed scroll is reported through the follow-up lookup.
            warn!(error, message = response.message(), "scroll into view failed");
        }

        Ok(self.query(predicate)?.into_iter().next())
    }
}

impl Drop for AppiumSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
