//! Internet search tool backed by the `DuckDuckGo` lite HTML endpoint.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ToolError;
use crate::tool::{Tool, parameters_schema_for};

/// Default search endpoint.
pub const DUCKDUCKGO_LITE_URL: &str = "https://lite.duckduckgo.com/lite/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static LINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]*href=["']([^"']+)["'][^>]*class=["']result-link["'][^>]*>([^<]+)</a>|<a[^>]*class=["']result-link["'][^>]*href=["']([^"']+)["'][^>]*>([^<]+)</a>"#).ok()
});

static SNIPPET_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"class=["']result-snippet["'][^>]*>([\s\S]*?)</td>"#).ok());

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result.
    pub title: String,
    /// URL of the result.
    pub link: String,
    /// Description/snippet of the result.
    pub snippet: String,
}

/// Arguments for [`SearchInternetTool`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// The search query to perform.
    pub query: String,
}

/// Tool that searches the internet about a given topic.
#[derive(Debug, Clone)]
pub struct SearchInternetTool {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl Default for SearchInternetTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchInternetTool {
    /// Create a search tool returning the top four results.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: DUCKDUCKGO_LITE_URL.to_owned(),
            max_results: 4,
        }
    }

    /// Set maximum results.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Use a different endpoint serving the same HTML layout.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Format results as the observation text shown to the agent.
    #[must_use]
    pub fn format_results(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| {
                format!(
                    "Title: {}\nLink: {}\nSnippet: {}\n\n-----------------",
                    r.title, r.link, r.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse the `DuckDuckGo` lite result page.
    #[must_use]
    pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
        let (Some(link_re), Some(snippet_re)) = (LINK_RE.as_ref(), SNIPPET_RE.as_ref()) else {
            return Vec::new();
        };

        let snippets: Vec<String> = snippet_re
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .collect();

        link_re
            .captures_iter(html)
            .enumerate()
            .filter_map(|(i, cap)| {
                let href = cap.get(1).or_else(|| cap.get(3))?.as_str();
                let title = cap.get(2).or_else(|| cap.get(4))?.as_str();
                let link = resolve_link(&decode_entities(href));
                let title = clean_text(title);
                if link.is_empty() || title.is_empty() {
                    return None;
                }
                Some(SearchResult {
                    title,
                    link,
                    snippet: snippets.get(i).cloned().unwrap_or_default(),
                })
            })
            .take(max_results)
            .collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ToolError::execution(format!(
                "Search failed with HTTP {}",
                response.status().as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ToolError::execution(format!("Failed to read response: {e}")))?;

        Ok(Self::parse_results(&html, self.max_results))
    }
}

/// Strip tags, decode entities and collapse whitespace.
fn clean_text(raw: &str) -> String {
    let stripped = TAG_RE
        .as_ref()
        .map_or_else(|| raw.to_owned(), |re| re.replace_all(raw, "").into_owned());
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Unwrap `DuckDuckGo` redirect links (`//duckduckgo.com/l/?uddg=<url>`).
///
/// Scheme- and host-relative links are resolved against the lite endpoint.
fn resolve_link(href: &str) -> String {
    let Ok(url) = Url::parse(DUCKDUCKGO_LITE_URL).and_then(|base| base.join(href)) else {
        return href.to_owned();
    };
    url.query_pairs()
        .find(|(key, _)| key == "uddg")
        .map_or_else(|| url.to_string(), |(_, target)| target.into_owned())
}

#[async_trait]
impl Tool for SearchInternetTool {
    const NAME: &'static str = "search_internet";
    type Args = SearchArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        "Useful to search the internet about a given topic and return relevant results."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema_for::<SearchArgs>()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_args("query must not be empty"));
        }

        let results = self.search(query).await?;
        debug!(query, count = results.len(), "Search completed");

        if results.is_empty() {
            return Err(ToolError::execution(
                "No results found! Try a less restrictive/shorter query.",
            ));
        }
        Ok(Self::format_results(&results))
    }
}
