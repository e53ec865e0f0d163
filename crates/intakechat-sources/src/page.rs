use std::time::Duration;

use intakechat_common::{Error, Result};
use reqwest::Client;
use scraper::{Html, Node, Selector};
use tracing::{info, instrument, warn};

const USER_AGENT: &str = concat!("IntakeChat/", env!("CARGO_PKG_VERSION"));

/// Elements whose text never reaches the visitor.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Fetches the configured web page and flattens it to plain text.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Source(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and return its visible text. Network errors, non-2xx
    /// statuses and unreadable bodies degrade to an error string.
    #[instrument(skip(self))]
    pub async fn fetch_text(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => {
                info!(chars = text.len(), "scraped page");
                text
            }
            Err(e) => {
                warn!("page fetch degraded: {e}");
                format!("Error scraping website: {e}")
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?;
        Ok(html_to_text(&body))
    }
}

/// Strip tags from an HTML document, keeping only visible text.
///
/// Text inside `script`/`style`/`noscript` (and similar) is dropped,
/// runs of whitespace collapse to single spaces, and blank lines go away.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = match Selector::parse("body") {
        Ok(body) => document
            .select(&body)
            .next()
            .unwrap_or_else(|| document.root_element()),
        Err(_) => document.root_element(),
    };

    let mut raw = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            if is_block(node.value()) {
                raw.push('\n');
            }
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block(node: &Node) -> bool {
    node.as_element().is_some_and(|el| {
        matches!(
            el.name(),
            "p" | "div"
                | "br"
                | "li"
                | "tr"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "section"
                | "article"
                | "header"
                | "footer"
                | "table"
                | "ul"
                | "ol"
        )
    })
}
