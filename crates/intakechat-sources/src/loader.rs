use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use intakechat_agents::CompletionRelay;
use intakechat_common::{Result, SourceContent};
use intakechat_config::SourcesConfig;
use tracing::{info, instrument};

use crate::condense::condense_source;
use crate::document::load_document_text;
use crate::page::PageFetcher;

/// Produces the grounding content for one chat activation.
///
/// Loading never fails; unavailable sources come back as placeholder text.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn load(&self) -> SourceContent;
}

/// Loads the configured document and web page, optionally condensing each.
pub struct SourceLoader {
    document_path: PathBuf,
    page_url: String,
    fetcher: PageFetcher,
    condenser: Option<CompletionRelay>,
}

impl SourceLoader {
    pub fn new(
        document_path: impl Into<PathBuf>,
        page_url: impl Into<String>,
        fetcher: PageFetcher,
    ) -> Self {
        Self {
            document_path: document_path.into(),
            page_url: page_url.into(),
            fetcher,
            condenser: None,
        }
    }

    pub fn from_config(config: &SourcesConfig, fetch_timeout: Duration) -> Result<Self> {
        Ok(Self::new(
            config.document_path.clone(),
            config.page_url.clone(),
            PageFetcher::new(fetch_timeout)?,
        ))
    }

    /// Summarize both sources through `relay` before they are cached.
    pub fn with_condenser(mut self, relay: CompletionRelay) -> Self {
        self.condenser = Some(relay);
        self
    }
}

#[async_trait]
impl ContentSource for SourceLoader {
    #[instrument(skip(self), fields(document = %self.document_path.display(), page = %self.page_url))]
    async fn load(&self) -> SourceContent {
        let (document_text, page_text) = tokio::join!(
            load_document_text(&self.document_path),
            self.fetcher.fetch_text(&self.page_url),
        );

        let Some(relay) = &self.condenser else {
            return SourceContent {
                document_text,
                page_text,
            };
        };

        let (document_text, page_text) = tokio::join!(
            condense_source(relay, "PDF Content", &document_text),
            condense_source(relay, "Website Content", &page_text),
        );
        info!("sources condensed");
        SourceContent {
            document_text,
            page_text,
        }
    }
}
