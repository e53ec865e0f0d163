pub mod condense;
pub mod document;
pub mod loader;
pub mod page;

pub use condense::condense_source;
pub use document::{DOCUMENT_NOT_FOUND, load_document_text};
pub use loader::{ContentSource, SourceLoader};
pub use page::{PageFetcher, html_to_text};
