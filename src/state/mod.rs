//! State module for the crawl graph and crawl-run bookkeeping
//!
//! # Components
//!
//! - `PageType`: lifecycle of a page row (FRONTIER, then HTML, DUPLICATE or BINARY)
//! - `DataType`: kind of stored binary document (PDF, DOC, DOCX, PPT, PPTX)
//! - `ContentHash`: 16-byte digest used for exact-duplicate detection
//! - `DedupRegistry`: claimed pages and claimed sites shared by all workers

mod data_type;
mod hash;
mod page_type;
mod registry;

// Re-export main types
pub use data_type::DataType;
pub use hash::ContentHash;
pub use page_type::PageType;
pub use registry::DedupRegistry;
