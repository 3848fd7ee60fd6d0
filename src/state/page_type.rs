/// Page type definitions for the crawl graph
///
/// A page row starts in the frontier and moves to exactly one terminal type
/// once it has been fetched.
use std::fmt;

/// Lifecycle state of a page row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    // ===== Active States =====
    /// Discovered through a link or sitemap, not yet fetched
    Frontier,

    // ===== Terminal States =====
    /// Fetched and rendered; the HTML content is stored
    Html,

    /// Fetched, but the content hash matches an existing HTML page
    Duplicate,

    /// A binary document (PDF, DOC, ...) rather than an HTML page
    Binary,
}

impl PageType {
    /// Returns true if this is a terminal state (the page can never leave it)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Frontier)
    }

    /// Converts the page type to its code in the `page_type` vocabulary table
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Frontier => "FRONTIER",
            Self::Html => "HTML",
            Self::Duplicate => "DUPLICATE",
            Self::Binary => "BINARY",
        }
    }

    /// Parses a page type from its vocabulary code
    ///
    /// Returns None if the string doesn't match any known code.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "FRONTIER" => Some(Self::Frontier),
            "HTML" => Some(Self::Html),
            "DUPLICATE" => Some(Self::Duplicate),
            "BINARY" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Returns all page types, in vocabulary order
    pub fn all_types() -> [Self; 4] {
        [Self::Html, Self::Binary, Self::Duplicate, Self::Frontier]
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
