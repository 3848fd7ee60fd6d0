use std::fmt;
use url::Url;

/// Kind of binary document stored as page data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Pdf,
    Doc,
    Docx,
    Ppt,
    Pptx,
}

impl DataType {
    /// Classifies a URL by the extension of its last path segment
    ///
    /// The comparison is case-insensitive and ignores the query string, so
    /// `/files/Report.PDF?v=2` is a PDF. Returns None for anything that is
    /// not one of the five document types.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use crawldb::DataType;
    ///
    /// let url = Url::parse("https://x.gov.si/files/porocilo.pdf").unwrap();
    /// assert_eq!(DataType::from_url(&url), Some(DataType::Pdf));
    /// ```
    pub fn from_url(url: &Url) -> Option<Self> {
        let segment = url.path_segments()?.last()?;
        let (_, extension) = segment.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    /// Parses a file extension (without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "ppt" => Some(Self::Ppt),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Converts the data type to its code in the `data_type` vocabulary table
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Doc => "DOC",
            Self::Docx => "DOCX",
            Self::Ppt => "PPT",
            Self::Pptx => "PPTX",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "PDF" => Some(Self::Pdf),
            "DOC" => Some(Self::Doc),
            "DOCX" => Some(Self::Docx),
            "PPT" => Some(Self::Ppt),
            "PPTX" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Returns all data types, in vocabulary order
    pub fn all_types() -> [Self; 5] {
        [Self::Pdf, Self::Doc, Self::Docx, Self::Ppt, Self::Pptx]
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
