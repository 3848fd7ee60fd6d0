//! Database schema definitions
//!
//! Five entity tables (site, page, image, page_data, link) plus two
//! vocabulary tables that constrain `page.page_type_code` and
//! `page_data.data_type_code`.

/// SQL schema for the crawl database
pub const SCHEMA_SQL: &str = r#"
-- Vocabulary of page lifecycle states
CREATE TABLE IF NOT EXISTS page_type (
    code VARCHAR(20) PRIMARY KEY
);

INSERT OR IGNORE INTO page_type (code) VALUES ('HTML'), ('BINARY'), ('DUPLICATE'), ('FRONTIER');

-- Vocabulary of binary document kinds
CREATE TABLE IF NOT EXISTS data_type (
    code VARCHAR(20) PRIMARY KEY
);

INSERT OR IGNORE INTO data_type (code) VALUES ('PDF'), ('DOC'), ('DOCX'), ('PPT'), ('PPTX');

-- One row per canonical domain
CREATE TABLE IF NOT EXISTS site (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL UNIQUE,
    robots_content TEXT,
    sitemap_content TEXT
);

-- One row per distinct URL
CREATE TABLE IF NOT EXISTS page (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER REFERENCES site(id),
    page_type_code VARCHAR(20) NOT NULL REFERENCES page_type(code),
    url TEXT NOT NULL UNIQUE,
    html_content TEXT,
    http_status_code INTEGER,
    accessed_time TEXT,
    hash BLOB CHECK (hash IS NULL OR length(hash) = 16)
);

CREATE INDEX IF NOT EXISTS idx_page_site ON page(site_id);
CREATE INDEX IF NOT EXISTS idx_page_type ON page(page_type_code);
CREATE INDEX IF NOT EXISTS idx_page_hash ON page(hash);

-- Images embedded in a page; data is base64 text
CREATE TABLE IF NOT EXISTS image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES page(id),
    filename TEXT,
    content_type TEXT,
    data TEXT,
    accessed_time TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_image_page ON image(page_id);

-- Payload of a BINARY page; data is base64 text
CREATE TABLE IF NOT EXISTS page_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES page(id),
    data_type_code VARCHAR(20) NOT NULL REFERENCES data_type(code),
    data TEXT
);

CREATE INDEX IF NOT EXISTS idx_page_data_page ON page_data(page_id);

-- Directed edges of the crawl graph
CREATE TABLE IF NOT EXISTS link (
    from_page INTEGER NOT NULL REFERENCES page(id),
    to_page INTEGER NOT NULL REFERENCES page(id),
    PRIMARY KEY (from_page, to_page)
);

CREATE INDEX IF NOT EXISTS idx_link_to ON link(to_page);
"#;

/// Initializes the database schema
///
/// Safe to call on every connection: every statement is idempotent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["page_type", "data_type", "site", "page", "image", "page_data", "link"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_vocabularies_seeded_once() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let page_types: i64 = conn
            .query_row("SELECT COUNT(*) FROM page_type", [], |row| row.get(0))
            .unwrap();
        let data_types: i64 = conn
            .query_row("SELECT COUNT(*) FROM data_type", [], |row| row.get(0))
            .unwrap();

        assert_eq!(page_types, 4);
        assert_eq!(data_types, 5);
    }

    #[test]
    fn test_page_type_vocabulary_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO page (page_type_code, url) VALUES ('IMAGE', 'https://a.gov.si/')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_width_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO page (page_type_code, url, hash) VALUES ('HTML', 'https://a.gov.si/', ?1)",
            [vec![0u8; 8]],
        );
        assert!(result.is_err());
    }
}
