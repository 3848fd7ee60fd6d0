//! Render collaborator
//!
//! A renderer turns a URL into final HTML plus the anchor targets and image
//! sources found in its DOM. `HttpRenderer` does this with a plain GET and
//! scraper; script-driven navigation is not followed.

use crate::crawler::fetcher::classify_error;
use crate::crawler::parser::extract_resources;
use crate::RenderError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Result of rendering one URL
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects
    pub final_url: Url,
    /// HTTP status, if the renderer could observe it
    pub status_code: Option<u16>,
    pub html: String,
    /// Raw `href` values of anchors, unresolved
    pub anchor_hrefs: Vec<String>,
    /// Raw `src` values of images, unresolved
    pub image_srcs: Vec<String>,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError>;
}

/// Static-HTML renderer over reqwest and scraper
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError> {
        let unreachable = |e: reqwest::Error| RenderError::Unreachable {
            url: url.to_string(),
            reason: classify_error(url.as_str(), e).to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(unreachable)?;

        let final_url = response.url().clone();
        let status_code = response.status().as_u16();
        let html = response.text().await.map_err(|e| RenderError::Session {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        // scraper's Html is !Send, so the DOM never lives across an await
        let resources = extract_resources(&html);

        Ok(RenderedPage {
            final_url,
            status_code: Some(status_code),
            html,
            anchor_hrefs: resources.anchor_hrefs,
            image_srcs: resources.image_srcs,
        })
    }
}
