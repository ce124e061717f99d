//! Instagram post thumbnails, resized through an image CDN.

use axum::body::Bytes;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ThumbnailConfig;
use crate::error::ApiError;

pub const MIN_WIDTH: u32 = 16;
pub const MAX_WIDTH: u32 = 2048;
pub const MIN_QUALITY: u32 = 1;
pub const MAX_QUALITY: u32 = 100;

const ALLOWED_HOSTS: [&str; 2] = ["instagram.com", "www.instagram.com"];
const POST_KINDS: [&str; 3] = ["p", "reel", "tv"];

lazy_static::lazy_static! {
    static ref OG_IMAGE_PROPERTY_FIRST: regex::Regex = regex::Regex::new(
        r#"(?i)<meta[^>]+property\s*=\s*["']og:image["'][^>]*content\s*=\s*["']([^"']+)["']"#,
    )
    .unwrap();
    static ref OG_IMAGE_CONTENT_FIRST: regex::Regex = regex::Regex::new(
        r#"(?i)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]*property\s*=\s*["']og:image["']"#,
    )
    .unwrap();
}

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Only Instagram post URLs are supported")]
    InvalidUrl,

    #[error("No preview image found for this post")]
    ImageNotFound,

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid CDN configuration: {0}")]
    Config(String),
}

impl From<ThumbnailError> for ApiError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::InvalidUrl => ApiError::validation(err.to_string()),
            ThumbnailError::ImageNotFound => ApiError::NotFound(err.to_string()),
            ThumbnailError::Upstream(msg) => ApiError::BadGateway(msg),
            ThumbnailError::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<reqwest::Error> for ThumbnailError {
    fn from(err: reqwest::Error) -> Self {
        ThumbnailError::Upstream(err.to_string())
    }
}

/// What the caller gets back.
#[derive(Debug)]
pub enum Thumbnail {
    /// Redirect target on the CDN.
    Redirect(String),
    Image { content_type: String, bytes: Bytes },
}

pub struct ThumbnailProxy {
    config: ThumbnailConfig,
    client: reqwest::Client,
}

impl ThumbnailProxy {
    pub fn new(config: ThumbnailConfig) -> Result<Self, ThumbnailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ThumbnailError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn cache_max_age_secs(&self) -> u64 {
        self.config.cache_max_age_secs
    }

    /// Resolves the preview image of a post and either redirects to the
    /// resized CDN copy or fetches it.
    pub async fn thumbnail(
        &self,
        post_url: &str,
        width: Option<u32>,
        quality: Option<u32>,
        raw: bool,
    ) -> Result<Thumbnail, ThumbnailError> {
        let post = parse_post_url(post_url)?;
        let page = self.fetch_text(post).await?;
        let image = extract_og_image(&page).ok_or(ThumbnailError::ImageNotFound)?;

        let width = clamp_width(width.unwrap_or(self.config.default_width));
        let quality = clamp_quality(quality.unwrap_or(self.config.default_quality));
        let cdn_url = build_cdn_url(&self.config.cdn_base, &image, width, quality)?;
        debug!(width, quality, raw, "Resolved thumbnail");

        if raw {
            return Ok(Thumbnail::Redirect(cdn_url.to_string()));
        }

        let response = self.client.get(cdn_url).send().await?;
        if !response.status().is_success() {
            return Err(ThumbnailError::Upstream(format!(
                "CDN returned {}",
                response.status()
            )));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?;
        Ok(Thumbnail::Image {
            content_type,
            bytes,
        })
    }

    async fn fetch_text(&self, url: Url) -> Result<String, ThumbnailError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ThumbnailError::Upstream(format!(
                "Post page returned {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Accepts only `https://(www.)instagram.com/{p|reel|tv}/<id>...`.
pub fn parse_post_url(raw: &str) -> Result<Url, ThumbnailError> {
    let url = Url::parse(raw.trim()).map_err(|_| ThumbnailError::InvalidUrl)?;
    if url.scheme() != "https" {
        return Err(ThumbnailError::InvalidUrl);
    }
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !ALLOWED_HOSTS.contains(&host.as_str()) {
        return Err(ThumbnailError::InvalidUrl);
    }
    let mut segments = url
        .path_segments()
        .ok_or(ThumbnailError::InvalidUrl)?
        .filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(kind), Some(_id)) if POST_KINDS.contains(&kind) => Ok(url),
        _ => Err(ThumbnailError::InvalidUrl),
    }
}

/// Reads the `og:image` meta tag, in either attribute order.
pub fn extract_og_image(html: &str) -> Option<String> {
    OG_IMAGE_PROPERTY_FIRST
        .captures(html)
        .or_else(|| OG_IMAGE_CONTENT_FIRST.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|s| !s.trim().is_empty())
}

pub fn clamp_width(width: u32) -> u32 {
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

pub fn clamp_quality(quality: u32) -> u32 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}

pub fn build_cdn_url(
    cdn_base: &str,
    image: &str,
    width: u32,
    quality: u32,
) -> Result<Url, ThumbnailError> {
    Url::parse_with_params(
        cdn_base,
        &[
            ("url", image.to_string()),
            ("w", width.to_string()),
            ("q", quality.to_string()),
        ],
    )
    .map_err(|e| ThumbnailError::Config(e.to_string()))
}
