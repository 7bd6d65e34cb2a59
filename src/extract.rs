use once_cell::sync::Lazy;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::Config;
use crate::models::{ExtractionResult, ImageReference};

// ── Constants ────────────────────────────────────────────────────────────────

pub const FALLBACK_TITLE: &str = "タイトルなし";
const THUMB_SEGMENT: &str = "/thumb_m/";
const FULL_SEGMENT: &str = "/img/";
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

// ── Lazy static selectors ────────────────────────────────────────────────────

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("URL did not return HTML")]
    NotHtml,
    #[error("Upstream returned {0}")]
    Upstream(StatusCode),
    #[error("{0}")]
    Request(String),
}

// ── Fetcher ──────────────────────────────────────────────────────────────────

/// Owns the HTTP client used for every page fetch.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.fetch_timeout);

        if config.insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ExtractionError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch, parse and normalize one page.
    pub async fn extract_images(&self, url: &str) -> Result<ExtractionResult, ExtractionError> {
        let base = validate_url(url)?;
        let html = self.fetch(&base).await?;
        let document = parse(&html);
        let result = extract(&document, &base);
        tracing::info!(url = %base, images = result.images.len(), "extracted images");
        Ok(result)
    }

    pub async fn fetch(&self, url: &Url) -> Result<String, ExtractionError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                ExtractionError::Request(format!("ConnectError: {}", e))
            } else {
                ExtractionError::Request(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Upstream(status));
        }

        // A missing header is tolerated; a declared non-HTML type is not.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_lowercase());

        if let Some(content_type) = content_type {
            if !HTML_CONTENT_TYPES.iter().any(|t| content_type.contains(t)) {
                return Err(ExtractionError::NotHtml);
            }
        }

        response
            .text()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))
    }
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ExtractionError::InvalidUrl("URL is empty".to_string()));
    }
    let parsed = Url::parse(url)
        .map_err(|e| ExtractionError::InvalidUrl(format!("Invalid URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractionError::InvalidUrl(
            "Only http and https URLs are allowed".to_string(),
        ));
    }
    Ok(parsed)
}

// ── Parse ────────────────────────────────────────────────────────────────────

/// html5ever repairs whatever it is given, so this cannot fail.
pub fn parse(raw: &str) -> Html {
    Html::parse_document(raw)
}

// ── Normalize ────────────────────────────────────────────────────────────────

pub fn extract(document: &Html, base: &Url) -> ExtractionResult {
    ExtractionResult {
        title: extract_title(document),
        images: document
            .select(&IMG_SEL)
            .filter_map(|img| resolve_image(img, base))
            .collect(),
    }
}

fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE_SEL)
        .next()
        .map(|el| normalize_text(el.text().collect()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

fn resolve_image(img: ElementRef<'_>, base: &Url) -> Option<ImageReference> {
    let raw_src = img.value().attr("src").filter(|s| !s.is_empty())?;
    let resolved = match base.join(raw_src) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(src = raw_src, error = %e, "skipping unresolvable image src");
            return None;
        }
    };
    Some(ImageReference {
        raw_src: raw_src.to_string(),
        resolved_url: rewrite_thumbnail(resolved),
    })
}

/// Point `/thumb_m/` thumbnails at their full-size `/img/` counterparts.
/// Every occurrence is replaced, so a second pass finds nothing to change.
pub fn rewrite_thumbnail(mut url: Url) -> Url {
    if url.path().contains(THUMB_SEGMENT) {
        let path = url.path().replace(THUMB_SEGMENT, FULL_SEGMENT);
        url.set_path(&path);
    }
    url
}

// ── DOM utility helpers ──────────────────────────────────────────────────────

/// Collapse whitespace and trim.
fn normalize_text(text: String) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
