use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub url: String,
}

/// One `<img>` found in the page: the `src` as written, and where it points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub raw_src: String,
    pub resolved_url: Url,
}

#[derive(Debug)]
pub struct ExtractionResult {
    pub title: String,
    pub images: Vec<ImageReference>,
}
