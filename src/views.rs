use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::extract::ExtractionError;
use crate::models::{ExtractionResult, ImageReference};

#[derive(Template, Default)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub thread_url: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
    pub images: Vec<ImageReference>,
}

impl IndexTemplate {
    /// A failed extraction shows its message where the title and list would be.
    pub fn for_outcome(url: String, outcome: Result<ExtractionResult, ExtractionError>) -> Self {
        match outcome {
            Ok(result) => Self {
                thread_url: Some(url),
                title: Some(result.title),
                error: None,
                images: result.images,
            },
            Err(e) => Self {
                thread_url: Some(url),
                title: None,
                error: Some(e.to_string()),
                images: Vec::new(),
            },
        }
    }
}

impl IntoResponse for IndexTemplate {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(body) => Html(body).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn empty_form_has_no_listing() {
        let page = IndexTemplate::default().render().unwrap();
        assert!(page.contains(r#"name="url""#));
        assert!(!page.contains("スレッド情報"));
        assert!(!page.contains("copy-btn\" data-url"));
    }

    #[test]
    fn renders_title_link_and_images() {
        let result = ExtractionResult {
            title: "Thread".to_string(),
            images: vec![ImageReference {
                raw_src: "/thumb_m/a.jpg".to_string(),
                resolved_url: Url::parse("https://x.test/img/a.jpg").unwrap(),
            }],
        };
        let page = IndexTemplate::for_outcome("https://x.test/p".to_string(), Ok(result))
            .render()
            .unwrap();

        assert!(page.contains(r#"target="_blank""#));
        assert!(page.contains("タイトル:</strong> Thread"));
        assert_eq!(page.matches("data-url=").count(), 1);
        assert!(page.contains("a.jpg"));
        assert!(!page.contains("エラーが発生しました"));
    }

    #[test]
    fn renders_error_in_place_of_listing() {
        let page = IndexTemplate::for_outcome(
            "https://down.test/".to_string(),
            Err(ExtractionError::Request("ConnectError: refused".to_string())),
        )
        .render()
        .unwrap();

        assert!(page.contains("エラーが発生しました: ConnectError: refused"));
        assert!(!page.contains("タイトル:"));
        assert!(!page.contains("取得した画像とソース"));
    }

    #[test]
    fn escapes_page_supplied_text() {
        let result = ExtractionResult {
            title: "<script>alert(1)</script>".to_string(),
            images: Vec::new(),
        };
        let page = IndexTemplate::for_outcome("https://x.test/".to_string(), Ok(result))
            .render()
            .unwrap();
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
