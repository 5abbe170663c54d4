//! Portrait resolution for wiki character pages.
//!
//! A page's portrait is the first image inside a portable-infobox figure that
//! wraps an image-thumbnail anchor. There is no fallback selector: pages whose
//! infobox is structured differently yield no portrait.

use std::sync::LazyLock;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use castgraph_shared::{CastGraphError, Result, ScrapeConfig};

/// CSS path to the infobox portrait image.
pub const INFOBOX_PORTRAIT_SELECTOR: &str = "figure.pi-item.pi-image a.image-thumbnail img";

/// Image URLs are versioned as `<file>/revision/<...>`; everything from here on is dropped.
const REVISION_MARKER: &str = "/revision/";

/// Maximum number of redirects followed per page.
const MAX_REDIRECTS: usize = 5;

static PORTRAIT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(INFOBOX_PORTRAIT_SELECTOR).expect("valid selector"));

/// Fetches character pages and extracts one portrait URL per page.
pub struct PortraitResolver {
    client: Client,
}

impl PortraitResolver {
    /// Build a resolver with the configured user agent and timeout.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| CastGraphError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Resolve the portrait for `page_url`.
    ///
    /// - `Ok(Some(url))`: infobox image found, revision suffix stripped
    /// - `Ok(None)`: non-success status, or no matching image on the page
    /// - `Err(_)`: the URL is unusable or the request itself failed
    #[instrument(skip(self))]
    pub async fn resolve(&self, page_url: &str) -> Result<Option<String>> {
        let url = parse_page_url(page_url)?;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| CastGraphError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "non-success status, no portrait");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| CastGraphError::Network(format!("{url}: body read failed: {e}")))?;

        let portrait = extract_portrait(&body);
        debug!(%url, found = portrait.is_some(), "page parsed");
        Ok(portrait)
    }
}

/// Apply the selection rule to a page's HTML.
pub fn extract_portrait(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let img = doc.select(&PORTRAIT_SEL).next()?;
    let src = img.value().attr("src")?;
    Some(strip_revision(src).to_string())
}

/// Keep only the part of `src` before the first `/revision/`.
pub fn strip_revision(src: &str) -> &str {
    src.split(REVISION_MARKER).next().unwrap_or(src)
}

fn parse_page_url(page_url: &str) -> Result<Url> {
    let url = Url::parse(page_url.trim())
        .map_err(|e| CastGraphError::validation(format!("invalid page URL '{page_url}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CastGraphError::validation(format!(
            "unsupported scheme '{other}' in page URL '{page_url}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/html")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        std::fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn test_config() -> ScrapeConfig {
        ScrapeConfig {
            timeout: Duration::from_secs(5),
            delay: Duration::ZERO,
            ..ScrapeConfig::default()
        }
    }

    #[test]
    fn strip_revision_keeps_prefix() {
        assert_eq!(
            strip_revision("https://static.example/foo/revision/v2"),
            "https://static.example/foo"
        );
        assert_eq!(
            strip_revision("https://static.example/a.png/revision/latest/scale-to-width-down/268?cb=1"),
            "https://static.example/a.png"
        );
        assert_eq!(strip_revision("https://static.example/plain.png"), "https://static.example/plain.png");
        assert_eq!(strip_revision(""), "");
    }

    #[test]
    fn extract_from_fandom_fixture() {
        let html = load_fixture("fandom_character.html");
        assert_eq!(
            extract_portrait(&html).as_deref(),
            Some("https://static.wikia.nocookie.net/thewhitelotus/images/3/3b/Tanya_S2.jpg")
        );
    }

    #[test]
    fn image_outside_infobox_is_ignored() {
        let html = r#"<html><body>
            <img src="https://img.example/logo.png/revision/1">
            <figure class="pi-item"><a class="image-thumbnail"><img src="https://img.example/x.png"></a></figure>
        </body></html>"#;
        assert_eq!(extract_portrait(html), None);
    }

    #[test]
    fn first_match_without_src_yields_none() {
        let html = r#"<html><body>
            <figure class="pi-item pi-image"><a class="image image-thumbnail"><img data-src="lazy.png"></a></figure>
            <figure class="pi-item pi-image"><a class="image image-thumbnail"><img src="https://img.example/second.png"></a></figure>
        </body></html>"#;
        assert_eq!(extract_portrait(html), None);
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(parse_page_url("ftp://wiki.example/Tanya").is_err());
        assert!(parse_page_url("not a url").is_err());
        assert!(parse_page_url(" https://wiki.example/Tanya ").is_ok());
    }

    #[tokio::test]
    async fn resolve_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/wiki/Tanya_McQuoid-Hunt"))
            .and(wiremock::matchers::header_regex("user-agent", "WhiteLotusScraper"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(load_fixture("fandom_character.html")),
            )
            .mount(&server)
            .await;

        let resolver = PortraitResolver::new(&test_config()).unwrap();
        let url = format!("{}/wiki/Tanya_McQuoid-Hunt", server.uri());
        let portrait = resolver.resolve(&url).await.unwrap();

        assert_eq!(
            portrait.as_deref(),
            Some("https://static.wikia.nocookie.net/thewhitelotus/images/3/3b/Tanya_S2.jpg")
        );
    }

    #[tokio::test]
    async fn non_success_status_is_no_portrait() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/wiki/Missing"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = PortraitResolver::new(&test_config()).unwrap();
        let url = format!("{}/wiki/Missing", server.uri());
        assert_eq!(resolver.resolve(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn page_without_infobox_is_no_portrait() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/wiki/Stub"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>Stub article.</p></body></html>"),
            )
            .mount(&server)
            .await;

        let resolver = PortraitResolver::new(&test_config()).unwrap();
        let url = format!("{}/wiki/Stub", server.uri());
        assert_eq!(resolver.resolve(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn timeout_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/wiki/Slow"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = ScrapeConfig {
            timeout: Duration::from_millis(200),
            ..test_config()
        };
        let resolver = PortraitResolver::new(&config).unwrap();
        let url = format!("{}/wiki/Slow", server.uri());
        let err = resolver.resolve(&url).await.unwrap_err();
        assert!(matches!(err, CastGraphError::Network(_)));
    }
}
