//! Page navigation capability
//!
//! The pagination walker drives listing pages through [`PageNavigator`], so it
//! never depends on how pages get rendered. [`HttpNavigator`] is the static
//! HTML implementation: it fetches pages over HTTP, queries them with CSS
//! selectors and "clicks" by following an element's href.

use crate::crawler::fetcher::HttpFetch;
use crate::crawler::parser::{contains_selector, select_elements};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// An element found on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    /// Whitespace-normalised text content
    pub text: String,

    /// Absolute link target, if the element (or a descendant anchor) has one
    pub href: Option<String>,
}

impl PageElement {
    pub fn is_clickable(&self) -> bool {
        self.href.is_some()
    }
}

/// Stateful access to the page currently shown
#[async_trait]
pub trait PageNavigator: Send {
    /// Navigates to `url`
    async fn load(&mut self, url: &str) -> Result<()>;

    /// Waits until `selector` matches something, or `timeout` elapses
    async fn wait_until_present(&mut self, selector: &str, timeout: Duration) -> bool;

    /// All elements currently matching `selector`
    fn find_all(&self, selector: &str) -> Vec<PageElement>;

    /// First element matching `selector`, waiting up to `timeout` for it
    async fn find_one(&mut self, selector: &str, timeout: Duration) -> Option<PageElement>;

    /// Activates an element
    async fn click(&mut self, element: &PageElement) -> Result<()>;

    /// URL of the page currently shown
    fn current_url(&self) -> Option<Url>;
}

/// Navigator over plain HTTP fetches
///
/// A page whose fetch fails is held as "not loaded"; waiting on it re-fetches
/// every poll interval until the wait times out.
pub struct HttpNavigator {
    fetcher: Arc<dyn HttpFetch>,
    request_timeout: Duration,
    poll_interval: Duration,
    current_url: Option<Url>,
    document: Option<String>,
}

impl HttpNavigator {
    pub fn new(fetcher: Arc<dyn HttpFetch>, request_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            fetcher,
            request_timeout,
            poll_interval,
            current_url: None,
            document: None,
        }
    }

    async fn refresh(&mut self) {
        let Some(url) = self.current_url.clone() else {
            self.document = None;
            return;
        };

        match self.fetcher.get(url.as_str(), self.request_timeout).await {
            Ok(page) => {
                if let Ok(final_url) = Url::parse(&page.final_url) {
                    self.current_url = Some(final_url);
                }
                self.document = Some(page.body);
            }
            Err(e) => {
                tracing::debug!("Page not loaded yet: {}", e);
                self.document = None;
            }
        }
    }

    async fn pause_until(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(self.poll_interval.min(remaining)).await;
    }
}

#[async_trait]
impl PageNavigator for HttpNavigator {
    async fn load(&mut self, url: &str) -> Result<()> {
        let url = Url::parse(url)?;
        tracing::debug!("Loading {}", url);
        self.current_url = Some(url);
        self.refresh().await;
        Ok(())
    }

    async fn wait_until_present(&mut self, selector: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(document) = &self.document {
                if contains_selector(document, selector) {
                    return true;
                }
            }

            if Instant::now() >= deadline {
                return false;
            }

            self.pause_until(deadline).await;
            self.refresh().await;
        }
    }

    fn find_all(&self, selector: &str) -> Vec<PageElement> {
        match (&self.document, &self.current_url) {
            (Some(document), Some(url)) => select_elements(document, url, selector),
            _ => Vec::new(),
        }
    }

    async fn find_one(&mut self, selector: &str, timeout: Duration) -> Option<PageElement> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.document.is_some() {
                // A fetched document cannot change without reloading it
                return self.find_all(selector).into_iter().next();
            }

            if Instant::now() >= deadline {
                return None;
            }

            self.pause_until(deadline).await;
            self.refresh().await;
        }
    }

    async fn click(&mut self, element: &PageElement) -> Result<()> {
        match &element.href {
            Some(href) => {
                let href = href.clone();
                self.load(&href).await
            }
            None => Err(HarvestError::Navigation(format!(
                "element '{}' has no link to follow",
                element.text
            ))),
        }
    }

    fn current_url(&self) -> Option<Url> {
        self.current_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchError, FetchedPage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Serves fixed bodies; unknown URLs fail
    struct StaticFetcher {
        pages: HashMap<String, String>,
        calls: AtomicU32,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpFetch for StaticFetcher {
        async fn get(&self, url: &str, _timeout: Duration) -> std::result::Result<FetchedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(url) {
                Some(body) => Ok(FetchedPage {
                    status: 200,
                    final_url: url.to_string(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn navigator(fetcher: Arc<StaticFetcher>) -> HttpNavigator {
        HttpNavigator::new(fetcher, Duration::from_secs(1), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_wait_until_present_and_click() {
        let fetcher = Arc::new(StaticFetcher::new(&[
            (
                "https://example.com/list",
                r#"<div class="marker">x</div><a class="next" href="/list2">Next</a>"#,
            ),
            ("https://example.com/list2", r#"<div class="marker">y</div>"#),
        ]));
        let mut nav = navigator(fetcher.clone());

        nav.load("https://example.com/list").await.unwrap();
        assert!(nav.wait_until_present(".marker", Duration::from_millis(100)).await);

        let next = nav
            .find_one(".next", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(next.is_clickable());

        nav.click(&next).await.unwrap();
        assert_eq!(
            nav.current_url().unwrap().as_str(),
            "https://example.com/list2"
        );
        assert!(nav.find_one(".next", Duration::from_millis(100)).await.is_none());
    }

    #[tokio::test]
    async fn test_wait_times_out_on_missing_marker() {
        let fetcher = Arc::new(StaticFetcher::new(&[(
            "https://example.com/list",
            "<p>no marker here</p>",
        )]));
        let mut nav = navigator(fetcher.clone());

        nav.load("https://example.com/list").await.unwrap();
        let started = Instant::now();
        assert!(!nav.wait_until_present(".marker", Duration::from_millis(50)).await);
        assert!(started.elapsed() >= Duration::from_millis(50));
        // Polling re-fetched the page at least once
        assert!(fetcher.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_unloadable_page_has_no_elements() {
        let fetcher = Arc::new(StaticFetcher::new(&[]));
        let mut nav = navigator(fetcher);

        nav.load("https://example.com/missing").await.unwrap();
        assert!(nav.find_all("div").is_empty());
        assert!(nav.find_one("div", Duration::from_millis(20)).await.is_none());
    }

    #[tokio::test]
    async fn test_click_without_href_fails() {
        let fetcher = Arc::new(StaticFetcher::new(&[]));
        let mut nav = navigator(fetcher);
        let element = PageElement {
            text: "Next".to_string(),
            href: None,
        };
        assert!(matches!(
            nav.click(&element).await,
            Err(HarvestError::Navigation(_))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_url() {
        let fetcher = Arc::new(StaticFetcher::new(&[]));
        let mut nav = navigator(fetcher);
        assert!(matches!(
            nav.load("not a url").await,
            Err(HarvestError::UrlParse(_))
        ));
    }
}
