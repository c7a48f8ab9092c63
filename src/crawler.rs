//! Headless Chrome store collaborator.
//!
//! Drives a real browser through the store's search and detail pages and
//! hands raw markup to the extraction pipeline. One browser per analysis;
//! dropping the session kills it.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::detail::DetailPage;
use crate::source::{StoreSession, StoreSource};

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

// Give client-side rendering a moment after `body` shows up.
const HYDRATION_WAIT: Duration = Duration::from_millis(1500);

// Finds the live "Downloads" badge; its number usually sits in a sibling node.
const INSTALLS_HINT_SCRIPT: &str = r#"
    (() => {
        const nodes = Array.from(document.querySelectorAll('div, span'));
        for (const el of nodes) {
            const own = Array.from(el.childNodes)
                .filter(n => n.nodeType === Node.TEXT_NODE)
                .map(n => n.textContent)
                .join(' ');
            if (/downloads|installs/i.test(own)) {
                const box = el.parentElement || el;
                const text = (box.innerText || box.textContent || '').trim();
                if (text.length > 0 && text.length < 80) return text;
            }
        }
        return '';
    })()
"#;

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_USER_AGENT)
}

/// True when the store answered with a challenge or block page instead of content.
pub fn is_blocked_page(url: &str, html: &str) -> bool {
    let url = url.to_lowercase();
    if url.contains("/sorry/") || url.contains("captcha") || url.contains("checkpoint") {
        return true;
    }
    html.contains("Our systems have detected unusual traffic")
        || html.contains("Verify it's you")
        || html.contains("temporarily locked")
}

/// Launches Chrome sessions against the configured store.
pub struct ChromeStoreSource {
    config: StoreConfig,
    client: reqwest::Client,
}

impl ChromeStoreSource {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(pick_user_agent())
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(config.navigation_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn search_url(&self, keyword: &str, country: &str) -> String {
        search_url(&self.config, keyword, country)
    }

    pub fn detail_url(&self, package_id: &str, country: &str) -> String {
        detail_url(&self.config, package_id, country)
    }

    pub fn suggest_url(&self, query: &str) -> String {
        let sep = if self.config.suggest_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}hl={}&q={}",
            self.config.suggest_url,
            sep,
            self.config.language,
            urlencoding::encode(query)
        )
    }
}

fn search_url(config: &StoreConfig, keyword: &str, country: &str) -> String {
    format!(
        "{}/store/search?q={}&c=apps&hl={}&gl={}",
        config.base_url,
        urlencoding::encode(keyword),
        config.language,
        urlencoding::encode(country)
    )
}

fn detail_url(config: &StoreConfig, package_id: &str, country: &str) -> String {
    format!(
        "{}/store/apps/details?id={}&hl={}&gl={}",
        config.base_url,
        urlencoding::encode(package_id),
        config.language,
        urlencoding::encode(country)
    )
}

#[async_trait]
impl StoreSource for ChromeStoreSource {
    type Session = ChromeSession;

    async fn open_session(&self) -> Result<ChromeSession> {
        let user_agent = pick_user_agent();
        let ua_arg = format!("--user-agent={}", user_agent);
        let lang_arg = format!("--lang={}", self.config.language);

        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--incognito"),
            OsStr::new("--headless=new"),
            OsStr::new(&ua_arg),
            OsStr::new(&lang_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless: false, // new headless mode comes from args
            window_size: Some((1920, 1080)),
            args,
            ..Default::default()
        })
        .context("failed to launch Chrome")?;

        let tab = browser.new_tab().context("failed to open a browser tab")?;
        info!(user_agent, "browser session opened");

        Ok(ChromeSession {
            _browser: browser,
            tab,
            config: self.config.clone(),
        })
    }

    async fn suggestion_text(&self, query: &str) -> Result<String> {
        let url = self.suggest_url(query);
        debug!(url = %url, "fetching suggestions");
        let resp = self
            .client
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

/// One browser, one tab, used for every request of a single analysis.
pub struct ChromeSession {
    // Held so the Chrome process lives exactly as long as the session.
    _browser: Browser,
    tab: Arc<Tab>,
    config: StoreConfig,
}

impl ChromeSession {
    async fn load(&self, url: &str) -> Result<String> {
        debug!(url, "navigating");
        self.tab
            .navigate_to(url)
            .with_context(|| format!("navigation to {url} failed"))?;

        match self
            .tab
            .wait_for_element_with_custom_timeout("body", self.config.navigation_timeout)
        {
            Ok(_) => debug!("page body loaded"),
            Err(e) => warn!(error = %e, "body wait timed out, extracting anyway"),
        }
        sleep(HYDRATION_WAIT).await;

        let html = self.tab.get_content().context("could not read page content")?;
        let final_url = self.tab.get_url();
        if is_blocked_page(&final_url, &html) {
            bail!("store served a challenge page at {final_url}");
        }
        debug!(bytes = html.len(), "page content captured");
        Ok(html)
    }

    fn installs_hint(&self) -> Option<String> {
        match self.tab.evaluate(INSTALLS_HINT_SCRIPT, false) {
            Ok(remote) => remote
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .filter(|s| !s.trim().is_empty()),
            Err(e) => {
                debug!(error = %e, "installs hint script failed");
                None
            }
        }
    }
}

#[async_trait]
impl StoreSession for ChromeSession {
    async fn search_page(&mut self, keyword: &str, country: &str) -> Result<String> {
        let url = search_url(&self.config, keyword, country);
        self.load(&url).await
    }

    async fn detail_page(&mut self, package_id: &str, country: &str) -> Result<DetailPage> {
        let url = detail_url(&self.config, package_id, country);
        let html = self.load(&url).await?;
        let installs_hint = self.installs_hint();
        Ok(DetailPage { html, installs_hint })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ChromeStoreSource {
        ChromeStoreSource::new(StoreConfig::default()).unwrap()
    }

    #[test]
    fn urls_are_encoded_and_localized() {
        let s = source();
        assert_eq!(
            s.search_url("photo editor", "de"),
            "https://play.google.com/store/search?q=photo%20editor&c=apps&hl=en&gl=de"
        );
        assert_eq!(
            s.detail_url("com.example.app", "us"),
            "https://play.google.com/store/apps/details?id=com.example.app&hl=en&gl=us"
        );
        assert!(s.suggest_url("to do").ends_with("&hl=en&q=to%20do"));
        assert!(s.search_url("notes", "u&s").ends_with("&gl=u%26s"));
        assert!(s.detail_url("a.b", "u s").ends_with("&gl=u%20s"));
    }

    #[test]
    fn detects_block_pages() {
        assert!(is_blocked_page("https://www.google.com/sorry/index", "<html></html>"));
        assert!(is_blocked_page(
            "https://play.google.com/store/search",
            "<p>Our systems have detected unusual traffic from your network</p>"
        ));
        assert!(!is_blocked_page(
            "https://play.google.com/store/apps/details?id=a.b",
            "<h1><span>Normal app</span></h1>"
        ));
    }
}
