//! The seam between the extraction pipeline and whatever actually talks to the store.
//!
//! [`crate::crawler::ChromeStoreSource`] drives a real browser; tests plug in
//! in-memory fixtures.

use async_trait::async_trait;

use crate::detail::DetailPage;

/// Something that can open store sessions and answer suggestion queries.
#[async_trait]
pub trait StoreSource: Send + Sync {
    type Session: StoreSession;

    /// Acquire whatever the session needs (a browser, a connection).
    ///
    /// Resources are released when the returned session is dropped.
    async fn open_session(&self) -> anyhow::Result<Self::Session>;

    /// Raw body of the autocomplete endpoint for `query`.
    async fn suggestion_text(&self, query: &str) -> anyhow::Result<String>;
}

/// One analysis run's view of the store. Requests are issued one at a time.
#[async_trait]
pub trait StoreSession: Send {
    /// Markup of the search-results page for `keyword` in `country`.
    async fn search_page(&mut self, keyword: &str, country: &str) -> anyhow::Result<String>;

    /// Rendered detail page for one package.
    async fn detail_page(&mut self, package_id: &str, country: &str) -> anyhow::Result<DetailPage>;
}
