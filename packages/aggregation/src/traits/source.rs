//! Vacancy source contract for pluggable scrapers.
//!
//! Each external source (hh.uz search pages, channel feeds, manual posting
//! imports) implements `VacancySource`, so new sources can be added without
//! touching the scheduler. The scheduler only cares about the capability
//! `{keywords, location} -> postings`.

use async_trait::async_trait;

use crate::types::Posting;

/// A source of candidate postings.
///
/// `fetch` fails soft: network errors, timeouts and unparseable pages are
/// logged inside the implementation and produce partial (possibly empty)
/// results, never an error. Persistence is the caller's responsibility.
#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Fetch up to `page_limit` result pages for an OR-combined keyword
    /// search at the given location, normalized into canonical postings.
    async fn fetch(&self, keywords: &[String], location: &str, page_limit: usize) -> Vec<Posting>;

    /// Stable source tag stamped onto produced postings (e.g. `hh_uz`).
    fn source_tag(&self) -> &str;
}
