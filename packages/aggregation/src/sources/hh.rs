//! hh.uz search-page scraper.
//!
//! Fetches search result pages for an OR-combined keyword query and parses
//! listing cards into canonical postings. The markup has shifted over time,
//! so every lookup carries a fallback selector. Parsing is factored into
//! pure functions testable against HTML fixtures.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};
use crate::sources::parse::{parse_experience, parse_salary};
use crate::traits::VacancySource;
use crate::types::Posting;

const SOURCE_TAG: &str = "hh_uz";
const BASE_URL: &str = "https://hh.uz";

// hh area code for Tashkent.
// TODO: map the other Uzbek regions to their hh area codes; until then every
// search is pinned to Tashkent's area and relies on the location filter.
const AREA_TASHKENT: &str = "2759";

/// Pause between successive page requests of one fetch call, to stay under
/// host-side throttling.
const PAGE_DELAY: Duration = Duration::from_secs(2);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scraper for hh.uz vacancy search pages.
pub struct HhSource {
    client: reqwest::Client,
    base_url: String,
}

impl Default for HhSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HhSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the base URL (local fixture servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch_html(&self, url: &str, query: &[(&str, &str)]) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http(Box::new(e)))
    }

    /// Fetch one posting's full description from its detail page.
    ///
    /// Fail-soft like the search fetch: any error is logged and yields
    /// `None`. Used by callers that want the long text instead of the
    /// search-card snippet.
    pub async fn fetch_detail(&self, url: &str) -> Option<String> {
        match self.fetch_html(url, &[]).await {
            Ok(html) => match parse_detail_page(&html) {
                Ok(description) => description,
                Err(e) => {
                    warn!(url, error = %e, "failed to parse vacancy detail page");
                    None
                }
            },
            Err(e) => {
                warn!(url, error = %e, "failed to fetch vacancy detail page");
                None
            }
        }
    }
}

#[async_trait]
impl VacancySource for HhSource {
    async fn fetch(&self, keywords: &[String], location: &str, page_limit: usize) -> Vec<Posting> {
        let query = keywords.join(" OR ");
        let search_url = format!("{}/search/vacancy", self.base_url);
        let mut postings = Vec::new();

        for page in 0..page_limit {
            if page > 0 {
                tokio::time::sleep(PAGE_DELAY).await;
            }

            let page_param = page.to_string();
            let params = [
                ("text", query.as_str()),
                ("area", AREA_TASHKENT),
                ("page", page_param.as_str()),
            ];

            let html = match self.fetch_html(&search_url, &params).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, query = %query, error = %e, "failed to fetch search page");
                    continue;
                }
            };

            match parse_search_page(&html, &self.base_url, location) {
                Ok(parsed) => {
                    debug!(page, count = parsed.len(), "parsed search page");
                    postings.extend(parsed);
                }
                Err(e) => {
                    warn!(page, error = %e, "failed to parse search page");
                }
            }
        }

        info!(
            query = %query,
            location,
            total = postings.len(),
            "hh.uz fetch complete"
        );
        postings
    }

    fn source_tag(&self) -> &str {
        SOURCE_TAG
    }
}

fn selector(css: &str) -> FetchResult<Selector> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Parse one search results page into postings.
///
/// Cards missing a title link are skipped, not errors; an `Err` here means
/// the page as a whole could not be processed.
fn parse_search_page(
    html: &str,
    base_url: &str,
    fallback_location: &str,
) -> FetchResult<Vec<Posting>> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.vacancy-serp-item")?;
    let card_fallback_sel = selector(r#"div[data-qa="vacancy-serp__vacancy"]"#)?;
    let title_sel = selector(r#"a[data-qa="vacancy-serp__vacancy-title"]"#)?;
    let title_fallback_sel = selector("a.bloko-link")?;
    let company_sel = selector(r#"a[data-qa="vacancy-serp__vacancy-employer"]"#)?;
    let salary_sel = selector(r#"span[data-qa="vacancy-serp__vacancy-compensation"]"#)?;
    let address_sel = selector(r#"div[data-qa="vacancy-serp__vacancy-address"]"#)?;
    let snippet_sel = selector(r#"div[data-qa="vacancy-serp__vacancy_snippet_responsibility"]"#)?;
    let experience_sel = selector(r#"div[data-qa="vacancy-serp__vacancy-work-experience"]"#)?;

    let mut cards: Vec<ElementRef> = document.select(&card_sel).collect();
    if cards.is_empty() {
        cards = document.select(&card_fallback_sel).collect();
    }

    let mut postings = Vec::new();

    for card in cards {
        let title_el = card
            .select(&title_sel)
            .next()
            .or_else(|| card.select(&title_fallback_sel).next());
        let Some(title_el) = title_el else { continue };

        let title = element_text(title_el);
        let Some(href) = title_el.value().attr("href") else {
            continue;
        };
        if title.is_empty() || href.is_empty() {
            continue;
        }

        // External id is the URL segment after /vacancy/, query string dropped.
        let id_part = href.split("/vacancy/").last().unwrap_or(href);
        let id_part = id_part.split('?').next().unwrap_or(id_part);
        if id_part.is_empty() {
            continue;
        }

        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{base_url}{href}")
        };

        let company = card
            .select(&company_sel)
            .next()
            .map(element_text)
            .unwrap_or_else(|| "Noma'lum".to_string());

        let salary_text = card.select(&salary_sel).next().map(element_text).unwrap_or_default();
        let (salary_min, salary_max) = parse_salary(&salary_text);

        let location = card
            .select(&address_sel)
            .next()
            .map(element_text)
            .unwrap_or_else(|| fallback_location.to_string());

        let description = card.select(&snippet_sel).next().map(element_text).unwrap_or_default();

        let experience_text = card
            .select(&experience_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        postings.push(
            Posting::new(format!("hh_uz_{id_part}"), title)
                .with_company(company)
                .with_location(location)
                .with_salary(salary_min, salary_max)
                .with_experience(parse_experience(&experience_text))
                .with_description(description)
                .with_url(url)
                .with_source(SOURCE_TAG),
        );
    }

    Ok(postings)
}

/// Extract the full description block from a vacancy detail page.
fn parse_detail_page(html: &str) -> FetchResult<Option<String>> {
    let document = Html::parse_document(html);
    let description_sel = selector("div.vacancy-description")?;

    Ok(document
        .select(&description_sel)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExperienceLevel;

    const MOCK_SEARCH_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="vacancy-serp-item">
  <a data-qa="vacancy-serp__vacancy-title" href="/vacancy/12345?from=search">Python Developer</a>
  <a data-qa="vacancy-serp__vacancy-employer">Acme LLC</a>
  <span data-qa="vacancy-serp__vacancy-compensation">от 5 000 000 сум</span>
  <div data-qa="vacancy-serp__vacancy-address">Tashkent, Chilonzor</div>
  <div data-qa="vacancy-serp__vacancy_snippet_responsibility">Develop backend services in Python.</div>
  <div data-qa="vacancy-serp__vacancy-work-experience">От 1 года до 3 лет</div>
</div>
<div class="vacancy-serp-item">
  <a data-qa="vacancy-serp__vacancy-title" href="https://hh.uz/vacancy/67890">QA Engineer</a>
</div>
<div class="vacancy-serp-item">
  <span>Card without a title link is skipped</span>
</div>
</body>
</html>"#;

    const MOCK_FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div data-qa="vacancy-serp__vacancy">
  <a class="bloko-link" href="/vacancy/111">Data Analyst</a>
</div>
</body>
</html>"#;

    #[test]
    fn parse_search_page_extracts_cards() {
        let postings = parse_search_page(MOCK_SEARCH_HTML, "https://hh.uz", "Tashkent")
            .expect("should parse");

        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.external_id, "hh_uz_12345");
        assert_eq!(first.title, "Python Developer");
        assert_eq!(first.company, "Acme LLC");
        assert_eq!(first.url, "https://hh.uz/vacancy/12345?from=search");
        assert_eq!(first.salary_min, Some(5_000_000));
        assert_eq!(first.salary_max, None);
        assert_eq!(first.location, "Tashkent, Chilonzor");
        assert_eq!(first.experience, ExperienceLevel::Between1And3);
        assert_eq!(first.source, "hh_uz");
        assert!(first.description.contains("backend services"));
    }

    #[test]
    fn parse_search_page_defaults_missing_fields() {
        let postings = parse_search_page(MOCK_SEARCH_HTML, "https://hh.uz", "Tashkent")
            .expect("should parse");

        let second = &postings[1];
        assert_eq!(second.external_id, "hh_uz_67890");
        assert_eq!(second.company, "Noma'lum");
        assert_eq!(second.location, "Tashkent");
        assert_eq!(second.salary_min, None);
        assert_eq!(second.experience, ExperienceLevel::NotSpecified);
        // Absolute detail links are kept as-is.
        assert_eq!(second.url, "https://hh.uz/vacancy/67890");
    }

    #[test]
    fn parse_search_page_uses_fallback_selectors() {
        let postings = parse_search_page(MOCK_FALLBACK_HTML, "https://hh.uz", "Tashkent")
            .expect("should parse");

        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].external_id, "hh_uz_111");
        assert_eq!(postings[0].title, "Data Analyst");
        assert_eq!(postings[0].url, "https://hh.uz/vacancy/111");
    }

    #[test]
    fn parse_empty_page_yields_nothing() {
        let postings =
            parse_search_page("<html><body></body></html>", "https://hh.uz", "Tashkent")
                .expect("should parse");
        assert!(postings.is_empty());
    }

    #[test]
    fn parse_detail_page_extracts_description() {
        let html = r#"<html><body>
            <div class="vacancy-description">Full description text.</div>
        </body></html>"#;
        let description = parse_detail_page(html).expect("should parse");
        assert_eq!(description.as_deref(), Some("Full description text."));

        let missing = parse_detail_page("<html><body></body></html>").expect("should parse");
        assert_eq!(missing, None);
    }

    #[test]
    fn source_tag_is_stable() {
        assert_eq!(HhSource::new().source_tag(), "hh_uz");
    }
}
