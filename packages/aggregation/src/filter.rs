//! Filter engine: matches postings against user criteria and renders the
//! user-facing summary.
//!
//! `matches` is a conjunction of independent predicates, each vacuously true
//! when its criterion is unset, so an empty filter passes everything.

use crate::types::{Criteria, ExperienceLevel, Posting};

/// Does this posting satisfy the user's criteria?
pub fn matches(posting: &Posting, criteria: &Criteria) -> bool {
    matches_keywords(posting, &criteria.keywords)
        && matches_location(posting, &criteria.locations)
        && matches_salary(posting, criteria.salary_min, criteria.salary_max)
        && matches_experience(posting, criteria.experience)
        && matches_source(posting, &criteria.sources)
}

/// At least one keyword occurs (case-insensitive) in the posting's title,
/// description or company name.
pub fn matches_keywords(posting: &Posting, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {}",
        posting.title, posting.description, posting.company
    )
    .to_lowercase();
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

/// The posting's location matches any acceptable location, by
/// case-insensitive substring in either direction ("Tashkent" accepts
/// "Tashkent, Chilonzor" and vice versa).
pub fn matches_location(posting: &Posting, locations: &[String]) -> bool {
    if locations.is_empty() {
        return true;
    }
    let posting_location = posting.location.to_lowercase();
    locations.iter().any(|wanted| {
        let wanted = wanted.to_lowercase();
        posting_location.contains(&wanted) || wanted.contains(&posting_location)
    })
}

/// The posting's salary range overlaps the wanted range; an unset bound on
/// either side is unbounded.
pub fn matches_salary(posting: &Posting, wanted_min: Option<i64>, wanted_max: Option<i64>) -> bool {
    if wanted_min.is_none() && wanted_max.is_none() {
        return true;
    }
    let below_cap = match (posting.salary_min, wanted_max) {
        (Some(posting_min), Some(cap)) => posting_min <= cap,
        _ => true,
    };
    let above_floor = match (posting.salary_max, wanted_min) {
        (Some(posting_max), Some(floor)) => floor <= posting_max,
        _ => true,
    };
    below_cap && above_floor
}

/// The posting's experience bracket equals the required one. Postings that
/// did not state a bracket are never excluded.
pub fn matches_experience(posting: &Posting, wanted: Option<ExperienceLevel>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => {
            posting.experience == wanted || posting.experience == ExperienceLevel::NotSpecified
        }
    }
}

/// The posting's source tag is in the acceptable set; an empty set accepts
/// any source.
pub fn matches_source(posting: &Posting, sources: &[String]) -> bool {
    sources.is_empty() || sources.iter().any(|s| s == &posting.source)
}

/// Filter a batch, preserving input order (the source's delivery-preference
/// order: first fetched, first considered).
pub fn apply_filters(postings: &[Posting], criteria: &Criteria) -> Vec<Posting> {
    postings
        .iter()
        .filter(|posting| matches(posting, criteria))
        .cloned()
        .collect()
}

/// Render a posting as a Telegram-HTML summary.
///
/// Pure and total over any well-formed posting; user-visible text is
/// HTML-escaped.
pub fn format_message(posting: &Posting) -> String {
    format!(
        "💼 <b>{title}</b>\n🏢 {company}\n📍 {location}\n💰 {salary}\n🔗 {url}",
        title = escape_html(&posting.title),
        company = escape_html(&posting.company),
        location = escape_html(&posting.location),
        salary = format_salary(posting.salary_min, posting.salary_max),
        url = posting.url,
    )
}

/// Render a salary range with localized open-bound suffixes.
fn format_salary(min: Option<i64>, max: Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format!("{} so'm", format_amount(min)),
        (Some(min), Some(max)) => {
            format!("{} - {} so'm", format_amount(min), format_amount(max))
        }
        (Some(min), None) => format!("{} so'm dan", format_amount(min)),
        (None, Some(max)) => format!("{} so'm gacha", format_amount(max)),
        (None, None) => "Ko'rsatilmagan".to_string(),
    }
}

/// Group digits in threes, the way hh renders amounts ("5 000 000").
fn format_amount(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
