//! Canonical posting record produced by vacancy sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Required experience bracket advertised by a posting.
///
/// String forms are stable and used in storage, so the serde names must not
/// change once data exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    NoExperience,
    Between1And3,
    Between3And6,
    MoreThan6,
    NotSpecified,
}

impl ExperienceLevel {
    /// Stable storage form (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::NoExperience => "no_experience",
            ExperienceLevel::Between1And3 => "between_1_and_3",
            ExperienceLevel::Between3And6 => "between_3_and_6",
            ExperienceLevel::MoreThan6 => "more_than_6",
            ExperienceLevel::NotSpecified => "not_specified",
        }
    }

    /// Parse a stored string form. Unknown values map to `None`.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "no_experience" => Some(ExperienceLevel::NoExperience),
            "between_1_and_3" => Some(ExperienceLevel::Between1And3),
            "between_3_and_6" => Some(ExperienceLevel::Between3And6),
            "more_than_6" => Some(ExperienceLevel::MoreThan6),
            "not_specified" => Some(ExperienceLevel::NotSpecified),
            _ => None,
        }
    }
}

impl Default for ExperienceLevel {
    fn default() -> Self {
        ExperienceLevel::NotSpecified
    }
}

/// A single job listing, normalized from whichever source produced it.
///
/// `external_id` is source-qualified (e.g. `hh_uz_12345`) and stable across
/// repeated fetches of the same listing; both the posting store upsert and
/// per-user dedupe key on it. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Source-qualified external identifier, globally unique.
    pub external_id: String,

    pub title: String,

    pub company: String,

    pub location: String,

    /// Lower salary bound; `None` means unspecified on that side.
    pub salary_min: Option<i64>,

    /// Upper salary bound; `None` with `salary_min` set means open-ended.
    pub salary_max: Option<i64>,

    pub experience: ExperienceLevel,

    /// Short free-text description (search-card snippet or full text).
    pub description: String,

    /// Link to the original listing.
    pub url: String,

    /// Source tag (e.g. `hh_uz`, `user_post`).
    pub source: String,

    pub published_at: DateTime<Utc>,
}

impl Posting {
    /// Create a posting with the required identity fields; everything else
    /// defaults to empty/unspecified and can be filled via the builders.
    pub fn new(external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            company: String::new(),
            location: String::new(),
            salary_min: None,
            salary_max: None,
            experience: ExperienceLevel::NotSpecified,
            description: String::new(),
            url: String::new(),
            source: String::new(),
            published_at: Utc::now(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_salary(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.salary_min = min;
        self.salary_max = max;
        self
    }

    pub fn with_experience(mut self, experience: ExperienceLevel) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_level_round_trips_through_storage_form() {
        for level in [
            ExperienceLevel::NoExperience,
            ExperienceLevel::Between1And3,
            ExperienceLevel::Between3And6,
            ExperienceLevel::MoreThan6,
            ExperienceLevel::NotSpecified,
        ] {
            assert_eq!(ExperienceLevel::from_str_opt(level.as_str()), Some(level));
        }
        assert_eq!(ExperienceLevel::from_str_opt("senior"), None);
    }

    #[test]
    fn posting_builder() {
        let posting = Posting::new("hh_uz_123", "Backend Developer")
            .with_company("Acme")
            .with_location("Tashkent")
            .with_salary(Some(3_000_000), None)
            .with_source("hh_uz")
            .with_url("https://hh.uz/vacancy/123");

        assert_eq!(posting.external_id, "hh_uz_123");
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.salary_min, Some(3_000_000));
        assert_eq!(posting.salary_max, None);
        assert_eq!(posting.experience, ExperienceLevel::NotSpecified);
    }
}
