//! Per-user search filter criteria.

use serde::{Deserialize, Serialize};

use crate::types::posting::ExperienceLevel;

/// A user's saved search filter.
///
/// Owned by the settings layer; the pipeline only reads it. Every field is
/// optional in the sense that an empty/unset field never excludes a posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Keywords matched case-insensitively as substrings of the posting text.
    pub keywords: Vec<String>,

    /// Acceptable locations, ordered; the first entry is the primary
    /// location used for grouping.
    pub locations: Vec<String>,

    pub salary_min: Option<i64>,

    pub salary_max: Option<i64>,

    /// Required experience bracket. Postings with an unspecified bracket are
    /// never excluded by this.
    pub experience: Option<ExperienceLevel>,

    /// Acceptable source tags; empty means any source.
    pub sources: Vec<String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_salary(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.salary_min = min;
        self.salary_max = max;
        self
    }

    pub fn with_experience(mut self, experience: ExperienceLevel) -> Self {
        self.experience = Some(experience);
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Primary location used for grouping, falling back when the user has
    /// not picked any location.
    pub fn primary_location<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.locations.first().map(String::as_str).unwrap_or(fallback)
    }

    /// Users without keywords receive nothing and are skipped by grouping.
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_location_falls_back_when_empty() {
        let criteria = Criteria::new().with_keywords(["python"]);
        assert_eq!(criteria.primary_location("Tashkent"), "Tashkent");

        let criteria = criteria.with_locations(["Samarkand", "Tashkent"]);
        assert_eq!(criteria.primary_location("Tashkent"), "Samarkand");
    }

    #[test]
    fn has_keywords() {
        assert!(!Criteria::new().has_keywords());
        assert!(Criteria::new().with_keywords(["rust"]).has_keywords());
    }
}
