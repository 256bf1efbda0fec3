//! Ephemeral search groups.

use crate::types::criteria::Criteria;

/// Grouping key: sorted keyword tuple plus primary location.
///
/// Users sharing a key share one fetch per cycle. Keys are recomputed every
/// cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Keywords, sorted so that keyword order in the user's filter does not
    /// split otherwise-identical searches into separate groups.
    pub keywords: Vec<String>,

    /// The group's primary location.
    pub location: String,
}

impl GroupKey {
    /// Build the group key for a user's criteria, or `None` when the user
    /// has no keywords and is skipped for this cycle.
    pub fn for_criteria(criteria: &Criteria, fallback_location: &str) -> Option<Self> {
        if !criteria.has_keywords() {
            return None;
        }
        let mut keywords = criteria.keywords.clone();
        keywords.sort();
        Some(Self {
            keywords,
            location: criteria.primary_location(fallback_location).to_string(),
        })
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] @ {}", self.keywords.join(", "), self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_criteria_share_a_key() {
        let a = Criteria::new()
            .with_keywords(["python", "django"])
            .with_locations(["Tashkent"]);
        let b = Criteria::new()
            .with_keywords(["django", "python"])
            .with_locations(["Tashkent", "Samarkand"]);

        assert_eq!(
            GroupKey::for_criteria(&a, "Tashkent"),
            GroupKey::for_criteria(&b, "Tashkent")
        );
    }

    #[test]
    fn differing_keywords_or_location_split_keys() {
        let base = Criteria::new()
            .with_keywords(["python"])
            .with_locations(["Tashkent"]);
        let other_keywords = Criteria::new()
            .with_keywords(["rust"])
            .with_locations(["Tashkent"]);
        let other_location = Criteria::new()
            .with_keywords(["python"])
            .with_locations(["Samarkand"]);

        let key = GroupKey::for_criteria(&base, "Tashkent");
        assert_ne!(key, GroupKey::for_criteria(&other_keywords, "Tashkent"));
        assert_ne!(key, GroupKey::for_criteria(&other_location, "Tashkent"));
    }

    #[test]
    fn no_keywords_means_no_key() {
        let criteria = Criteria::new().with_locations(["Tashkent"]);
        assert_eq!(GroupKey::for_criteria(&criteria, "Tashkent"), None);
    }

    #[test]
    fn empty_locations_use_fallback() {
        let criteria = Criteria::new().with_keywords(["python"]);
        let key = GroupKey::for_criteria(&criteria, "Tashkent").unwrap();
        assert_eq!(key.location, "Tashkent");
    }
}
