//! Locale-aware decoding of scraped salary and experience text.
//!
//! Both decoders are explicit ordered rule lists evaluated first-match-wins,
//! so the tie-break order is auditable and testable on its own.

use regex::Regex;

use crate::types::ExperienceLevel;

/// Tokens marking an open-ended lower bound ("from N and up").
const FROM_TOKENS: [&str; 2] = ["от", "dan"];

/// Tokens marking an open-ended upper bound ("up to N").
const UNTIL_TOKENS: [&str; 2] = ["до", "gacha"];

/// Experience markers in tie-break order. An ambiguous text such as
/// "без опыта (1-3)" resolves to the earliest matching rule.
const EXPERIENCE_RULES: &[(&[&str], ExperienceLevel)] = &[
    (&["без опыта", "no experience"], ExperienceLevel::NoExperience),
    (&["1", "один"], ExperienceLevel::Between1And3),
    (&["3", "три"], ExperienceLevel::Between3And6),
    (&["6", "шесть"], ExperienceLevel::MoreThan6),
];

/// Decode a raw salary string into `(min, max)` bounds.
///
/// Rules, first match wins:
/// 1. no digits → `(None, None)`
/// 2. a "from" token → `(first number, None)`
/// 3. an "until" token → `(None, first number)`
/// 4. two or more numbers → `(first, second)`
/// 5. one number → `(n, n)`
pub fn parse_salary(text: &str) -> (Option<i64>, Option<i64>) {
    // Digit groups are space-separated on hh ("5 000 000"), including
    // non-breaking spaces, so strip all whitespace before extraction.
    let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let number_re = Regex::new(r"\d+").expect("static regex");
    let numbers: Vec<i64> = number_re
        .find_iter(&stripped)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let Some(&first) = numbers.first() else {
        return (None, None);
    };

    if FROM_TOKENS.iter().any(|t| text.contains(t)) {
        (Some(first), None)
    } else if UNTIL_TOKENS.iter().any(|t| text.contains(t)) {
        (None, Some(first))
    } else if numbers.len() >= 2 {
        (Some(first), Some(numbers[1]))
    } else {
        (Some(first), Some(first))
    }
}

/// Decode a raw experience string into the five-way bracket.
///
/// Substring match over the lowercased text, first rule wins; no marker
/// means `NotSpecified`.
pub fn parse_experience(text: &str) -> ExperienceLevel {
    let text = text.to_lowercase();
    for (markers, level) in EXPERIENCE_RULES {
        if markers.iter().any(|m| text.contains(m)) {
            return *level;
        }
    }
    ExperienceLevel::NotSpecified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_from_token_gives_open_upper_bound() {
        assert_eq!(parse_salary("от 5 000 000 сум"), (Some(5_000_000), None));
        assert_eq!(parse_salary("4 000 000 dan"), (Some(4_000_000), None));
    }

    #[test]
    fn salary_until_token_gives_open_lower_bound() {
        assert_eq!(parse_salary("до 7 000 000 сум"), (None, Some(7_000_000)));
        assert_eq!(parse_salary("3 000 000 gacha"), (None, Some(3_000_000)));
    }

    #[test]
    fn salary_two_numbers_form_a_range() {
        assert_eq!(
            parse_salary("3 000 000 - 5 000 000 сум"),
            (Some(3_000_000), Some(5_000_000))
        );
    }

    #[test]
    fn salary_single_number_is_a_point_range() {
        assert_eq!(parse_salary("6 500 000"), (Some(6_500_000), Some(6_500_000)));
    }

    #[test]
    fn salary_without_digits_is_unspecified() {
        assert_eq!(parse_salary(""), (None, None));
        assert_eq!(parse_salary("Kelishilgan holda"), (None, None));
    }

    #[test]
    fn experience_markers_map_to_brackets() {
        assert_eq!(parse_experience("Без опыта"), ExperienceLevel::NoExperience);
        assert_eq!(parse_experience("No experience"), ExperienceLevel::NoExperience);
        assert_eq!(
            parse_experience("От 1 года до 3 лет"),
            ExperienceLevel::Between1And3
        );
        assert_eq!(
            parse_experience("От 3 до 6 лет"),
            ExperienceLevel::Between3And6
        );
        assert_eq!(parse_experience("Более 6 лет"), ExperienceLevel::MoreThan6);
    }

    #[test]
    fn experience_unknown_text_is_not_specified() {
        assert_eq!(parse_experience(""), ExperienceLevel::NotSpecified);
        assert_eq!(parse_experience("katta tajriba"), ExperienceLevel::NotSpecified);
    }

    #[test]
    fn experience_first_match_wins_on_ambiguous_text() {
        // Contains both the no-experience marker and digits from later rules.
        assert_eq!(
            parse_experience("Без опыта (подойдет 1-3)"),
            ExperienceLevel::NoExperience
        );
    }
}
