//! User input normalization.

use std::ops::RangeInclusive;

/// Trim, lower-case and collapse internal whitespace runs to one space.
#[must_use]
pub fn clean(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Menu choice in `bounds`, or `None` for anything that is not an integer
/// inside them. A leading `+` and leading zeros are accepted.
#[must_use]
pub fn parse_choice(text: &str, bounds: RangeInclusive<u32>) -> Option<u32> {
    let value: i64 = clean(text).parse().ok()?;
    let value = u32::try_from(value).ok()?;
    bounds.contains(&value).then_some(value)
}

/// Whether the first word of `text` equals any of `keywords`, both sides
/// cleaned.
#[must_use]
pub fn matches_keyword(text: &str, keywords: &[&str]) -> bool {
    let cleaned = clean(text);
    let first = cleaned.split(' ').next().unwrap_or_default();
    keywords.iter().any(|k| clean(k) == first)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("  Hello   World ", "hello world")]
    #[case("\t:MENU\n", ":menu")]
    #[case("", "")]
    #[case("   ", "")]
    fn cleans(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[rstest]
    #[case("1", Some(1))]
    #[case(" 2 ", Some(2))]
    #[case("+2", Some(2))]
    #[case("02", Some(2))]
    #[case("0", None)]
    #[case("3", None)]
    #[case("-1", None)]
    #[case("two", None)]
    #[case("1 2", None)]
    #[case("", None)]
    #[case("99999999999999999999", None)]
    fn parses_choice_within_bounds(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_choice(input, 1..=2), expected);
    }

    #[test]
    fn empty_menu_accepts_nothing() {
        #[allow(clippy::reversed_empty_ranges)]
        let bounds = 1..=0;
        assert_eq!(parse_choice("1", bounds), None);
    }

    #[rstest]
    #[case(":menu", true)]
    #[case("  :MENU  please", true)]
    #[case("menu", false)]
    #[case("hello :menu", false)]
    #[case("", false)]
    fn detects_keyword(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(matches_keyword(input, &[":menu"]), expected);
    }

    #[test]
    fn keywords_are_cleaned_too() {
        assert!(matches_keyword("back", &["  BACK "]));
        assert!(!matches_keyword("back", &[]));
    }
}
