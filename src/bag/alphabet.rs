use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Languages with a known tile distribution
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    #[strum(serialize = "en")]
    English,
    #[serde(rename = "fr")]
    #[strum(serialize = "fr")]
    French,
}

impl Language {
    /// (letter, count, value) for every tile kind in a fresh bag
    pub fn distribution(&self) -> &'static [(char, u32, u32)] {
        match self {
            Language::English => ENGLISH,
            Language::French => FRENCH,
        }
    }

    pub fn is_vowel(&self, letter: char) -> bool {
        match self {
            Language::English => matches!(letter, 'A' | 'E' | 'I' | 'O' | 'U'),
            Language::French => matches!(letter, 'A' | 'E' | 'I' | 'O' | 'U' | 'Y'),
        }
    }
}

const ENGLISH: &[(char, u32, u32)] = &[
    ('A', 9, 1),
    ('B', 2, 3),
    ('C', 2, 3),
    ('D', 4, 2),
    ('E', 12, 1),
    ('F', 2, 4),
    ('G', 3, 2),
    ('H', 2, 4),
    ('I', 9, 1),
    ('J', 1, 8),
    ('K', 1, 5),
    ('L', 4, 1),
    ('M', 2, 3),
    ('N', 6, 1),
    ('O', 8, 1),
    ('P', 2, 3),
    ('Q', 1, 10),
    ('R', 6, 1),
    ('S', 4, 1),
    ('T', 6, 1),
    ('U', 4, 1),
    ('V', 2, 4),
    ('W', 2, 4),
    ('X', 1, 8),
    ('Y', 2, 4),
    ('Z', 1, 10),
];

const FRENCH: &[(char, u32, u32)] = &[
    ('A', 9, 1),
    ('B', 2, 3),
    ('C', 2, 3),
    ('D', 3, 2),
    ('E', 15, 1),
    ('F', 2, 4),
    ('G', 2, 2),
    ('H', 2, 4),
    ('I', 8, 1),
    ('J', 1, 8),
    ('K', 1, 10),
    ('L', 5, 1),
    ('M', 3, 2),
    ('N', 6, 1),
    ('O', 6, 1),
    ('P', 2, 3),
    ('Q', 1, 8),
    ('R', 6, 1),
    ('S', 6, 1),
    ('T', 6, 1),
    ('U', 6, 1),
    ('V', 2, 4),
    ('W', 1, 10),
    ('X', 1, 10),
    ('Y', 1, 10),
    ('Z', 1, 10),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn english_bag_has_ninety_eight_letters() {
        let total: u32 = Language::English.distribution().iter().map(|(_, c, _)| c).sum();
        assert_eq!(total, 98);
    }

    #[test]
    fn language_round_trips_through_short_code() {
        assert_eq!(Language::English.to_string(), "en");
        assert_eq!(Language::from_str("fr").unwrap(), Language::French);
        assert!(Language::from_str("xx").is_err());
    }

    #[test]
    fn vowels_depend_on_language() {
        assert!(Language::English.is_vowel('E'));
        assert!(!Language::English.is_vowel('Y'));
        assert!(Language::French.is_vowel('Y'));
    }
}
